use crate::auth::Role;
use crate::calc;
use crate::columns::{self, ColumnRole};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{dataset, require_role};
use crate::ipc::types::{AppState, Request};
use crate::table::{Cell, Dataset};
use serde_json::json;

fn find_row<'a>(ds: &'a Dataset, email: &str) -> Option<&'a Vec<Cell>> {
    let email_col = columns::detect_role(ds, ColumnRole::Email)?;
    let idx = ds.column_index(email_col)?;
    ds.rows().iter().find(|row| match &row[idx] {
        Cell::Text(raw) => raw.trim().to_lowercase() == email,
        _ => false,
    })
}

fn role_cell<'a>(ds: &Dataset, row: &'a [Cell], role: ColumnRole) -> Option<&'a Cell> {
    let col = columns::detect_role(ds, role)?;
    let idx = ds.column_index(col)?;
    Some(&row[idx])
}

fn cell_json(cell: Option<&Cell>) -> serde_json::Value {
    match cell {
        Some(c) => json!(c),
        None => serde_json::Value::Null,
    }
}

fn handle_report(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_role(state, req, Role::Student) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let ds = match dataset(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let email = session.email.unwrap_or_default();

    // The dataset may have been replaced since login; only this student's
    // view aborts when their row is gone.
    let Some(row) = find_row(ds, &email) else {
        return err(&req.id, "not_found", "your data was not found", None);
    };

    let profile = json!({
        "email": cell_json(role_cell(ds, row, ColumnRole::Email)),
        "name": cell_json(role_cell(ds, row, ColumnRole::Name)),
        "course": cell_json(role_cell(ds, row, ColumnRole::Course)),
    });

    let pre_col = columns::detect_role(ds, ColumnRole::PreScore);
    let post_col = columns::detect_role(ds, ColumnRole::PostScore);
    let (performance, standing, class_averages) = match (pre_col, post_col) {
        (Some(pre_col), Some(post_col)) => {
            let pre = role_cell(ds, row, ColumnRole::PreScore).and_then(Cell::as_number);
            let post = role_cell(ds, row, ColumnRole::PostScore).and_then(Cell::as_number);
            let improvement = match (pre, post) {
                (Some(p), Some(q)) => Some(q - p),
                _ => None,
            };
            let category = calc::categorize_improvement(pre, post);

            let pre_values = ds.numeric_values(pre_col).unwrap_or_default();
            let post_values = ds.numeric_values(post_col).unwrap_or_default();
            let improvements = calc::improvements(&pre_values, &post_values);
            let analysis = calc::score_analysis(&pre_values, &post_values);

            // Standing is only defined once this row has an improvement;
            // percentile and rank keep the full row count as denominator.
            let standing = match improvement {
                Some(value) => {
                    let s = calc::standing(&improvements, value);
                    json!({
                        "percentile": s.percentile,
                        "rank": s.rank,
                        "total": s.total,
                        "classAvgImprovement":
                            calc::mean_improvement(&improvements).map(calc::round1),
                    })
                }
                None => serde_json::Value::Null,
            };

            (
                json!({
                    "preScore": pre,
                    "postScore": post,
                    "improvement": improvement,
                    "category": category,
                    "tone": calc::insight_tone(category),
                }),
                standing,
                json!({
                    "avgPre": analysis.avg_pre.map(calc::round1),
                    "avgPost": analysis.avg_post.map(calc::round1),
                }),
            )
        }
        _ => (
            serde_json::Value::Null,
            serde_json::Value::Null,
            serde_json::Value::Null,
        ),
    };

    // Full row dump, in column order.
    let row_dump: Vec<serde_json::Value> = ds
        .columns()
        .iter()
        .zip(row.iter())
        .map(|(name, cell)| json!({ "column": name, "value": cell }))
        .collect();

    ok(
        &req.id,
        json!({
            "profile": profile,
            "performance": performance,
            "standing": standing,
            "classAverages": class_averages,
            "row": row_dump,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "student.report" => Some(handle_report(state, req)),
        _ => None,
    }
}
