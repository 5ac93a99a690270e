use crate::auth::Role;
use crate::calc;
use crate::columns::{self, ColumnRole};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{dataset, require_role};
use crate::ipc::types::{AppState, Request};
use crate::table::{Cell, Dataset};
use serde_json::json;

struct ScoreColumns {
    pre: String,
    post: String,
    pre_values: Vec<Option<f64>>,
    post_values: Vec<Option<f64>>,
}

/// First pre/post score columns plus their coerced numeric views. None when
/// either role is unresolved; callers degrade that section of the view.
fn score_columns(ds: &Dataset) -> Option<ScoreColumns> {
    let pre = columns::detect_role(ds, ColumnRole::PreScore)?.to_string();
    let post = columns::detect_role(ds, ColumnRole::PostScore)?.to_string();
    let pre_values = ds.numeric_values(&pre)?;
    let post_values = ds.numeric_values(&post)?;
    Some(ScoreColumns {
        pre,
        post,
        pre_values,
        post_values,
    })
}

fn student_series(ds: &Dataset, scores: &ScoreColumns) -> Vec<serde_json::Value> {
    let name_idx = columns::detect_role(ds, ColumnRole::Name).and_then(|c| ds.column_index(c));
    ds.rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let name = name_idx.map(|idx| &row[idx]).and_then(|cell| match cell {
                Cell::Missing => None,
                other => Some(other.display()),
            });
            let pre = scores.pre_values[i];
            let post = scores.post_values[i];
            let improvement = match (pre, post) {
                (Some(p), Some(q)) => Some(q - p),
                _ => None,
            };
            json!({
                "index": i,
                "name": name,
                "pre": pre,
                "post": post,
                "improvement": improvement,
            })
        })
        .collect()
}

fn handle_overview(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_role(state, req, Role::Teacher) {
        return resp;
    }
    let ds = match dataset(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    // Sections degrade independently: unresolved score roles null out the
    // score analysis without taking the rest of the view down.
    let scores = score_columns(ds);
    let (score_analysis, mean_improvement, counts, buckets, students) = match &scores {
        Some(sc) => {
            let analysis = calc::score_analysis(&sc.pre_values, &sc.post_values);
            let improvements = calc::improvements(&sc.pre_values, &sc.post_values);
            (
                json!({
                    "preColumn": sc.pre,
                    "postColumn": sc.post,
                    "avgPre": analysis.avg_pre.map(calc::round1),
                    "avgPost": analysis.avg_post.map(calc::round1),
                    "difference": analysis.difference.map(calc::round1),
                    "relativeGain": analysis.relative_gain.map(calc::round1),
                }),
                json!(calc::mean_improvement(&improvements).map(calc::round1)),
                json!(calc::improvement_counts(&improvements)),
                json!(calc::cohort_buckets(&improvements)),
                json!(student_series(ds, sc)),
            )
        }
        None => (
            serde_json::Value::Null,
            serde_json::Value::Null,
            serde_json::Value::Null,
            serde_json::Value::Null,
            serde_json::Value::Null,
        ),
    };

    ok(
        &req.id,
        json!({
            "totalStudents": ds.row_count(),
            "scoreAnalysis": score_analysis,
            "meanImprovement": mean_improvement,
            "counts": counts,
            "buckets": buckets,
            "students": students,
            "correlation": calc::correlation_matrix(ds),
        }),
    )
}

fn handle_export_full(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_role(state, req, Role::Teacher) {
        return resp;
    }
    let ds = match dataset(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    // The teacher-side export carries the derived Improvement column when
    // the score roles resolve; the stored dataset never does.
    let csv = match score_columns(ds) {
        Some(sc) => {
            let improvements = calc::improvements(&sc.pre_values, &sc.post_values);
            ds.with_improvement_column(&improvements).to_csv()
        }
        None => ds.to_csv(),
    };
    ok(
        &req.id,
        json!({
            "filename": "complete_analysis.csv",
            "csv": csv,
        }),
    )
}

fn handle_export_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_role(state, req, Role::Teacher) {
        return resp;
    }
    let ds = match dataset(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let name_col = columns::detect_role(ds, ColumnRole::Name);
    let email_col = columns::detect_role(ds, ColumnRole::Email);
    let scores = score_columns(ds);
    let (Some(name_col), Some(email_col), Some(sc)) = (name_col, email_col, &scores) else {
        let mut missing = Vec::new();
        if name_col.is_none() {
            missing.push("name");
        }
        if email_col.is_none() {
            missing.push("email");
        }
        if scores.is_none() {
            missing.push("preScore/postScore");
        }
        return err(
            &req.id,
            "missing_column_role",
            "summary export unavailable",
            Some(json!({ "unresolved": missing })),
        );
    };

    let improvements = calc::improvements(&sc.pre_values, &sc.post_values);
    let full = ds.with_improvement_column(&improvements);
    let summary = full.select_columns(&[
        name_col,
        email_col,
        sc.pre.as_str(),
        sc.post.as_str(),
        "Improvement",
    ]);
    match summary {
        Some(summary) => ok(
            &req.id,
            json!({
                "filename": "improvement_summary.csv",
                "csv": summary.to_csv(),
            }),
        ),
        None => err(&req.id, "missing_column_role", "summary export unavailable", None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.overview" => Some(handle_overview(state, req)),
        "analytics.exportFull" => Some(handle_export_full(state, req)),
        "analytics.exportSummary" => Some(handle_export_summary(state, req)),
        _ => None,
    }
}
