use anyhow::Context;

use crate::auth::Role;
use crate::calc;
use crate::columns::{self, ColumnRole};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{dataset, optional_str, require_role};
use crate::ipc::types::{AppState, Request};
use crate::table::Dataset;
use serde_json::json;

fn read_upload(req: &Request) -> Result<String, serde_json::Value> {
    if let Some(content) = optional_str(req, "content") {
        return Ok(content);
    }
    let Some(path) = optional_str(req, "path") else {
        return Err(err(
            &req.id,
            "bad_params",
            "provide params.content or params.path",
            None,
        ));
    };
    std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path))
        .map_err(|e| err(&req.id, "io_error", format!("{e:#}"), None))
}

fn handle_upload(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_role(state, req, Role::Admin) {
        return resp;
    }
    let text = match read_upload(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    // A parse failure aborts the upload and leaves the prior dataset
    // untouched.
    let parsed = match Dataset::from_csv(&text) {
        Ok(v) => v,
        Err(e) => return err(&req.id, &e.code, e.message, None),
    };

    let records = parsed.row_count();
    let column_count = parsed.column_count();
    let uploaded_at = chrono::Utc::now().to_rfc3339();
    state.dataset = Some(parsed);
    state.dataset_uploaded_at = Some(uploaded_at.clone());

    tracing::info!(records, columns = column_count, "dataset replaced");
    ok(
        &req.id,
        json!({
            "records": records,
            "columns": column_count,
            "uploadedAt": uploaded_at,
        }),
    )
}

fn handle_preview(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_role(state, req, Role::Admin) {
        return resp;
    }
    let ds = match dataset(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let limit = req
        .params
        .get("limit")
        .and_then(|v| v.as_u64())
        .unwrap_or(10) as usize;
    let rows: Vec<serde_json::Value> = ds
        .rows()
        .iter()
        .take(limit)
        .map(|r| json!(r))
        .collect();
    ok(
        &req.id,
        json!({
            "columns": ds.columns(),
            "rows": rows,
            "totalRecords": ds.row_count(),
        }),
    )
}

fn handle_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_role(state, req, Role::Admin) {
        return resp;
    }
    let ds = match dataset(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let unique_students = columns::detect_role(ds, ColumnRole::Email)
        .and_then(|email_col| ds.unique_count(email_col));
    let total_cells = ds.row_count() * ds.column_count();
    let missing_pct = if total_cells > 0 {
        calc::round1(ds.missing_cell_count() as f64 / total_cells as f64 * 100.0)
    } else {
        0.0
    };

    ok(
        &req.id,
        json!({
            "totalRecords": ds.row_count(),
            "totalColumns": ds.column_count(),
            "uniqueStudents": unique_students,
            "missingPct": missing_pct,
        }),
    )
}

fn handle_columns(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_role(state, req, Role::Admin) {
        return resp;
    }
    let ds = match dataset(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let numeric = ds.numeric_columns();
    let inventory: Vec<serde_json::Value> = ds
        .columns()
        .iter()
        .map(|name| {
            let missing = ds
                .column_values(name)
                .map(|cells| cells.iter().filter(|c| c.is_missing()).count())
                .unwrap_or(0);
            json!({
                "name": name,
                "kind": if numeric.contains(name) { "number" } else { "text" },
                "missing": missing,
                "unique": ds.unique_count(name),
            })
        })
        .collect();

    ok(&req.id, json!({ "columns": inventory }))
}

fn handle_export_full(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_role(state, req, Role::Admin) {
        return resp;
    }
    let ds = match dataset(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    // Raw upload as stored: derived columns never appear here.
    ok(
        &req.id,
        json!({
            "filename": "processed_data.csv",
            "csv": ds.to_csv(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dataset.upload" => Some(handle_upload(state, req)),
        "dataset.preview" => Some(handle_preview(state, req)),
        "dataset.stats" => Some(handle_stats(state, req)),
        "dataset.columns" => Some(handle_columns(state, req)),
        "dataset.exportFull" => Some(handle_export_full(state, req)),
        _ => None,
    }
}
