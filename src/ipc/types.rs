use std::collections::HashMap;

use serde::Deserialize;

use crate::auth::Role;
use crate::table::Dataset;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// One client's interactive session. Created with every field unset,
/// mutated on login/logout, never expired. Points at the process-wide
/// dataset by living next to it; it never holds a copy.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub authenticated: bool,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub display_name: Option<String>,
    pub logged_in_at: Option<String>,
}

/// Process-wide state: the single in-memory dataset plus per-client
/// sessions keyed by token. An admin upload replaces the dataset wholesale;
/// sessions survive it (a student whose row disappears gets not_found at
/// view time).
#[derive(Default)]
pub struct AppState {
    pub dataset: Option<Dataset>,
    pub dataset_uploaded_at: Option<String>,
    pub sessions: HashMap<String, Session>,
}
