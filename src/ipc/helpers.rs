use crate::auth::Role;
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request, Session};
use crate::table::Dataset;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn optional_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
}

/// Look up the caller's session by token. Unknown tokens are reported as
/// such: the session map only grows through session.open.
pub fn current_session(
    state: &AppState,
    req: &Request,
) -> Result<(String, Session), serde_json::Value> {
    let token = required_str(req, "sessionId")?;
    match state.sessions.get(&token) {
        Some(session) => Ok((token, session.clone())),
        None => Err(err(&req.id, "unknown_session", "unknown session token", None)),
    }
}

/// Role gate for view methods. Anything short of an authenticated session
/// with the required role is forbidden; the error never reveals more.
pub fn require_role(
    state: &AppState,
    req: &Request,
    role: Role,
) -> Result<Session, serde_json::Value> {
    let (_, session) = current_session(state, req)?;
    if !session.authenticated || session.role != Some(role) {
        return Err(err(
            &req.id,
            "forbidden",
            format!("requires the {} role", role.as_str()),
            None,
        ));
    }
    Ok(session)
}

pub fn dataset<'a>(state: &'a AppState, req: &Request) -> Result<&'a Dataset, serde_json::Value> {
    state
        .dataset
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_dataset", "no dataset has been uploaded", None))
}
