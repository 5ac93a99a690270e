use crate::auth;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{current_session, required_str};
use crate::ipc::types::{AppState, Request, Session};
use serde_json::json;

fn handle_session_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let token = uuid::Uuid::new_v4().to_string();
    state.sessions.insert(token.clone(), Session::default());
    tracing::debug!(session = %token, "session opened");
    ok(&req.id, json!({ "sessionId": token }))
}

fn handle_session_info(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, session) = match current_session(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ok(
        &req.id,
        json!({
            "authenticated": session.authenticated,
            "role": session.role,
            "email": session.email,
            "displayName": session.display_name,
            "loggedInAt": session.logged_in_at,
        }),
    )
}

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (token, _) = match current_session(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let email = match required_str(req, "email") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let password = match required_str(req, "password") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if email.trim().is_empty() || password.trim().is_empty() {
        return err(
            &req.id,
            "bad_params",
            "both email and password are required",
            None,
        );
    }

    let Some(outcome) = auth::authenticate(&email, &password, state.dataset.as_ref()) else {
        // Generic on purpose: never distinguishes unknown email from wrong
        // password. The student hint is shown only once a dataset exists.
        let details = state.dataset.as_ref().map(|_| {
            json!({ "hint": "for students, the password is the email prefix (before @)" })
        });
        return err(&req.id, "invalid_credentials", "invalid credentials", details);
    };

    if let Some(session) = state.sessions.get_mut(&token) {
        session.authenticated = true;
        session.email = Some(outcome.email.clone());
        session.role = Some(outcome.role);
        session.display_name = Some(outcome.display_name.clone());
        session.logged_in_at = Some(chrono::Utc::now().to_rfc3339());
    }

    tracing::info!(role = outcome.role.as_str(), "login");
    ok(
        &req.id,
        json!({
            "role": outcome.role,
            "email": outcome.email,
            "displayName": outcome.display_name,
        }),
    )
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (token, _) = match current_session(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    // Clears every session field; the dataset is process-wide and outlives
    // any session.
    state.sessions.insert(token, Session::default());
    tracing::info!("logout");
    ok(&req.id, json!({ "loggedOut": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.open" => Some(handle_session_open(state, req)),
        "session.info" => Some(handle_session_info(state, req)),
        "auth.login" => Some(handle_login(state, req)),
        "auth.logout" => Some(handle_logout(state, req)),
        _ => None,
    }
}
