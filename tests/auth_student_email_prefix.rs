
use serde_json::json;
use test_support::{
    error_code, login_ok, open_session, request_err, spawn_sidecar, upload_as_admin, SAMPLE_CSV,
};

#[test]
fn student_logs_in_with_email_prefix() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    upload_as_admin(&mut stdin, &mut reader, SAMPLE_CSV);

    let session = open_session(&mut stdin, &mut reader, "1");
    let result = login_ok(
        &mut stdin,
        &mut reader,
        "2",
        &session,
        "alice@x.com",
        "alice",
    );
    assert_eq!(result.get("role").and_then(|v| v.as_str()), Some("Student"));
    assert_eq!(
        result.get("displayName").and_then(|v| v.as_str()),
        Some("Alice")
    );
}

#[test]
fn student_match_is_case_insensitive_both_ways() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    upload_as_admin(&mut stdin, &mut reader, SAMPLE_CSV);

    let session = open_session(&mut stdin, &mut reader, "1");
    let result = login_ok(
        &mut stdin,
        &mut reader,
        "2",
        &session,
        " ALICE@X.COM ",
        "ALICE",
    );
    assert_eq!(result.get("role").and_then(|v| v.as_str()), Some("Student"));
}

#[test]
fn student_login_fails_without_a_dataset() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let session = open_session(&mut stdin, &mut reader, "1");

    let error = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "auth.login",
        json!({ "sessionId": session, "email": "alice@x.com", "password": "alice" }),
    );
    assert_eq!(error_code(&error), "invalid_credentials");
}

#[test]
fn wrong_prefix_is_rejected() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    upload_as_admin(&mut stdin, &mut reader, SAMPLE_CSV);

    let session = open_session(&mut stdin, &mut reader, "1");
    let error = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "auth.login",
        json!({ "sessionId": session, "email": "alice@x.com", "password": "bob" }),
    );
    assert_eq!(error_code(&error), "invalid_credentials");
}

#[test]
fn display_name_falls_back_when_no_name_column() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    upload_as_admin(
        &mut stdin,
        &mut reader,
        "Email,PreScore,PostScore\ncara@x.com,10,20\n",
    );

    let session = open_session(&mut stdin, &mut reader, "1");
    let result = login_ok(&mut stdin, &mut reader, "2", &session, "cara@x.com", "cara");
    assert_eq!(
        result.get("displayName").and_then(|v| v.as_str()),
        Some("Student")
    );
}

#[test]
fn repeated_login_is_deterministic() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    upload_as_admin(&mut stdin, &mut reader, SAMPLE_CSV);

    let first_session = open_session(&mut stdin, &mut reader, "1");
    let first = login_ok(
        &mut stdin,
        &mut reader,
        "2",
        &first_session,
        "dan@x.com",
        "dan",
    );
    let second_session = open_session(&mut stdin, &mut reader, "3");
    let second = login_ok(
        &mut stdin,
        &mut reader,
        "4",
        &second_session,
        "dan@x.com",
        "dan",
    );
    assert_eq!(first.get("role"), second.get("role"));
    assert_eq!(first.get("displayName"), second.get("displayName"));
    assert_eq!(first.get("email"), second.get("email"));
}
