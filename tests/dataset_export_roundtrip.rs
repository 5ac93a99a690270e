
use serde_json::json;
use test_support::{request_ok, spawn_sidecar, upload_as_admin, SAMPLE_CSV};

fn export_full(
    stdin: &mut std::process::ChildStdin,
    reader: &mut std::io::BufReader<std::process::ChildStdout>,
    id: &str,
    session: &str,
) -> String {
    request_ok(
        stdin,
        reader,
        id,
        "dataset.exportFull",
        json!({ "sessionId": session }),
    )
    .get("csv")
    .and_then(|v| v.as_str())
    .expect("csv payload")
    .to_string()
}

#[test]
fn admin_export_round_trips_row_for_row() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let admin = upload_as_admin(&mut stdin, &mut reader, SAMPLE_CSV);

    let exported = export_full(&mut stdin, &mut reader, "1", &admin);
    let header = exported.lines().next().expect("header");
    assert_eq!(header, "Name,Email,PreTestScore,PostTestScore,Course");
    assert!(!header.contains("Improvement"));

    // Re-uploading the export reproduces the same dataset.
    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "dataset.upload",
        json!({ "sessionId": admin, "content": exported }),
    );
    let second = export_full(&mut stdin, &mut reader, "3", &admin);
    assert_eq!(exported, second);

    let stats = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "dataset.stats",
        json!({ "sessionId": admin }),
    );
    assert_eq!(stats.get("totalRecords").and_then(|v| v.as_u64()), Some(5));
    assert_eq!(stats.get("totalColumns").and_then(|v| v.as_u64()), Some(5));
}

#[test]
fn quoted_fields_survive_the_round_trip() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let csv = "Name,Email,PreScore,PostScore\n\"Lee, Sam\",sam@x.com,10,30\n";
    let admin = upload_as_admin(&mut stdin, &mut reader, csv);

    let exported = export_full(&mut stdin, &mut reader, "1", &admin);
    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "dataset.upload",
        json!({ "sessionId": admin, "content": exported }),
    );
    let preview = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "dataset.preview",
        json!({ "sessionId": admin }),
    );
    assert_eq!(
        preview.get("rows").cloned().expect("rows"),
        json!([["Lee, Sam", "sam@x.com", 10.0, 30.0]])
    );
}
