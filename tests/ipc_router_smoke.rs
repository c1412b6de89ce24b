use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradesd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradesd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn read_response(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response");
    serde_json::from_str(line.trim()).expect("parse response json")
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let value = read_response(reader);
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

fn categories() -> serde_json::Value {
    json!([
        { "id": "hw", "name": "Homework", "weight": 40 },
        { "id": "exam", "name": "Exams", "weight": 60 }
    ])
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(
        health
            .get("result")
            .and_then(|r| r.get("version"))
            .and_then(|v| v.as_str()),
        Some(env!("CARGO_PKG_VERSION"))
    );

    let config = json!({
        "courseId": "c1",
        "courseName": "Physics",
        "categories": categories(),
    });
    let _ = request(
        &mut stdin,
        &mut reader,
        "2",
        "grades.letter",
        json!({ "percentage": 88 }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "3",
        "grades.targetForLetter",
        json!({ "letter": "B" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "4",
        "grades.summary",
        json!({ "config": config, "assignments": [] }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "5",
        "grades.summaries",
        json!({ "courses": [{ "config": config }] }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "6",
        "grades.whatIf",
        json!({ "config": config, "overrides": {} }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "7",
        "categories.resolve",
        json!({ "groupName": "Homework", "categories": categories() }),
    );
    let _ = request(&mut stdin, &mut reader, "8", "config.default", json!({ "courseId": "c2" }));
    let _ = request(
        &mut stdin,
        &mut reader,
        "9",
        "assignments.map",
        json!({ "records": [], "categories": categories() }),
    );

    let health = request(&mut stdin, &mut reader, "10", "health", json!({}));
    assert_eq!(
        health
            .get("result")
            .and_then(|r| r.get("requestsHandled"))
            .and_then(|v| v.as_u64()),
        Some(10)
    );

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn unknown_methods_and_bad_lines_get_error_replies() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    writeln!(stdin, "{}", json!({ "id": "x", "method": "grades.nope", "params": {} }))
        .expect("write request");
    stdin.flush().expect("flush");
    let resp = read_response(&mut reader);
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        resp.get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("not_implemented")
    );

    writeln!(stdin, "this is not json").expect("write garbage");
    stdin.flush().expect("flush");
    let resp = read_response(&mut reader);
    assert_eq!(
        resp.get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("bad_json")
    );

    // Blank lines are skipped without a reply; the next request still lines up.
    writeln!(stdin).expect("write blank");
    let resp = request(&mut stdin, &mut reader, "after", "health", json!({}));
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(true));

    drop(stdin);
    let _ = child.wait();
}
