use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use screenbridge_bridge::{serve, Dispatcher};
use screenbridge_capture_engine::testing::{FakeBackend, FakeEngine};
use screenbridge_capture_engine::{CaptureManager, EngineSettings, ManagerState, RecordingConfig};
use serde_json::{json, Value};

fn fake_manager() -> Mutex<CaptureManager> {
    Mutex::new(CaptureManager::new(
        Box::new(FakeBackend::default()),
        Box::new(FakeEngine::new()),
        EngineSettings::default(),
    ))
}

/// Requests and expected responses from the session fixture, in order.
fn load_session() -> (Vec<String>, Vec<Value>) {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("bridge")
        .join("session.jsonl");

    let content = std::fs::read_to_string(path).expect("bridge session fixture should be readable");
    let mut requests = Vec::new();
    let mut expected = Vec::new();
    for line in content.lines().map(str::trim) {
        if let Some(request) = line.strip_prefix("> ") {
            requests.push(request.to_string());
        } else if let Some(response) = line.strip_prefix("< ") {
            expected.push(serde_json::from_str(response).expect("expected response is JSON"));
        }
    }
    assert_eq!(requests.len(), expected.len(), "every request needs a response");
    (requests, expected)
}

fn run(manager: &Mutex<CaptureManager>, requests: &[String]) -> Vec<Value> {
    let input = requests.join("\n");
    let mut output = Vec::new();
    let handled = serve(manager, &Dispatcher::default(), input.as_bytes(), &mut output).unwrap();
    assert_eq!(handled, requests.len());

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).expect("bridge writes one JSON object per line"))
        .collect()
}

fn without_message(mut response: Value) -> Value {
    if let Some(error) = response.get_mut("error").and_then(Value::as_object_mut) {
        error.remove("message");
    }
    response
}

#[test]
fn session_fixture_matches_golden_responses() {
    let (requests, expected) = load_session();
    let manager = fake_manager();
    let actual = run(&manager, &requests);
    assert_eq!(actual.len(), expected.len());

    for ((request, want), got) in requests.iter().zip(&expected).zip(actual) {
        let has_message = want.pointer("/error/message").is_some();
        let got = if want.get("error").is_some() && !has_message {
            without_message(got)
        } else {
            got
        };
        assert_eq!(&got, want, "response to {request}");
    }
}

#[test]
fn recording_round_trip_over_the_bridge() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("take.mkv");
    let path = output.to_str().unwrap();

    let requests = vec![
        json!({"id": 1, "method": "init"}).to_string(),
        json!({"id": 2, "method": "startRecording", "params": [path, {"displayId": "1", "fps": 30}]})
            .to_string(),
        json!({"id": 3, "method": "startRecording", "params": [path]}).to_string(),
        json!({"id": 4, "method": "status"}).to_string(),
        json!({"id": 5, "method": "stopRecording"}).to_string(),
    ];
    let manager = fake_manager();
    let responses = run(&manager, &requests);

    assert_eq!(responses[1], json!({"id": 2, "ok": true, "result": true}));
    assert_eq!(responses[2]["error"]["kind"], "invalid_state");
    assert_eq!(responses[3]["result"]["state"], "recording");
    assert_eq!(responses[3]["result"]["output"], path);

    let summary = &responses[4]["result"];
    assert_eq!(summary["path"], path);
    assert!(summary["bytesWritten"].as_u64().unwrap() > 0);
    assert!(summary["durationSecs"].as_f64().unwrap() >= 0.0);

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("fakevideosrc cursor=true display=1"));
    assert!(written.contains("framerate=30/1"));
}

#[test]
fn closing_input_finalizes_active_recording() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("left-open.mp4");

    let requests = vec![
        json!({"id": 1, "method": "init"}).to_string(),
        json!({"id": 2, "method": "startRecording", "params": [output.to_str().unwrap()]})
            .to_string(),
    ];
    let manager = fake_manager();
    let responses = run(&manager, &requests);

    assert_eq!(responses[1]["ok"], true);
    assert!(output.exists());
    assert_eq!(manager.lock().unwrap().state(), ManagerState::ShutDown);
}

#[test]
fn blank_lines_are_skipped() {
    let input = "\n{\"id\":1,\"method\":\"init\"}\n   \n\t\n{\"id\":2,\"method\":\"status\"}\n\n";
    let manager = fake_manager();
    let mut output = Vec::new();
    let handled = serve(&manager, &Dispatcher::default(), input.as_bytes(), &mut output).unwrap();

    assert_eq!(handled, 2);
    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[1]["id"], 2);
}

#[test]
fn non_utf8_line_is_answered_and_session_continues() {
    let dir = tempfile::tempdir().unwrap();
    let output_file = dir.path().join("take.mkv");

    let mut input = Vec::new();
    input.extend_from_slice(json!({"id": 1, "method": "init"}).to_string().as_bytes());
    input.push(b'\n');
    input.extend_from_slice(
        json!({"id": 2, "method": "startRecording", "params": [output_file.to_str().unwrap()]})
            .to_string()
            .as_bytes(),
    );
    input.push(b'\n');
    input.extend_from_slice(b"{\"id\":3,\"method\":\"st\xFFtus\"}\n");
    input.extend_from_slice(json!({"id": 4, "method": "status"}).to_string().as_bytes());
    input.push(b'\n');

    let manager = fake_manager();
    let mut output = Vec::new();
    let handled = serve(&manager, &Dispatcher::default(), input.as_slice(), &mut output).unwrap();
    assert_eq!(handled, 4);

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(responses[2]["id"], Value::Null);
    assert_eq!(responses[2]["error"]["kind"], "parse_error");
    assert_eq!(responses[3]["result"]["state"], "recording");

    assert!(output_file.exists());
    assert_eq!(manager.lock().unwrap().state(), ManagerState::ShutDown);
}

struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "host went away"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn write_failure_still_finalizes_recording() {
    let dir = tempfile::tempdir().unwrap();
    let output_file = dir.path().join("take.mp4");

    let manager = fake_manager();
    {
        let mut guard = manager.lock().unwrap();
        guard.initialize().unwrap();
        guard
            .start_recording(&output_file, &RecordingConfig::default())
            .unwrap();
    }

    let input = format!("{}\n", json!({"id": 1, "method": "status"}));
    let result = serve(&manager, &Dispatcher::default(), input.as_bytes(), BrokenPipe);

    assert!(result.is_err());
    assert!(output_file.exists());
    assert_eq!(manager.lock().unwrap().state(), ManagerState::ShutDown);
}

#[test]
fn failed_init_is_an_error_frame_without_result() {
    let manager = Mutex::new(CaptureManager::new(
        Box::new(FakeBackend {
            fail_init: true,
            ..FakeBackend::default()
        }),
        Box::new(FakeEngine::new()),
        EngineSettings::default(),
    ));
    let responses = run(&manager, &[json!({"id": 1, "method": "init"}).to_string()]);

    assert_eq!(responses[0]["ok"], false);
    assert_eq!(responses[0]["error"]["kind"], "platform");
    assert!(responses[0].get("result").is_none());
}
