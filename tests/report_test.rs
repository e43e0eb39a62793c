use apiharness::config::ReportConfig;
use apiharness::http::{ApiClient, Method, Target};
use apiharness::report::{Level, ReportSink, SinkPhase};
use apiharness::{ReportListener, TestInfo, TestListener, TestOutcome};
use reqwest::header::HeaderMap;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sink_in(temp_dir: &TempDir) -> (ReportSink, PathBuf) {
    let report_path = temp_dir.path().join("extent-report.html");
    let config = ReportConfig::default().with_path(&report_path);
    (ReportSink::new(config), report_path)
}

/// suite start -> loginTest -> PASS -> suite finish
#[test]
fn test_single_passing_test_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let (sink, report_path) = sink_in(&temp_dir);

    let report = sink.ensure_initialized().unwrap();
    sink.begin_entry("loginTest", "verifies login").unwrap();
    sink.log(Level::Pass, "Test Passed").unwrap();
    sink.flush().unwrap();

    let entries = report.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "loginTest");
    assert_eq!(entries[0].description, "verifies login");
    assert_eq!(entries[0].records.len(), 1);
    assert_eq!(entries[0].records[0].level, Level::Pass);
    assert_eq!(entries[0].records[0].message(), Some("Test Passed"));

    let html = fs::read_to_string(&report_path).unwrap();
    assert_eq!(html.matches("<section class=\"test").count(), 1);
    assert_eq!(html.matches("<tr class=\"log\">").count(), 1);
    assert!(html.contains("loginTest"));
    assert!(html.contains("verifies login"));
    assert!(html.contains("<td class=\"level pass\">PASS</td>"));
    assert!(html.contains("<span class=\"message\">Test Passed</span>"));
}

#[test]
fn test_json_report_alongside_html() {
    let temp_dir = TempDir::new().unwrap();
    let html_path = temp_dir.path().join("extent-report.html");
    let json_path = temp_dir.path().join("reports").join("extent-report.json");
    let mut config = ReportConfig::default().with_path(&html_path);
    config.json_path = Some(json_path.clone());
    let sink = ReportSink::new(config);

    sink.ensure_initialized().unwrap();
    sink.begin_entry("loginTest", "verifies login").unwrap();
    sink.log(Level::Pass, "Test Passed").unwrap();
    sink.flush().unwrap();

    assert!(html_path.exists());
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["summary"]["passed"], 1);
    assert_eq!(json["entries"][0]["name"], "loginTest");
    assert_eq!(json["entries"][0]["records"][0]["body"]["data"], "Test Passed");
}

#[test]
fn test_flush_twice_writes_once() {
    let temp_dir = TempDir::new().unwrap();
    let (sink, report_path) = sink_in(&temp_dir);

    sink.ensure_initialized().unwrap();
    sink.begin_entry("only", "").unwrap();
    sink.flush().unwrap();
    assert!(report_path.exists());

    fs::remove_file(&report_path).unwrap();
    sink.flush().unwrap();
    assert!(!report_path.exists());
    assert_eq!(sink.phase(), SinkPhase::Flushed);
}

#[test]
fn test_flush_without_initialization_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let (sink, report_path) = sink_in(&temp_dir);

    sink.flush().unwrap();
    assert!(!report_path.exists());
}

#[test]
fn test_entries_on_different_threads_do_not_mix() {
    let temp_dir = TempDir::new().unwrap();
    let (sink, _) = sink_in(&temp_dir);
    let report = sink.ensure_initialized().unwrap();

    std::thread::scope(|scope| {
        for i in 0..4 {
            let sink = &sink;
            scope.spawn(move || {
                let name = format!("worker{}", i);
                sink.begin_entry(&name, "parallel").unwrap();
                sink.log(Level::Info, format!("hello from {}", name)).unwrap();
                sink.log(Level::Pass, "Test Passed").unwrap();
                assert_eq!(sink.current_entry().unwrap().name(), name);
            });
        }
    });

    let entries = report.entries();
    assert_eq!(entries.len(), 4);
    for entry in entries {
        assert_eq!(entry.records.len(), 2);
        assert_eq!(
            entry.records[0].message(),
            Some(format!("hello from {}", entry.name).as_str())
        );
    }
}

#[tokio::test]
async fn test_listener_suite_with_requests() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"user": "alice"})))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let (sink, report_path) = sink_in(&temp_dir);
    let listener = ReportListener::new(&sink);
    let client = ApiClient::new().unwrap();
    let target = Target::new(mock_server.uri(), "/api/profile");
    let (client, target) = (&client, &target);

    listener.on_start().unwrap();

    let profile = TestInfo::new("profileTest", "reads the profile");
    let outcome = listener
        .run(&profile, |entry| async move {
            let dispatch = client
                .send(target, Method::Get, &HeaderMap::new(), None)
                .await?;
            dispatch.log_to(&entry)?;
            anyhow::ensure!(dispatch.response.is_success(), "unexpected status");
            Ok::<(), anyhow::Error>(())
        })
        .await
        .unwrap();
    assert_eq!(outcome, TestOutcome::Passed);

    let wrong_status = TestInfo::new("wrongStatusTest", "expects a 500");
    let outcome = listener
        .run(&wrong_status, |_| async move {
            let dispatch = client
                .send(target, Method::Get, &HeaderMap::new(), None)
                .await?;
            let status = dispatch.response.status_code();
            anyhow::ensure!(status == Some(500), "expected 500, got {:?}", status);
            Ok::<(), anyhow::Error>(())
        })
        .await
        .unwrap();
    assert!(matches!(outcome, TestOutcome::Failed(ref msg) if msg.contains("expected 500")));

    let pending = TestInfo::new("pendingTest", "not ready").skipped();
    let outcome = listener
        .run(&pending, |_| async { Ok::<(), anyhow::Error>(()) })
        .await
        .unwrap();
    assert_eq!(outcome, TestOutcome::Skipped);

    listener.on_finish().unwrap();

    let html = fs::read_to_string(&report_path).unwrap();
    assert_eq!(html.matches("<section class=\"test").count(), 3);
    assert!(html.contains("<section class=\"test pass\""));
    assert!(html.contains("<section class=\"test fail\""));
    assert!(html.contains("<section class=\"test skip\""));
    assert!(html.contains("Request URI:\thttp://127.0.0.1"));
    assert!(html.contains("&quot;user&quot;: &quot;alice&quot;"));
    assert!(html.contains("expected 500, got Some(200)"));
    assert!(html.contains("Test Skipped"));
    assert!(html.contains("<span>Passed: 1</span><span>Failed: 1</span><span>Skipped: 1</span>"));
}
