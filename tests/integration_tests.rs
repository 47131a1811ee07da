//! HTTP contract tests.
//!
//! These tests run the real client against a local mock server and check:
//! - Request shape (auth header, paths, upload body)
//! - Response decoding for events, listings and single files
//! - Status and transport failures map onto the error taxonomy
//! - A full run drives the expected sequence of calls

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::watch;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use streak_keeper::{
    Config, Coordinator, Error, EventKind, GitHubClient, HttpTransport, Platform, PutFileRequest,
    RunReport, ScanOutcome, TreeScanner,
};

fn client_with_timeout(server: &MockServer, timeout: Duration) -> GitHubClient {
    let transport = HttpTransport::new(&server.uri(), "secret", timeout)
        .expect("transport creation should succeed");
    GitHubClient::new(transport, "octo", "streak")
}

fn client(server: &MockServer) -> GitHubClient {
    client_with_timeout(server, Duration::from_secs(5))
}

fn config(server: &MockServer, extra: &[(&str, &str)]) -> Config {
    let uri = server.uri();
    let vars: HashMap<String, String> = [
        ("GITHUB_USERNAME", "octo"),
        ("GITHUB_API_TOKEN", "secret"),
        ("CONTRIB_REPO", "streak"),
        ("GITHUB_API_URL", uri.as_str()),
    ]
    .into_iter()
    .chain(extra.iter().copied())
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    Config::from_lookup(|key| vars.get(key).cloned()).expect("config should load")
}

fn file_entry(name: &str, path: &str, sha: &str) -> Value {
    json!({"name": name, "path": path, "sha": sha, "size": 10, "type": "file"})
}

fn dir_entry(server: &MockServer, name: &str, path: &str) -> Value {
    json!({
        "name": name,
        "path": path,
        "sha": format!("tree-{name}"),
        "type": "dir",
        "_links": {"self": format!("{}/repos/octo/streak/contents/{path}?ref=main", server.uri())}
    })
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test]
async fn test_events_request_is_authenticated() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/octo/events"))
        .and(header("authorization", "Bearer secret"))
        .and(header("accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "type": "PushEvent",
                "created_at": "2024-01-15T10:30:00Z",
                "repo": {"id": 1, "name": "octo/r"},
                "payload": {"commits": [{"sha": "abc", "message": "fix"}]}
            },
            {
                "type": "CreateEvent",
                "created_at": "2024-01-15T09:00:00Z",
                "repo": {"name": "octo/r"},
                "payload": {"ref": "main", "ref_type": "branch"}
            },
            {
                "type": "WatchEvent",
                "created_at": "2024-01-14T09:00:00Z",
                "repo": {"name": "octo/s"},
                "payload": {"action": "started"}
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let events = client(&server).list_events("octo").await.unwrap();

    assert_eq!(events.len(), 3);
    assert_eq!(events[0].kind, EventKind::Push);
    assert_eq!(events[0].commits()[0].message, "fix");
    assert_eq!(events[1].git_ref(), Some("main"));
    assert_eq!(events[2].kind, EventKind::Other);
}

#[tokio::test]
async fn test_events_bad_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/octo/events"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})),
        )
        .mount(&server)
        .await;

    let error = client(&server).list_events("octo").await.unwrap_err();

    match error {
        Error::Protocol(e) => {
            assert_eq!(e.status(), Some(401));
            assert!(e.to_string().contains("Bad credentials"));
        }
        other => panic!("expected protocol error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_undecodable_events_are_protocol_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/octo/events"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let error = client(&server).list_events("octo").await.unwrap_err();

    assert!(matches!(error, Error::Protocol(_)));
}

#[tokio::test]
async fn test_timeout_is_network_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/octo/events"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = client_with_timeout(&server, Duration::from_millis(100));
    let error = client.list_events("octo").await.unwrap_err();

    assert!(matches!(error, Error::Network(_)), "got {error:?}");
}

// ============================================================================
// Repository existence
// ============================================================================

#[tokio::test]
async fn test_repository_existence() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/here"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "here"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/locked"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/blocked"))
        .respond_with(
            ResponseTemplate::new(451)
                .set_body_json(json!({"message": "Repository access blocked"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/broken"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = client(&server);

    assert!(!client.repository_exists("octo/gone").await.unwrap());
    assert!(client.repository_exists("octo/blocked").await.unwrap());
    assert!(client.repository_exists("octo/here").await.unwrap());
    let error = client.repository_exists("octo/locked").await.unwrap_err();
    assert!(matches!(error, Error::Protocol(ref e) if e.status() == Some(401)));
    let error = client.repository_exists("octo/broken").await.unwrap_err();
    assert!(matches!(error, Error::Protocol(_)));
}

// ============================================================================
// Contents
// ============================================================================

#[tokio::test]
async fn test_scan_follows_self_links() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/streak/contents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            file_entry("README.md", "README.md", "r1"),
            file_entry("main.go", "main.go", "m1"),
            dir_entry(&server, "src", "src"),
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/streak/contents/src"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            file_entry("lib.c", "src/lib.c", "l1"),
            file_entry("logo.png", "src/logo.png", "p1"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let platform: Arc<dyn Platform> = Arc::new(client(&server));
    let root = platform.contents_url("");
    let scanner = TreeScanner::new(platform, vec![".go".to_string(), ".c".to_string()]);
    let (_cancel, cancel_rx) = watch::channel(false);

    let outcome = scanner.scan(&root, 5, &cancel_rx).await.unwrap();

    let ScanOutcome::Finished(files) = outcome else {
        panic!("scan should finish");
    };
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["main.go", "src/lib.c"]);
    assert_eq!(files[1].sha, "l1");
}

#[tokio::test]
async fn test_scan_failure_is_walk_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/streak/contents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            dir_entry(&server, "src", "src"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/streak/contents/src"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let platform: Arc<dyn Platform> = Arc::new(client(&server));
    let root = platform.contents_url("");
    let scanner = TreeScanner::new(platform, vec![".go".to_string()]);
    let (_cancel, cancel_rx) = watch::channel(false);

    let error = scanner.scan(&root, 5, &cancel_rx).await.unwrap_err();

    match error {
        Error::Walk { url, .. } => assert!(url.ends_with("/contents/src?ref=main")),
        other => panic!("expected walk error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_get_file() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/streak/contents/notes.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(file_entry("notes.txt", "notes.txt", "n1")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/streak/contents/missing.txt"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&server)
        .await;

    let client = client(&server);

    let file = client.get_file("notes.txt").await.unwrap().expect("file exists");
    assert_eq!(file.sha, "n1");
    assert!(client.get_file("missing.txt").await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_omits_sha() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/repos/octo/streak/contents/new.go"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "content": {"name": "new.go", "path": "new.go", "sha": "fresh"},
            "commit": {"sha": "c1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = PutFileRequest {
        message: "Update README.md".to_string(),
        content: "Ly8gbmV3LmdvCg==".to_string(),
        sha: None,
    };
    let sha = client(&server).put_file("new.go", &request).await.unwrap();
    assert_eq!(sha, "fresh");

    let received = server.received_requests().await.expect("recording enabled");
    let body: Value = received[0].body_json().expect("JSON body");
    assert_eq!(body["message"], "Update README.md");
    assert_eq!(body["content"], "Ly8gbmV3LmdvCg==");
    assert!(body.get("sha").is_none());
}

#[tokio::test]
async fn test_update_conflict_is_protocol_error() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/repos/octo/streak/contents/main.go"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"message": "main.go does not match stale"})),
        )
        .mount(&server)
        .await;

    let request = PutFileRequest {
        message: "Update README.md".to_string(),
        content: "Ly8gc3RhbGUK".to_string(),
        sha: Some("stale".to_string()),
    };
    let error = client(&server).put_file("main.go", &request).await.unwrap_err();

    match error {
        Error::Protocol(e) => {
            assert_eq!(e.status(), Some(409));
            assert!(e.url().ends_with("/repos/octo/streak/contents/main.go"));
        }
        other => panic!("expected protocol error, got {other:?}"),
    }
}

// ============================================================================
// Full runs
// ============================================================================

#[tokio::test]
async fn test_run_tops_up_contributions() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/octo/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/streak/contents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            file_entry("main.go", "main.go", "m1"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/repos/octo/streak/contents/.+$"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"content": {"sha": "next"}})),
        )
        .expect(3)
        .mount(&server)
        .await;

    let config = config(&server, &[("CONTRIB_COUNT", "3")]);
    let client = GitHubClient::from_config(&config).unwrap();

    let report = Coordinator::new(Arc::new(client), config).run().await.unwrap();

    match report {
        RunReport::Mutated {
            count,
            required,
            report,
        } => {
            assert_eq!(count, 0);
            assert_eq!(required, 3);
            assert!(report.is_complete());
            assert_eq!(report.outcomes[0].path, "main.go");
            assert!(!report.outcomes[0].created);
            assert!(report.outcomes[1].created);
        }
        other => panic!("expected mutation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_run_with_minimum_met_writes_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/octo/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "type": "PullRequestEvent",
                "created_at": Utc::now().to_rfc3339(),
                "repo": {"name": "octo/r"},
                "payload": {}
            }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/r"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/streak/contents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let config = config(&server, &[("CONTRIB_MINIMUM", "1")]);
    let client = GitHubClient::from_config(&config).unwrap();

    let report = Coordinator::new(Arc::new(client), config).run().await.unwrap();

    assert!(matches!(report, RunReport::NotNeeded { count: 1, minimum: 1 }));
}
