//! HTTP transport against a throwaway local server.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use onepager::{
    AppConfig, FetchError, FollowUpInputs, HttpSource, LookupError, PartitionScheme,
    PartitionSource, RecordStore, ReportAssembler,
};

/// Serves `routes` (path -> (status, body)) and records every requested path.
struct StaticServer {
    base: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StaticServer {
    fn start(routes: &[(&str, u16, &str)]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}/chunks", listener.local_addr().unwrap());
        let routes: HashMap<String, (u16, String)> = routes
            .iter()
            .map(|(path, status, body)| (format!("/chunks/{}", path), (*status, body.to_string())))
            .collect();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                respond(stream, &routes, &seen);
            }
        });

        Self { base, requests }
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn respond(stream: TcpStream, routes: &HashMap<String, (u16, String)>, seen: &Mutex<Vec<String>>) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();
    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string();

    // Drain headers up to the blank line; GET requests carry no body.
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
            break;
        }
    }

    seen.lock().unwrap().push(path.clone());
    let (status, body) = routes
        .get(&path)
        .cloned()
        .unwrap_or((404, "not found".to_string()));
    let reason = if status == 200 { "OK" } else { "Not Found" };
    let mut stream = stream;
    let _ = write!(
        stream,
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    let _ = stream.flush();
}

#[test]
fn missing_partition_is_skipped_and_scan_continues() {
    let server = StaticServer::start(&[
        ("manifest.json", 200, r#"{"files":["a.json","b.json"]}"#),
        ("b.json", 200, r#"{"20012345":{"Acct Name":"Ramesh Patel","O/S Bal":"1,00,000"}}"#),
    ]);
    let source = HttpSource::new(&server.base, Duration::from_secs(5)).unwrap();
    let store = RecordStore::new(source, PartitionScheme::default());

    let report = ReportAssembler::new(&store)
        .assemble("20012345", &FollowUpInputs::default())
        .unwrap();
    assert_eq!(report.account_name, "Ramesh Patel");
    assert_eq!(report.outstanding, "1,00,000");
    assert_eq!(
        server.requests(),
        vec!["/chunks/manifest.json", "/chunks/a.json", "/chunks/b.json"]
    );

    // Cached: only the failed partition is asked for again.
    store.resolve("20012345").unwrap();
    assert_eq!(server.requests().len(), 4);
    assert_eq!(server.requests()[3], "/chunks/a.json");
}

#[test]
fn non_success_status_is_reported_with_url() {
    let server = StaticServer::start(&[]);
    let source = HttpSource::new(&server.base, Duration::from_secs(5)).unwrap();

    match source.fetch("a.json") {
        Err(FetchError::Status { name, status }) => {
            assert_eq!(status, 404);
            assert_eq!(name, format!("{}/a.json", server.base));
        }
        other => panic!("expected a status error, got {:?}", other.map(|b| b.len())),
    }
}

#[test]
fn missing_manifest_is_manifest_unavailable() {
    let server = StaticServer::start(&[]);
    let source = HttpSource::new(&server.base, Duration::from_secs(5)).unwrap();
    let store = RecordStore::new(source, PartitionScheme::default());

    match store.resolve("20012345") {
        Err(LookupError::ManifestUnavailable { location, reason }) => {
            assert!(location.ends_with("/chunks/manifest.json"), "{}", location);
            assert!(reason.contains("404"), "{}", reason);
        }
        other => panic!("expected ManifestUnavailable, got {:?}", other),
    }
}

#[test]
fn unresponsive_host_times_out() {
    // Connections queue in the backlog but nothing ever answers them.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}/chunks/", listener.local_addr().unwrap());

    let source = HttpSource::new(&base, Duration::from_millis(300)).unwrap();
    let store = RecordStore::new(source, PartitionScheme::default());

    let started = Instant::now();
    let result = store.resolve("20012345");
    assert!(
        matches!(result, Err(LookupError::ManifestUnavailable { .. })),
        "got {:?}",
        result
    );
    assert!(started.elapsed() < Duration::from_secs(5), "took {:?}", started.elapsed());
    drop(listener);
}

#[test]
fn configured_timeout_reaches_the_http_client() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}/chunks", listener.local_addr().unwrap());
    let env: HashMap<&str, String> = [
        ("ONEPAGER_DATA", base),
        ("ONEPAGER_TIMEOUT_SECS", "1".to_string()),
    ]
    .into_iter()
    .collect();

    let config = AppConfig::from_lookup(|key| env.get(key).cloned()).unwrap();
    assert!(config.is_remote());
    let store = config.build_store().unwrap();

    let started = Instant::now();
    assert!(matches!(
        store.resolve("20012345"),
        Err(LookupError::ManifestUnavailable { .. })
    ));
    assert!(started.elapsed() < Duration::from_secs(10), "took {:?}", started.elapsed());
    drop(listener);
}
