//! Integration tests for the HTTP client against a local server.

#![cfg(feature = "http")]

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use epqs::{
    BatchProcessor, Coordinate, ElevationClientBuilder, FetchOutcome, HttpElevationClient,
    NoProgress, PointInput, Status,
};

/// How the test server answers every request.
#[derive(Clone)]
enum Reply {
    Json { status: u16, body: String },
    /// Hold the connection open without answering.
    Stall,
}

struct TestServer {
    url: String,
    connections: Arc<AtomicUsize>,
    request_lines: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    fn start(reply: Reply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let request_lines = Arc::new(Mutex::new(Vec::new()));

        let counter = Arc::clone(&connections);
        let lines = Arc::clone(&request_lines);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                counter.fetch_add(1, Ordering::SeqCst);
                let reply = reply.clone();
                let lines = Arc::clone(&lines);
                thread::spawn(move || handle(stream, reply, lines));
            }
        });

        Self {
            url: format!("http://{}/v1/json", addr),
            connections,
            request_lines,
        }
    }

    fn client(&self, timeout: Duration) -> HttpElevationClient {
        ElevationClientBuilder::new()
            .endpoint(self.url.clone())
            .timeout(timeout)
            .retry_delay(Duration::ZERO)
            .no_proxy()
            .build()
            .unwrap()
    }

    fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

fn handle(mut stream: TcpStream, reply: Reply, lines: Arc<Mutex<Vec<String>>>) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).unwrap_or(0) == 0 {
        return;
    }
    lines.lock().unwrap().push(request_line.trim_end().to_string());

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
            break;
        }
    }

    match reply {
        Reply::Json { status, body } => {
            let reason = if status == 200 { "OK" } else { "Error" };
            let _ = write!(
                stream,
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason,
                body.len(),
                body
            );
        }
        Reply::Stall => thread::sleep(Duration::from_secs(3)),
    }
}

fn json(body: &str) -> Reply {
    Reply::Json {
        status: 200,
        body: body.to_string(),
    }
}

fn denver() -> Coordinate {
    Coordinate::new(39.7392, -104.9903).unwrap()
}

#[test]
fn test_fetch_elevation() {
    let server = TestServer::start(json(r#"{"location":{"x":-104.9903,"y":39.7392},"value":5279.87}"#));
    let client = server.client(Duration::from_secs(5));

    assert_eq!(client.fetch(denver()), FetchOutcome::Elevation(5279.87));
    assert_eq!(server.connections(), 1);
}

#[test]
fn test_request_parameters() {
    let server = TestServer::start(json(r#"{"value":"100"}"#));
    let client = server.client(Duration::from_secs(5));

    assert_eq!(client.fetch(denver()), FetchOutcome::Elevation(100.0));

    let lines = server.request_lines.lock().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(
        lines[0],
        "GET /v1/json?x=-104.9903&y=39.7392&wkid=4326&units=Feet&includeDate=false HTTP/1.1"
    );
}

#[test]
fn test_sentinel_is_not_retried() {
    let server = TestServer::start(json(r#"{"value":-1000000}"#));
    let client = server.client(Duration::from_secs(5));

    let outcome = client.fetch(denver());
    assert_eq!(outcome, FetchOutcome::NoData);
    assert_eq!(outcome.elevation(), None);
    assert_eq!(server.connections(), 1);
}

#[test]
fn test_timeout_retried_three_times() {
    let server = TestServer::start(Reply::Stall);
    let client = server.client(Duration::from_millis(200));

    let outcome = client.fetch(denver());
    assert_eq!(outcome, FetchOutcome::TimedOut { attempts: 3 });
    assert_eq!(outcome.elevation(), None);
    assert_eq!(server.connections(), 3);
}

#[test]
fn test_server_error_not_retried() {
    let server = TestServer::start(Reply::Json {
        status: 500,
        body: "{}".to_string(),
    });
    let client = server.client(Duration::from_secs(5));

    let outcome = client.fetch(denver());
    assert!(outcome.warning().unwrap().contains("500"));
    assert_eq!(server.connections(), 1);
}

#[test]
fn test_connection_refused_is_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ElevationClientBuilder::new()
        .endpoint(format!("http://{}/v1/json", addr))
        .timeout(Duration::from_secs(2))
        .retry_delay(Duration::ZERO)
        .no_proxy()
        .build()
        .unwrap();

    let outcome = client.fetch(denver());
    assert!(matches!(outcome, FetchOutcome::Failed { .. }));
}

#[test]
fn test_batch_against_server() {
    let server = TestServer::start(json(r#"{"value":"42.5"}"#));
    let client = server.client(Duration::from_secs(5));
    let points = vec![
        PointInput::new("first", denver()),
        PointInput::new("second", Coordinate::new(36.5323, -116.9325).unwrap()),
    ];

    let results = BatchProcessor::new(&client)
        .with_rate_limit(Duration::ZERO)
        .process(&points, &mut NoProgress);

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].point_id(), "first");
    assert_eq!(results[1].point_id(), "second");
    assert!(results.iter().all(|r| r.status() == Status::Success));
    assert_eq!(server.connections(), 2);
}
