//! Integration tests for AQL pagination against a local HTTP stub.

use indicatif::ProgressBar;
use rtsweep::aql::AqlClient;
use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

struct Captured {
    path: String,
    authorization: Option<String>,
    body: String,
}

/// Serves one canned response per connection, in order.
fn serve(responses: Vec<(u16, String)>) -> (String, Arc<Mutex<Vec<Captured>>>, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind stub server");
    let url = format!("http://{}/artifactory", listener.local_addr().unwrap());
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&captured);

    let handle = thread::spawn(move || {
        for (status, body) in responses {
            let Ok((stream, _)) = listener.accept() else {
                return;
            };
            let request = read_request(&stream);
            sink.lock().unwrap().push(request);
            respond(stream, status, &body);
        }
    });

    (url, captured, handle)
}

fn read_request(stream: &TcpStream) -> Captured {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();
    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or_default()
        .to_string();

    let mut content_length = 0;
    let mut authorization = None;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim();
            match name.to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.parse().unwrap_or(0),
                "authorization" => authorization = Some(value.to_string()),
                _ => {}
            }
        }
    }

    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).unwrap();
    Captured {
        path,
        authorization,
        body: String::from_utf8_lossy(&body).to_string(),
    }
}

fn respond(mut stream: TcpStream, status: u16, body: &str) {
    let reason = if status == 200 { "OK" } else { "Error" };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).unwrap();
    stream.flush().unwrap();
}

fn page(names: &[&str], start: u64) -> String {
    let results: Vec<Value> = names
        .iter()
        .map(|n| {
            json!({
                "repo": "libs", "path": "app/build_x_1_2345", "name": n, "type": "file",
                "size": 1, "created": "2020-01-01T00:00:00.000Z"
            })
        })
        .collect();
    json!({
        "results": results,
        "range": {
            "start_pos": start,
            "end_pos": start + names.len() as u64,
            "total": names.len(),
            "limit": 2
        }
    })
    .to_string()
}

fn client(url: &str, token: Option<&str>) -> AqlClient {
    AqlClient::new(url, token.map(String::from), 2, Duration::from_secs(5))
        .with_page_delay(Duration::ZERO)
}

#[test]
fn test_fetch_pages_until_short_page() {
    let (url, captured, handle) = serve(vec![
        (200, page(&["a.jar", "b.jar"], 0)),
        (200, page(&["c.jar"], 2)),
    ]);

    let items = client(&url, Some("secret"))
        .fetch_repo("libs", &ProgressBar::hidden())
        .unwrap();
    handle.join().unwrap();

    let names: Vec<&str> = items.iter().map(|i| i["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["a.jar", "b.jar", "c.jar"]);

    let requests = captured.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, "/artifactory/api/search/aql");
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer secret"));
    assert!(requests[0].body.ends_with(".offset(0).limit(2)"));
    assert!(requests[1].body.ends_with(".offset(2).limit(2)"));
}

#[test]
fn test_fetch_stops_on_empty_page() {
    let (url, captured, handle) = serve(vec![
        (200, page(&["a.jar", "b.jar"], 0)),
        (200, page(&[], 2)),
    ]);

    let items = client(&url, None)
        .fetch_repo("libs", &ProgressBar::hidden())
        .unwrap();
    handle.join().unwrap();

    assert_eq!(items.len(), 2);
    let requests = captured.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].authorization.is_none());
}

#[test]
fn test_http_error_aborts_fetch() {
    let (url, _captured, handle) = serve(vec![
        (200, page(&["a.jar", "b.jar"], 0)),
        (500, r#"{"errors":[{"status":500}]}"#.to_string()),
    ]);

    let result = client(&url, None).fetch_all(&["libs".to_string()]);
    handle.join().unwrap();

    let err = result.expect_err("a failed page must abort the fetch");
    assert!(format!("{:#}", err).contains("offset 2"));
}
