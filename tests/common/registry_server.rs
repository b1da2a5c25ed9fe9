//! Minimal HTTP/1.1 server standing in for the metadata registries.
//!
//! Each route is a path prefix with a queue of `(status, body)` replies.
//! Requests pop the next reply of the first matching route; once a queue is
//! down to one reply it is repeated. Unmatched paths get 404.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Default)]
struct State {
    routes: Vec<(String, Vec<(u16, String)>)>,
    requests: Vec<Request>,
}

/// One request as seen by the server.
#[derive(Debug, Clone)]
pub struct Request {
    pub path: String,
    pub user_agent: Option<String>,
    pub accept: Option<String>,
}

/// Handle to a running server; it lives until the process exits.
#[derive(Clone)]
pub struct RegistryServer {
    base_url: String,
    state: Arc<Mutex<State>>,
}

impl RegistryServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(Mutex::new(State::default()));
        let shared = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&shared);
                thread::spawn(move || handle(stream, &state));
            }
        });
        Self {
            base_url: format!("http://127.0.0.1:{port}"),
            state,
        }
    }

    /// Base URL without trailing slash, e.g. `http://127.0.0.1:40123`.
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Queue replies for requests whose path starts with `prefix`.
    pub fn route(&self, prefix: &str, replies: &[(u16, &str)]) -> &Self {
        let replies = replies.iter().map(|(s, b)| (*s, b.to_string())).collect();
        self.state
            .lock()
            .unwrap()
            .routes
            .push((prefix.to_string(), replies));
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn hits(&self, prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.path.starts_with(prefix))
            .count()
    }
}

fn handle(mut stream: TcpStream, state: &Mutex<State>) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(raw) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let request = parse_request(raw);

    let (status, body) = {
        let mut state = state.lock().unwrap();
        state.requests.push(request.clone());
        match state
            .routes
            .iter_mut()
            .find(|(prefix, _)| request.path.starts_with(prefix.as_str()))
        {
            Some((_, replies)) if replies.len() > 1 => replies.remove(0),
            Some((_, replies)) if !replies.is_empty() => replies[0].clone(),
            _ => (404, "Resource not found.".to_string()),
        }
    };

    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason(status),
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(body.as_bytes());
}

fn parse_request(raw: &str) -> Request {
    let mut lines = raw.lines();
    let path = lines
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let mut user_agent = None;
    let mut accept = None;
    for line in lines {
        if line.trim().is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let value = Some(value.trim().to_string());
            if name.trim().eq_ignore_ascii_case("user-agent") {
                user_agent = value;
            } else if name.trim().eq_ignore_ascii_case("accept") {
                accept = value;
            }
        }
    }
    Request {
        path,
        user_agent,
        accept,
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
