//! Mock OpenAI Responses API server for testing
//!
//! Serves `POST /responses` with scripted replies, one per request in order
//! (the last reply repeats), and records every request body it receives.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::json;

/// Mock OpenAI server for testing
pub struct MockOpenAiServer {
    port: u16,
    running: Arc<AtomicBool>,
    state: Arc<MockState>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// Configuration for scripted replies
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Model output text for each successive request
    pub replies: Vec<String>,
    /// Whether to answer every request with 401
    pub fail_auth: bool,
}

#[derive(Default)]
struct MockState {
    hits: AtomicUsize,
    bodies: Mutex<Vec<String>>,
}

impl MockOpenAiServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let state = Arc::new(MockState::default());

        // Non-blocking accept so the loop can observe shutdown
        listener.set_nonblocking(true)?;

        let running_clone = running.clone();
        let state_clone = state.clone();
        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let cfg = config.clone();
                        let state = state_clone.clone();
                        thread::spawn(move || handle_connection(stream, &cfg, &state));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(10));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            state,
            thread_handle: Some(thread_handle),
        })
    }

    /// Get the base URL for this mock server
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Number of requests served so far
    pub fn request_count(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// Request bodies received, in order
    pub fn requests(&self) -> Vec<String> {
        self.state.bodies.lock().map(|b| b.clone()).unwrap_or_default()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockOpenAiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn handle_connection(stream: TcpStream, config: &MockConfig, state: &MockState) {
    let _ = stream.set_nonblocking(false);
    let mut reader = BufReader::new(match stream.try_clone() {
        Ok(s) => s,
        Err(_) => return,
    });

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }

    // Headers until the blank line; only Content-Length matters here
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let mut body = vec![0u8; content_length];
    if reader.read_exact(&mut body).is_err() {
        return;
    }

    let index = state.hits.fetch_add(1, Ordering::SeqCst);
    if let Ok(mut bodies) = state.bodies.lock() {
        bodies.push(String::from_utf8_lossy(&body).into_owned());
    }

    let mut stream = stream;
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 || parts[0] != "POST" || parts[1] != "/responses" {
        send_response(&mut stream, 404, "Not Found", r#"{"error": {"message": "Unknown endpoint"}}"#);
        return;
    }

    if config.fail_auth {
        send_response(
            &mut stream,
            401,
            "Unauthorized",
            r#"{"error": {"message": "Incorrect API key provided"}}"#,
        );
        return;
    }

    let text = config
        .replies
        .get(index)
        .or_else(|| config.replies.last())
        .cloned()
        .unwrap_or_default();

    let reply = json!({
        "id": format!("resp_mock_{}", index),
        "object": "response",
        "output": [{
            "type": "message",
            "role": "assistant",
            "content": [{"type": "output_text", "text": text, "annotations": []}]
        }]
    });
    send_response(&mut stream, 200, "OK", &reply.to_string());
}

fn send_response(stream: &mut TcpStream, status: u16, status_text: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
