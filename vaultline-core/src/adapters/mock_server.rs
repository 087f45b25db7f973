//! Mock dashboard API server for testing
//!
//! Serves fixed fixtures with the same JSON shapes as the real backend:
//! - GET /userAccountOverview/{id}
//! - GET /transactions, GET /loans, GET /activeLoans
//! - GET /transactionStats/{id}
//! - POST /loans and POST /transactions echo the body back with an id

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use serde_json::{json, Value};

/// Mock dashboard server for testing
pub struct MockApiServer {
    port: u16,
    running: Arc<AtomicBool>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// Failure injection for the mock server
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Answer every request with this status
    pub fail_status: Option<u16>,
    /// Answer 200 with a body that is not valid JSON
    pub malformed_body: bool,
    /// Delay in milliseconds before responding
    pub delay_ms: u64,
}

impl MockApiServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        listener.set_nonblocking(true)?;

        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let cfg = config.clone();
                        thread::spawn(move || handle_connection(stream, &cfg));
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
            thread_handle: Some(thread_handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockApiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Read headers, then keep reading until `Content-Length` bytes of body arrived
fn read_request(stream: &mut TcpStream) -> Option<(String, String)> {
    let _ = stream.set_nonblocking(false);
    let mut data = Vec::new();
    let mut buffer = [0; 4096];

    loop {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..n]);

        let text = String::from_utf8_lossy(&data);
        if let Some(split) = text.find("\r\n\r\n") {
            let head = &text[..split];
            let content_length = head
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.trim()
                        .eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            let body = &text[split + 4..];
            if body.len() >= content_length {
                return Some((head.to_string(), body.to_string()));
            }
        }
    }
    None
}

fn handle_connection(mut stream: TcpStream, config: &MockConfig) {
    let Some((head, body)) = read_request(&mut stream) else {
        return;
    };

    if config.delay_ms > 0 {
        thread::sleep(std::time::Duration::from_millis(config.delay_ms));
    }

    let first_line = head.lines().next().unwrap_or("");
    let parts: Vec<&str> = first_line.split_whitespace().collect();
    if parts.len() < 2 {
        send_response(&mut stream, 400, "Bad Request", r#"{"error": "Invalid request"}"#);
        return;
    }

    if let Some(status) = config.fail_status {
        let body = json!({ "message": "Service temporarily unavailable" }).to_string();
        send_response(&mut stream, status, "Error", &body);
        return;
    }

    if config.malformed_body {
        send_response(&mut stream, 200, "OK", "{\"items\": [");
        return;
    }

    let method = parts[0];
    let path = parts[1].split('?').next().unwrap_or(parts[1]);

    let response = match (method, path) {
        ("GET", p) if p.starts_with("/userAccountOverview/") => Some(user_fixture()),
        ("GET", "/transactions") => Some(transactions_fixture()),
        ("GET", "/loans") => Some(loans_fixture()),
        ("GET", "/activeLoans") => Some(active_loans_fixture()),
        ("GET", p) if p.starts_with("/transactionStats/") => Some(json!({
            "totalIncome": 5000,
            "totalExpenses": 1250.5,
            "netBalance": 3749.5
        })),
        ("POST", "/loans") | ("POST", "/transactions") => {
            match serde_json::from_str::<Value>(&body) {
                Ok(Value::Object(mut map)) => {
                    map.insert("id".to_string(), json!("9"));
                    map.insert("createdAt".to_string(), json!("2024-06-01T00:00:00.000Z"));
                    map.insert("updatedAt".to_string(), json!("2024-06-01T00:00:00.000Z"));
                    let json = Value::Object(map).to_string();
                    send_response(&mut stream, 201, "Created", &json);
                }
                _ => send_response(
                    &mut stream,
                    400,
                    "Bad Request",
                    r#"{"error": "Body must be a JSON object"}"#,
                ),
            }
            return;
        }
        _ => None,
    };

    match response {
        Some(value) => send_response(&mut stream, 200, "OK", &value.to_string()),
        None => send_response(
            &mut stream,
            404,
            "Not Found",
            r#"{"error": "Endpoint not found"}"#,
        ),
    }
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

fn user_fixture() -> Value {
    json!({
        "id": "1",
        "name": "Ada Obi",
        "email": "ada@example.com",
        "accountBalance": 15000.75,
        "accountNumber": "0123456789",
        "createdAt": "2024-01-01T00:00:00.000Z",
        "updatedAt": "2024-05-01T00:00:00.000Z"
    })
}

fn transactions_fixture() -> Value {
    json!([
        { "id": "1", "date": "2024-05-01", "amount": 5000, "type": "credit",
          "description": "Salary deposit", "category": "Income" },
        { "id": "2", "date": "2024-05-03", "amount": "1200.50", "type": "debit",
          "description": "Rent", "category": "Housing" },
        { "id": "3", "date": "2024-05-04T09:15:00Z", "amount": 50, "type": "debit",
          "description": "Groceries", "category": "Food" }
    ])
}

fn loans_fixture() -> Value {
    json!([
        { "id": "1", "amount": 5000, "tenure": 12, "status": "active",
          "purpose": "Small business inventory", "startDate": "2024-01-15T00:00:00.000Z",
          "endDate": "2025-01-09T00:00:00.000Z", "interestRate": 8.5 },
        { "id": "2", "amount": 1500, "tenure": 6, "status": "completed",
          "purpose": "Laptop for freelance work", "startDate": "2023-06-01T00:00:00.000Z",
          "endDate": "2023-11-28T00:00:00.000Z", "interestRate": 8.5 }
    ])
}

fn active_loans_fixture() -> Value {
    json!([
        { "id": "1", "amount": 5000, "outstandingAmount": 3200, "tenure": 12,
          "remainingTenure": 8, "status": "active", "purpose": "Small business inventory",
          "loanType": "business", "endDate": "2025-01-09T00:00:00.000Z", "interestRate": 8.5,
          "paymentSchedule": { "nextPaymentAmount": 450, "daysUntilNextPayment": 12,
                               "isOverdue": false } }
    ])
}
