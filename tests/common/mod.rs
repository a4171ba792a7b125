//! Shared test infrastructure for integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

pub fn dashpack_bin() -> &'static str {
    env!("CARGO_BIN_EXE_dashpack")
}

pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent directory");
    }
    std::fs::write(path, contents.as_bytes()).expect("write file");
}

/// Lay out `dist/index.html` and `dist/<bundle_name>` under `root`.
pub fn write_build_output(root: &Path, html: &str, bundle_name: &str, js: &str) -> PathBuf {
    let dist = root.join("dist");
    write_file(&dist.join("index.html"), html);
    write_file(&dist.join(bundle_name), js);
    dist
}

/// One request as seen by the test server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }
}

/// Canned responses for the login and dashboard endpoints.
#[derive(Debug, Clone)]
pub struct Routes {
    pub login: (u16, String),
    pub publish: (u16, String),
}

impl Routes {
    pub fn ok() -> Self {
        Self {
            login: (200, r#"{"status":"ok"}"#.to_string()),
            publish: (200, r#"{"status":"saved"}"#.to_string()),
        }
    }
}

#[derive(Debug, Default)]
struct ServerState {
    requests: Vec<RecordedRequest>,
    opened: usize,
    closed: usize,
}

/// Minimal HTTP/1.1 server with keep-alive, one thread per connection.
pub struct TestHttpServer {
    addr: SocketAddr,
    stop: Arc<AtomicBool>,
    state: Arc<Mutex<ServerState>>,
    handle: Option<JoinHandle<()>>,
}

impl TestHttpServer {
    pub fn spawn(routes: Routes) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
        listener
            .set_nonblocking(true)
            .expect("set_nonblocking true");
        let addr = listener.local_addr().expect("local_addr");
        let stop = Arc::new(AtomicBool::new(false));
        let state = Arc::new(Mutex::new(ServerState::default()));
        let stop_flag = Arc::clone(&stop);
        let server_state = Arc::clone(&state);
        let handle = std::thread::spawn(move || {
            while !stop_flag.load(Ordering::Relaxed) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        if stop_flag.load(Ordering::Relaxed) {
                            break;
                        }
                        server_state.lock().expect("state lock").opened += 1;
                        let state = Arc::clone(&server_state);
                        let routes = routes.clone();
                        std::thread::spawn(move || serve_connection(stream, &routes, &state));
                    }
                    Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                        std::thread::sleep(Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            }
        });
        Self {
            addr,
            stop,
            state,
            handle: Some(handle),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().expect("state lock").requests.clone()
    }

    /// Wait until every accepted connection has been closed by the client.
    pub fn wait_for_clients_to_close(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            {
                let state = self.state.lock().expect("state lock");
                if state.opened > 0 && state.opened == state.closed {
                    return true;
                }
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Drop for TestHttpServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        let _ = TcpStream::connect(self.addr);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve_connection(stream: TcpStream, routes: &Routes, state: &Mutex<ServerState>) {
    let _ = stream.set_nonblocking(false);
    let _ = stream.set_read_timeout(Some(Duration::from_secs(10)));
    let mut writer = match stream.try_clone() {
        Ok(writer) => writer,
        Err(_) => return,
    };
    let mut reader = BufReader::new(stream);
    loop {
        let Some(request) = read_request(&mut reader) else {
            break;
        };
        let (status, body) = route(routes, &request);
        state.lock().expect("state lock").requests.push(request);

        let reason = match status {
            200 => "OK",
            201 => "Created",
            401 => "Unauthorized",
            404 => "Not Found",
            500 => "Internal Server Error",
            _ => "Status",
        };
        let response = format!(
            "HTTP/1.1 {status} {reason}\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{body}",
            body.len()
        );
        if writer.write_all(response.as_bytes()).is_err() {
            break;
        }
        let _ = writer.flush();
    }
    state.lock().expect("state lock").closed += 1;
}

fn route(routes: &Routes, request: &RecordedRequest) -> (u16, String) {
    match (request.method.as_str(), request.path.as_str()) {
        ("POST", "/api/v2/login") => routes.login.clone(),
        ("PUT", path) if path.starts_with("/api/v2/dashboards/dashboard/") => routes.publish.clone(),
        _ => (404, r#"{"error":"not found"}"#.to_string()),
    }
}

fn read_request(reader: &mut BufReader<TcpStream>) -> Option<RecordedRequest> {
    let mut line = String::new();
    if reader.read_line(&mut line).ok()? == 0 {
        return None;
    }
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = BTreeMap::new();
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).ok()? == 0 {
            return None;
        }
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((key, value)) = header.split_once(':') {
            headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let body = if headers
        .get("transfer-encoding")
        .is_some_and(|value| value.eq_ignore_ascii_case("chunked"))
    {
        read_chunked(reader)?
    } else {
        let len = headers
            .get("content-length")
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(0);
        let mut buf = vec![0_u8; len];
        reader.read_exact(&mut buf).ok()?;
        buf
    };

    Some(RecordedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn read_chunked(reader: &mut BufReader<TcpStream>) -> Option<Vec<u8>> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line).ok()?;
        let size_text = size_line.trim().split(';').next()?;
        let size = usize::from_str_radix(size_text, 16).ok()?;
        let mut chunk = vec![0_u8; size + 2];
        reader.read_exact(&mut chunk).ok()?;
        if size == 0 {
            return Some(body);
        }
        body.extend_from_slice(&chunk[..size]);
    }
}
