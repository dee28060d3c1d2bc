//! Health probe: a trivial `SELECT 1`-shaped request sent over whatever
//! transport the endpoint names. Used both by startup (poll until the
//! server answers) and by clients deciding whether to fall back to the
//! embedded engine.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

use uuid::Uuid;

use crate::endpoint::Endpoint;
use crate::protocol::{Request, Response};

/// One-shot connect-send-receive with a short timeout. Returns `true` only
/// if the daemon answered `ok: true`.
pub fn check_health(endpoint: &Endpoint, timeout: Duration) -> bool {
    send_request(endpoint, "ping", serde_json::Value::Null, timeout)
        .map(|resp| resp.ok)
        .unwrap_or(false)
}

/// Sends one newline-delimited JSON request and reads one response line.
pub fn send_request(
    endpoint: &Endpoint,
    op: &str,
    args: serde_json::Value,
    timeout: Duration,
) -> Result<Response, std::io::Error> {
    let request = Request { op: op.to_string(), args, deadline_ms: Some(timeout.as_millis() as u64), request_id: Uuid::new_v4().to_string() };
    let mut line = serde_json::to_string(&request).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    line.push('\n');

    match endpoint {
        #[cfg(unix)]
        Endpoint::Unix(path) => {
            let mut stream = UnixStream::connect(path)?;
            stream.set_read_timeout(Some(timeout))?;
            stream.set_write_timeout(Some(timeout))?;
            stream.write_all(line.as_bytes())?;
            let mut reader = BufReader::new(stream);
            let mut reply = String::new();
            reader.read_line(&mut reply)?;
            parse_response(&reply)
        }
        #[cfg(not(unix))]
        Endpoint::Unix(_) => Err(std::io::Error::new(std::io::ErrorKind::Unsupported, "unix sockets unavailable on this platform")),
        Endpoint::Tcp { host, port } => {
            let mut stream = TcpStream::connect((host.as_str(), *port))?;
            stream.set_read_timeout(Some(timeout))?;
            stream.set_write_timeout(Some(timeout))?;
            stream.write_all(line.as_bytes())?;
            let mut reader = BufReader::new(stream);
            let mut reply = String::new();
            reader.read_line(&mut reply)?;
            parse_response(&reply)
        }
    }
}

fn parse_response(line: &str) -> Result<Response, std::io::Error> {
    serde_json::from_str(line).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
