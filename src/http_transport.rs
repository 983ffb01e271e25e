//! Blocking HTTP seam used by the resolver and the image fetcher.

use std::fmt;
use std::io::Read;

use serde_json::Value;

use crate::config::HttpConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpFailureKind {
    Timeout,
    RateLimited,
    Hard,
}

/// A failed request, classified for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFailure {
    pub kind: HttpFailureKind,
    pub status: Option<u16>,
    pub message: String,
}

impl HttpFailure {
    pub fn hard(message: impl Into<String>) -> Self {
        Self {
            kind: HttpFailureKind::Hard,
            status: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{:?} (HTTP {status}): {}", self.kind, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

/// Interface implemented by concrete HTTP clients.
pub trait HttpTransport {
    fn get_json(&self, url: &str) -> Result<Value, HttpFailure>;
    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, HttpFailure>;
}

/// `ureq`-backed transport that identifies itself on every request.
pub struct UreqTransport {
    http_client: ureq::Agent,
    user_agent: String,
}

impl UreqTransport {
    pub fn new(config: &HttpConfig) -> Self {
        let http_client = ureq::AgentBuilder::new().build();
        Self {
            http_client,
            user_agent: config.user_agent.clone(),
        }
    }

    fn classify_ureq_failure(error: &ureq::Error) -> (HttpFailureKind, Option<u16>) {
        match error {
            ureq::Error::Status(code, _) => {
                let kind = match code {
                    429 => HttpFailureKind::RateLimited,
                    408 | 500 | 502 | 503 | 504 => HttpFailureKind::Timeout,
                    _ => HttpFailureKind::Hard,
                };
                (kind, Some(*code))
            }
            ureq::Error::Transport(transport) => {
                let lowered = transport.to_string().to_ascii_lowercase();
                if lowered.contains("timed out") || lowered.contains("timeout") {
                    (HttpFailureKind::Timeout, None)
                } else {
                    (HttpFailureKind::Hard, None)
                }
            }
        }
    }

    fn classify_io_failure(error: &std::io::Error, context: &str) -> HttpFailure {
        let timed_out = matches!(
            error.kind(),
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
        ) || error.to_string().to_ascii_lowercase().contains("timed out");
        HttpFailure {
            kind: if timed_out {
                HttpFailureKind::Timeout
            } else {
                HttpFailureKind::Hard
            },
            status: None,
            message: format!("{context}: {error}"),
        }
    }

    fn call(&self, url: &str, accept_json: bool) -> Result<ureq::Response, HttpFailure> {
        let mut request = self
            .http_client
            .get(url)
            .set("User-Agent", &self.user_agent);
        if accept_json {
            request = request.set("Accept", "application/json");
        }
        request.call().map_err(|error| {
            let (kind, status) = Self::classify_ureq_failure(&error);
            HttpFailure {
                kind,
                status,
                message: format!("Request failed: {error}"),
            }
        })
    }
}

impl HttpTransport for UreqTransport {
    fn get_json(&self, url: &str) -> Result<Value, HttpFailure> {
        let response = self.call(url, true)?;
        let mut body = String::new();
        response
            .into_reader()
            .read_to_string(&mut body)
            .map_err(|error| Self::classify_io_failure(&error, "Failed to read response"))?;
        serde_json::from_str(&body)
            .map_err(|error| HttpFailure::hard(format!("Invalid JSON response: {error}")))
    }

    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, HttpFailure> {
        let response = self.call(url, false)?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|error| Self::classify_io_failure(&error, "Image read failed"))?;
        Ok(bytes)
    }
}


#[cfg(test)]
mod tests {
    use super::{HttpFailure, HttpFailureKind, HttpTransport, UreqTransport};
    use crate::config::HttpConfig;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serves one canned response on loopback and returns the request head.
    fn serve_once(response: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("loopback bind should succeed");
        let address = listener
            .local_addr()
            .expect("listener should have an address");
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("client should connect");
            let mut reader = BufReader::new(
                stream
                    .try_clone()
                    .expect("stream should be cloneable"),
            );
            let mut head = String::new();
            loop {
                let mut line = String::new();
                let read = reader
                    .read_line(&mut line)
                    .expect("request line should read");
                if read == 0 || line == "\r\n" {
                    break;
                }
                head.push_str(&line);
            }
            stream
                .write_all(response.as_bytes())
                .expect("response should write");
            head
        });
        (format!("http://{address}/Special:FilePath/Empty.jpg"), handle)
    }

    #[test]
    fn test_empty_image_body_is_returned_as_is() {
        let (url, server) =
            serve_once("HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let config = HttpConfig::default();

        let bytes = UreqTransport::new(&config)
            .get_bytes(&url)
            .expect("empty 200 response should not be a transport failure");

        assert!(bytes.is_empty());
        let head = server.join().expect("server thread should finish");
        assert!(head
            .to_ascii_lowercase()
            .contains(&format!("user-agent: {}", config.user_agent).to_ascii_lowercase()));
    }

    #[test]
    fn test_http_failure_display_includes_status() {
        let failure = HttpFailure {
            kind: HttpFailureKind::RateLimited,
            status: Some(429),
            message: "slow down".to_string(),
        };
        assert_eq!(failure.to_string(), "RateLimited (HTTP 429): slow down");
        assert_eq!(
            HttpFailure::hard("empty").to_string(),
            "Hard: empty".to_string()
        );
    }
}
