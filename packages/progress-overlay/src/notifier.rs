use std::fmt;
use tracing::{debug, trace};

/// The default base URL of the host callback.
pub const DEFAULT_ENDPOINT: &str = "https://progressbar";

/// An action reported back to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostAction {
    /// The bar reached 100%.
    Finish,
}

impl HostAction {
    /// The action's name as the host expects it in the callback path.
    pub fn as_str(&self) -> &'static str {
        match self {
            HostAction::Finish => "FinishAction",
        }
    }
}

impl fmt::Display for HostAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives the overlay's reports to the host.
///
/// Notifications are fire-and-forget: implementations must not block and have no way to report
/// failure.
///
/// Any `Fn(HostAction)` closure is a notifier.
pub trait HostNotifier {
    /// Reports `action` to the host.
    fn post_action(&self, action: HostAction);
}

impl<F> HostNotifier for F
where
    F: Fn(HostAction),
{
    fn post_action(&self, action: HostAction) {
        self(action)
    }
}

/// Notifies the host by POSTing an empty JSON object to `{endpoint}/{action}`.
///
/// Each request runs as a detached task on the smol executor. Responses are ignored and errors
/// are only traced.
#[derive(Clone)]
pub struct HttpNotifier {
    endpoint: String,
    client: surf::Client,
}

impl HttpNotifier {
    /// Creates a notifier for the given base URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: surf::Client::new(),
        }
    }

    /// Returns the URL `action` is posted to.
    pub fn url_for(&self, action: HostAction) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), action)
    }
}

impl fmt::Debug for HttpNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpNotifier")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Default for HttpNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl HostNotifier for HttpNotifier {
    fn post_action(&self, action: HostAction) {
        let url = self.url_for(action);
        let client = self.client.clone();
        smol::spawn(async move {
            let result: surf::Result<surf::Response> = async {
                client
                    .post(&url)
                    .body_json(&serde_json::json!({}))?
                    .await
            }
            .await;
            match result {
                Ok(res) => trace!(%url, status = %res.status(), "host notified"),
                Err(err) => debug!(%url, %err, "host notification failed"),
            }
        })
        .detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macro_rules_attribute::apply;
    use smol::{
        future,
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
        Timer,
    };
    use smol_macros::test;
    use std::{
        cell::RefCell,
        time::{Duration, Instant},
    };

    #[test]
    fn test_url_for() {
        assert_eq!(
            HttpNotifier::default().url_for(HostAction::Finish),
            "https://progressbar/FinishAction"
        );
        assert_eq!(
            HttpNotifier::new("http://127.0.0.1:3000/nui/").url_for(HostAction::Finish),
            "http://127.0.0.1:3000/nui/FinishAction"
        );
    }

    #[test]
    fn test_closure_notifier() {
        let actions = RefCell::new(Vec::new());
        let notifier = |action: HostAction| actions.borrow_mut().push(action);
        notifier.post_action(HostAction::Finish);
        assert_eq!(*actions.borrow(), vec![HostAction::Finish]);
    }

    struct Request {
        head: String,
        body: Vec<u8>,
    }

    async fn read_request(stream: &mut TcpStream) -> std::io::Result<Request> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let head_len = loop {
            if let Some(i) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break i + 4;
            }
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(std::io::ErrorKind::UnexpectedEof.into());
            }
            buf.extend_from_slice(&chunk[..n]);
        };
        let head = String::from_utf8_lossy(&buf[..head_len]).to_lowercase();
        let content_length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|len| len.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < head_len + content_length {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(std::io::ErrorKind::UnexpectedEof.into());
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        Ok(Request {
            head: String::from_utf8_lossy(&buf[..head_len]).into_owned(),
            body: buf[head_len..head_len + content_length].to_vec(),
        })
    }

    #[apply(test!)]
    async fn test_posts_empty_object_to_action_url() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let notifier = HttpNotifier::new(format!("http://{}/callbacks/", addr));
        notifier.post_action(HostAction::Finish);

        let request = future::or(
            async {
                let (mut stream, _) = listener.accept().await.unwrap();
                let request = read_request(&mut stream).await.unwrap();
                stream
                    .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n")
                    .await
                    .unwrap();
                stream.flush().await.unwrap();
                Some(request)
            },
            async {
                Timer::after(Duration::from_secs(5)).await;
                None
            },
        )
        .await
        .expect("no request reached the host");

        assert!(
            request
                .head
                .starts_with("POST /callbacks/FinishAction HTTP/1.1\r\n"),
            "{}",
            request.head
        );
        assert!(
            request
                .head
                .to_lowercase()
                .contains("content-type: application/json"),
            "{}",
            request.head
        );
        assert_eq!(request.body, b"{}");
    }

    #[apply(test!)]
    async fn test_failed_notification_is_swallowed() {
        // Grab a free port, then close it so the connection is refused.
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let endpoint = format!("http://{}", addr);
        let notifier = HttpNotifier::new(&endpoint);

        let started = Instant::now();
        notifier.post_action(HostAction::Finish);
        notifier.post_action(HostAction::Finish);
        assert!(started.elapsed() < Duration::from_millis(100));

        // Give the detached requests time to fail in the background.
        Timer::after(Duration::from_millis(50)).await;
        assert_eq!(
            notifier.url_for(HostAction::Finish),
            format!("{}/FinishAction", endpoint)
        );
    }
}
