//! Long-lived HTTP session for feed polling.
//!
//! A [`FeedSession`] lazily builds one [`reqwest::Client`] and reuses it
//! for every poll, so connections are pooled across cycles. The session is
//! closed once on shutdown; closing an already closed session does
//! nothing, and using a closed session transparently opens a new one.
//!
//! There is no in-request retry here. A failed request is reported to the
//! caller immediately and the coordinator's backoff controller decides when
//! to try again.

use std::time::Duration;

use crate::FeedError;

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 300;

const USER_AGENT: &str = concat!("aus_emergency/", env!("CARGO_PKG_VERSION"));

/// A lazily created, explicitly closed HTTP client.
#[derive(Debug)]
pub struct FeedSession {
    label: String,
    client: Option<reqwest::Client>,
}

impl FeedSession {
    /// Creates a session that has not opened a client yet.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            client: None,
        }
    }

    /// Whether a client is currently open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.client.is_some()
    }

    fn client(&mut self) -> Result<reqwest::Client, FeedError> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }

        log::debug!("{}: opening HTTP session", self.label);
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        self.client = Some(client.clone());
        Ok(client)
    }

    /// Sends a GET request and returns the response body as text.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] on connection failures, timeouts and
    /// body read failures, and [`FeedError::Status`] for any non-success
    /// status code.
    pub async fn get_text(&mut self, url: &str) -> Result<String, FeedError> {
        let client = self.client()?;
        let response = client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!(
                "{}: HTTP {status} from {url}\n  body preview: {}",
                self.label,
                preview(&body),
            );
            return Err(FeedError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        log::debug!("{}: received {} bytes from {url}", self.label, text.len());
        Ok(text)
    }

    /// Closes the session. Returns `true` if a client was open.
    pub fn close(&mut self) -> bool {
        if self.client.take().is_some() {
            log::debug!("{}: closed HTTP session", self.label);
            true
        } else {
            false
        }
    }
}

fn preview(body: &str) -> &str {
    if body.len() <= BODY_PREVIEW_LEN {
        return body;
    }
    let mut end = BODY_PREVIEW_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_is_idempotent() {
        let mut session = FeedSession::new("test");
        assert!(!session.is_open());
        assert!(!session.close());

        session.client().unwrap();
        assert!(session.is_open());
        assert!(session.close());
        assert!(!session.close());
    }

    #[test]
    fn client_is_reused_until_closed() {
        let mut session = FeedSession::new("test");
        session.client().unwrap();
        session.client().unwrap();
        assert!(session.is_open());
        assert!(session.close());
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(BODY_PREVIEW_LEN);
        let p = preview(&body);
        assert!(p.len() <= BODY_PREVIEW_LEN);
        assert!(body.starts_with(p));
        assert_eq!(preview("short"), "short");
    }
}
