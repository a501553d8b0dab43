//! Reachability checks for published URLs.

use std::fmt;
use std::time::Duration;

use reqwest::{Method, StatusCode};

use crate::{ProviderError, link_client};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// 2xx or 3xx after following redirects.
    Reachable(StatusCode),
    /// 4xx or 5xx.
    Broken(StatusCode),
    /// DNS, TLS, connect or timeout failure.
    Unreachable(String),
}

impl LinkStatus {
    #[must_use]
    pub const fn is_reachable(&self) -> bool {
        matches!(self, Self::Reachable(_))
    }

    fn from_status(status: StatusCode) -> Self {
        if status.is_success() || status.is_redirection() {
            Self::Reachable(status)
        } else {
            Self::Broken(status)
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reachable(status) => write!(f, "reachable ({status})"),
            Self::Broken(status) => write!(f, "broken ({status})"),
            Self::Unreachable(reason) => write!(f, "unreachable: {reason}"),
        }
    }
}

pub struct LinkProber {
    http: reqwest::Client,
}

impl LinkProber {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            http: link_client(timeout)?,
        })
    }

    /// HEAD the URL, retrying once with GET when the server rejects HEAD.
    pub async fn probe(&self, url: &str) -> LinkStatus {
        let status = match self.send(Method::HEAD, url).await {
            Ok(status) => status,
            Err(reason) => return LinkStatus::Unreachable(reason),
        };

        if matches!(
            status,
            StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
        ) {
            tracing::debug!(url, status = %status, "HEAD rejected, falling back to GET");
            return match self.send(Method::GET, url).await {
                Ok(status) => LinkStatus::from_status(status),
                Err(reason) => LinkStatus::Unreachable(reason),
            };
        }

        LinkStatus::from_status(status)
    }

    async fn send(&self, method: Method, url: &str) -> Result<StatusCode, String> {
        self.http
            .request(method, url)
            .send()
            .await
            .map(|response| response.status())
            .map_err(|e| {
                tracing::debug!(url, error = %e, "Link probe failed");
                e.to_string()
            })
    }
}
