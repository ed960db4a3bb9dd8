//! Fetch gateway - 通知相关的 REST 调用

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::notification::{Notification, NotificationPage, UnreadCount};
use crate::session::Session;

/// 与后端通信的错误
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl GatewayError {
    /// 后端拒绝了凭证
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GatewayError::Status { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }
}

/// 客户端依赖的后端操作
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// 最近的通知，新的在前
    async fn recent(&self, size: usize) -> Result<Vec<Notification>, GatewayError>;

    async fn unread_count(&self) -> Result<u64, GatewayError>;

    async fn mark_read(&self, id: &str) -> Result<(), GatewayError>;

    async fn mark_all_read(&self) -> Result<(), GatewayError>;

    /// 并发拉取列表和未读数
    async fn snapshot(&self, size: usize) -> Result<(Vec<Notification>, u64), GatewayError> {
        tokio::try_join!(self.recent(size), self.unread_count())
    }
}

/// [`NotificationApi`] 的 HTTP 实现
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpGateway {
    pub fn new(base_url: &str, session: &Session, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: session.token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "Backend request");
        self.client.request(method, url).bearer_auth(&self.token)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, GatewayError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(%status, body = %body, "Backend request rejected");
        Err(GatewayError::Status { status, body })
    }
}

#[async_trait]
impl NotificationApi for HttpGateway {
    async fn recent(&self, size: usize) -> Result<Vec<Notification>, GatewayError> {
        let builder = self
            .request(Method::GET, "/notifications")
            .query(&[("size", size)]);
        let page: NotificationPage = self
            .send(builder)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        Ok(page.into_items())
    }

    async fn unread_count(&self) -> Result<u64, GatewayError> {
        let builder = self.request(Method::GET, "/notifications/unread-count");
        let body: UnreadCount = self
            .send(builder)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        Ok(body.count)
    }

    async fn mark_read(&self, id: &str) -> Result<(), GatewayError> {
        let path = format!("/notifications/{}/read", encode_segment(id));
        self.send(self.request(Method::PATCH, &path)).await?;
        Ok(())
    }

    async fn mark_all_read(&self) -> Result<(), GatewayError> {
        self.send(self.request(Method::PATCH, "/notifications/read-all"))
            .await?;
        Ok(())
    }
}

/// 对单个路径段做百分号编码
fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let session = Session::new("u1", "tok").unwrap();
        let gateway =
            HttpGateway::new("http://localhost:8000/api/v1/", &session, Duration::from_secs(1)).unwrap();
        assert_eq!(gateway.base_url(), "http://localhost:8000/api/v1");
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("abc-123"), "abc-123");
        assert_eq!(encode_segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn test_unauthorized_detection() {
        let err = GatewayError::Status {
            status: StatusCode::UNAUTHORIZED,
            body: String::new(),
        };
        assert!(err.is_unauthorized());
        let err = GatewayError::Decode("x".to_string());
        assert!(!err.is_unauthorized());
    }
}
