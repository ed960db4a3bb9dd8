//! 推送连接的建立
//!
//! 通道只通过 `PushConnector` / `PushConnection` 访问 socket，
//! 重连循环不关心底层是哪种传输。

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;
use url::Url;

use super::error::ChannelError;

/// 连接上收到的一帧
#[derive(Debug, Clone, PartialEq)]
pub enum PushFrame {
    /// 文本帧，交给 `PushEvent` 解析
    Text(String),
    /// ping/pong 之类的控制帧，只说明连接还活着
    Heartbeat,
}

/// 已建立的只读推送连接
#[async_trait]
pub trait PushConnection: Send {
    /// 下一帧；对端关闭或流结束时返回 `None`
    async fn next_frame(&mut self) -> Option<Result<PushFrame, ChannelError>>;

    /// 探测对端是否还在，应答会以 `PushFrame::Heartbeat` 出现
    async fn ping(&mut self) -> Result<(), ChannelError>;

    /// 主动关闭
    async fn close(&mut self);
}

/// 推送连接工厂
#[async_trait]
pub trait PushConnector: Send + Sync {
    async fn connect(&self, url: &Url) -> Result<Box<dyn PushConnection>, ChannelError>;
}

/// WebSocket 实现
#[derive(Debug, Default, Clone)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PushConnector for WebSocketConnector {
    async fn connect(&self, url: &Url) -> Result<Box<dyn PushConnection>, ChannelError> {
        let (socket, response) = connect_async(url.as_str())
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;
        debug!(status = %response.status(), "Push handshake complete");
        Ok(Box::new(WebSocketConnection { socket }))
    }
}

struct WebSocketConnection {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl PushConnection for WebSocketConnection {
    async fn next_frame(&mut self) -> Option<Result<PushFrame, ChannelError>> {
        while let Some(message) = self.socket.next().await {
            match message {
                Ok(Message::Text(text)) => return Some(Ok(PushFrame::Text(text.as_str().to_owned()))),
                // tungstenite 会自动回 pong
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => return Some(Ok(PushFrame::Heartbeat)),
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "Server closed push channel");
                    return None;
                }
                // 协议里没有二进制帧
                Ok(_) => continue,
                Err(e) => return Some(Err(ChannelError::Socket(e.to_string()))),
            }
        }
        None
    }

    async fn ping(&mut self) -> Result<(), ChannelError> {
        self.socket
            .send(Message::Ping(Default::default()))
            .await
            .map_err(|e| ChannelError::Socket(e.to_string()))
    }

    async fn close(&mut self) {
        if let Err(e) = self.socket.close(None).await {
            debug!(error = %e, "Push channel close handshake failed");
        }
    }
}
