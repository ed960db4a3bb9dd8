//! 通知客户端 - 单个会话的 store、gateway 与推送通道
//!
//! 用户操作先提交后端，确认成功后才修改 store；
//! 调用失败时 store 保持原样。

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::gateway::{GatewayError, HttpGateway, NotificationApi};
use crate::notification::{NotificationStore, SharedStore};
use crate::realtime::{
    ChannelError, ChannelEvent, ChannelHandle, PushConnector, RealtimeChannel, ReconnectPolicy,
    WebSocketConnector,
};
use crate::session::Session;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

pub struct NotificationClient {
    config: ClientConfig,
    session: Session,
    store: SharedStore,
    api: Arc<dyn NotificationApi>,
    connector: Arc<dyn PushConnector>,
    channel: Option<ChannelHandle>,
    events: Option<mpsc::UnboundedSender<ChannelEvent>>,
}

impl NotificationClient {
    pub fn new(
        config: ClientConfig,
        session: Session,
        api: Arc<dyn NotificationApi>,
        connector: Arc<dyn PushConnector>,
    ) -> Self {
        let store = SharedStore::new(NotificationStore::new(
            session.user_id.clone(),
            config.window_size,
        ));
        Self {
            config,
            session,
            store,
            api,
            connector,
            channel: None,
            events: None,
        }
    }

    /// 使用 HTTP gateway 和 WebSocket 传输的客户端
    pub fn with_http(config: ClientConfig, session: Session) -> Result<Self, ClientError> {
        let gateway = HttpGateway::new(&config.api_url, &session, config.request_timeout())?;
        Ok(Self::new(
            config,
            session,
            Arc::new(gateway),
            Arc::new(WebSocketConnector::new()),
        ))
    }

    /// 通道进度转发到 `tx`，下次 `start` 时生效
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<ChannelEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// 打开推送通道，第一轮连接即完成初始加载
    pub fn start(&mut self) -> Result<(), ClientError> {
        if self.channel.is_some() {
            return Ok(());
        }

        let mut channel = RealtimeChannel::new(
            &self.config.api_url,
            &self.session,
            self.store.clone(),
            self.api.clone(),
            self.connector.clone(),
            ReconnectPolicy::from(&self.config.reconnect),
        )?
        .with_timeouts(self.config.request_timeout(), self.config.heartbeat());
        if let Some(tx) = &self.events {
            channel = channel.with_events(tx.clone());
        }

        info!(user_id = %self.session.user_id, "Starting notification client");
        self.channel = Some(channel.spawn());
        Ok(())
    }

    /// 关闭推送通道，不再重连
    pub async fn stop(&mut self) {
        if let Some(channel) = self.channel.take() {
            info!(user_id = %self.session.user_id, "Stopping notification client");
            channel.shutdown().await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.channel.as_ref().is_some_and(|c| !c.is_finished())
    }

    /// 丢弃当前用户的全部状态，为新 `session` 重新开始
    pub async fn switch_session(
        &mut self,
        session: Session,
        api: Arc<dyn NotificationApi>,
    ) -> Result<(), ClientError> {
        let was_running = self.channel.is_some();
        self.stop().await;

        info!(from = %self.session.user_id, to = %session.user_id, "Switching session");
        self.store = SharedStore::new(NotificationStore::new(
            session.user_id.clone(),
            self.config.window_size,
        ));
        self.session = session;
        self.api = api;

        if was_running {
            self.start()?;
        }
        Ok(())
    }

    /// 重新拉取最近通知和未读数
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let (notifications, unread_count) = self
            .api
            .snapshot(self.config.window_size)
            .await
            .inspect_err(|e| warn!(error = %e, "Notification refresh failed"))?;
        self.store.with(|s| s.load(notifications, unread_count));
        Ok(())
    }

    /// 标记单条已读，返回本地未读数是否变化
    pub async fn mark_read(&self, id: &str) -> Result<bool, ClientError> {
        self.api
            .mark_read(id)
            .await
            .inspect_err(|e| warn!(notification_id = %id, error = %e, "Mark read failed"))?;
        Ok(self.store.with(|s| s.mark_read(id)))
    }

    pub async fn mark_all_read(&self) -> Result<(), ClientError> {
        self.api
            .mark_all_read()
            .await
            .inspect_err(|e| warn!(error = %e, "Mark all read failed"))?;
        self.store.with(|s| s.mark_all_read());
        Ok(())
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}
