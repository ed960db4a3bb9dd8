//! 实时通道 - 每个登录用户一条推送连接
//!
//! 连接由 run 循环独占，每一轮：
//! 1. 并发拉取快照、建立 socket（握手有超时）
//! 2. 快照写入 store 后开始读帧
//! 3. 任何原因断开后等待策略给出的间隔，再来一轮
//!
//! 连接空闲满一个心跳周期就发 ping，再过一个周期仍无任何帧则视为断线。
//! 每个 await 点都检查 shutdown；主动 shutdown 会关闭 socket 并退出，不再重连。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use super::address::push_url;
use super::connector::{PushConnection, PushConnector, PushFrame};
use super::error::ChannelError;
use super::policy::ReconnectPolicy;
use crate::config::{DEFAULT_HEARTBEAT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::gateway::{GatewayError, NotificationApi};
use crate::notification::{Notification, PushEvent, SharedStore};
use crate::session::Session;

/// 通道进度，供展示层（和测试）观察
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// 即将建立连接，首次为 0
    Connecting { attempt: u32 },
    Connected { attempt: u32 },
    SnapshotLoaded { count: usize, unread_count: u64 },
    SnapshotFailed { error: String },
    /// 推送的通知已合并进 store
    Notification(Notification),
    Disconnected { reason: String },
    ReconnectScheduled { attempt: u32, delay: Duration },
    /// 达到重连上限
    GaveUp { attempts: u32 },
    Stopped,
}

/// 只读推送通道，写入 [`SharedStore`]
pub struct RealtimeChannel {
    url: Url,
    user_id: String,
    window_size: usize,
    store: SharedStore,
    api: Arc<dyn NotificationApi>,
    connector: Arc<dyn PushConnector>,
    policy: ReconnectPolicy,
    connect_timeout: Duration,
    heartbeat: Duration,
    events: Option<mpsc::UnboundedSender<ChannelEvent>>,
}

impl RealtimeChannel {
    pub fn new(
        api_url: &str,
        session: &Session,
        store: SharedStore,
        api: Arc<dyn NotificationApi>,
        connector: Arc<dyn PushConnector>,
        policy: ReconnectPolicy,
    ) -> Result<Self, ChannelError> {
        let url = push_url(api_url, session)?;
        let window_size = store.with(|s| s.capacity());
        Ok(Self {
            url,
            user_id: session.user_id.clone(),
            window_size,
            store,
            api,
            connector,
            policy,
            connect_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            heartbeat: Duration::from_secs(DEFAULT_HEARTBEAT_SECS),
            events: None,
        })
    }

    /// 进度事件发往 `tx`
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<ChannelEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// 握手超时与心跳周期
    pub fn with_timeouts(mut self, connect_timeout: Duration, heartbeat: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.heartbeat = heartbeat;
        self
    }

    /// 在当前 runtime 上启动 run 循环
    pub fn spawn(self) -> ChannelHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(shutdown_rx));
        ChannelHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    /// 运行到收到 shutdown、handle 被丢弃或达到重连上限
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut retries: u32 = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.emit(ChannelEvent::Connecting { attempt: retries });
            info!(user_id = %self.user_id, attempt = retries, "Opening push channel");

            let setup = async {
                tokio::join!(self.api.snapshot(self.window_size), self.connect())
            };
            let (snapshot, connection) = tokio::select! {
                _ = shutdown_requested(&mut shutdown) => break,
                result = setup => result,
            };

            self.apply_snapshot(snapshot);

            let reason = match connection {
                Ok(mut conn) => {
                    info!(user_id = %self.user_id, "Push channel connected");
                    self.emit(ChannelEvent::Connected { attempt: retries });
                    retries = 0;

                    let outcome = tokio::select! {
                        _ = shutdown_requested(&mut shutdown) => None,
                        reason = self.pump(conn.as_mut()) => Some(reason),
                    };
                    match outcome {
                        Some(reason) => reason,
                        None => {
                            conn.close().await;
                            break;
                        }
                    }
                }
                Err(e) => {
                    warn!(user_id = %self.user_id, error = %e, "Push channel connect failed");
                    e.to_string()
                }
            };

            info!(user_id = %self.user_id, reason = %reason, "Push channel closed");
            self.emit(ChannelEvent::Disconnected { reason });

            retries = retries.saturating_add(1);
            let Some(delay) = self.policy.next_delay(retries) else {
                warn!(user_id = %self.user_id, attempts = retries - 1, "Giving up on push channel");
                self.emit(ChannelEvent::GaveUp { attempts: retries - 1 });
                return;
            };

            debug!(user_id = %self.user_id, attempt = retries, delay_ms = delay.as_millis() as u64, "Reconnect scheduled");
            self.emit(ChannelEvent::ReconnectScheduled { attempt: retries, delay });

            tokio::select! {
                _ = shutdown_requested(&mut shutdown) => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!(user_id = %self.user_id, "Push channel stopped");
        self.emit(ChannelEvent::Stopped);
    }

    /// 建立连接；握手卡住超过 `connect_timeout` 按连接失败处理
    async fn connect(&self) -> Result<Box<dyn PushConnection>, ChannelError> {
        match tokio::time::timeout(self.connect_timeout, self.connector.connect(&self.url)).await {
            Ok(result) => result,
            Err(_) => Err(ChannelError::Connect(format!(
                "handshake timed out after {}s",
                self.connect_timeout.as_secs_f32()
            ))),
        }
    }

    /// 读帧直到连接结束，返回结束原因
    async fn pump(&self, conn: &mut dyn PushConnection) -> String {
        let mut awaiting_pong = false;

        loop {
            match tokio::time::timeout(self.heartbeat, conn.next_frame()).await {
                Ok(Some(Ok(frame))) => {
                    awaiting_pong = false;
                    if let PushFrame::Text(text) = frame {
                        self.handle_frame(&text);
                    }
                }
                Ok(Some(Err(e))) => {
                    warn!(user_id = %self.user_id, error = %e, "Push channel error");
                    return e.to_string();
                }
                Ok(None) => return "closed by server".to_string(),
                Err(_) if awaiting_pong => {
                    warn!(user_id = %self.user_id, "Push channel heartbeat timed out");
                    return "heartbeat timed out".to_string();
                }
                Err(_) => {
                    debug!(user_id = %self.user_id, "Push channel idle, sending ping");
                    if let Err(e) = conn.ping().await {
                        warn!(user_id = %self.user_id, error = %e, "Push channel ping failed");
                        return e.to_string();
                    }
                    awaiting_pong = true;
                }
            }
        }
    }

    /// 合并一条文本帧。坏帧只记日志，不断开连接。
    pub fn handle_frame(&self, text: &str) {
        match PushEvent::parse(text) {
            Ok(PushEvent::NewNotification {
                notification,
                unread_count,
            }) => {
                debug!(
                    user_id = %self.user_id,
                    notification_id = %notification.id,
                    unread_count,
                    "New notification pushed"
                );
                self.store
                    .with(|s| s.prepend_and_cap(notification.clone(), unread_count));
                self.emit(ChannelEvent::Notification(notification));
            }
            Ok(PushEvent::Unknown) => {
                debug!(user_id = %self.user_id, "Ignoring unhandled push event");
            }
            Err(e) => {
                warn!(user_id = %self.user_id, error = %e, "Malformed push payload");
            }
        }
    }

    fn apply_snapshot(&self, snapshot: Result<(Vec<Notification>, u64), GatewayError>) {
        match snapshot {
            Ok((notifications, unread_count)) => {
                let count = notifications.len();
                self.store.with(|s| s.load(notifications, unread_count));
                debug!(user_id = %self.user_id, count, unread_count, "Snapshot loaded");
                self.emit(ChannelEvent::SnapshotLoaded {
                    count,
                    unread_count,
                });
            }
            Err(e) => {
                warn!(user_id = %self.user_id, error = %e, "Snapshot fetch failed");
                self.emit(ChannelEvent::SnapshotFailed {
                    error: e.to_string(),
                });
            }
        }
    }

    fn emit(&self, event: ChannelEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// 已启动通道的句柄，丢弃它同样会停止通道
pub struct ChannelHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ChannelHandle {
    /// 关闭连接并等待循环退出，之后不会再重连
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Push channel task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// 收到 shutdown 信号或发送端已丢弃时返回
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}
