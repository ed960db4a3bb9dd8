//! Gatherly Notify - Gatherly 活动平台的实时通知客户端

pub mod cli;
pub mod client;
pub mod config;
pub mod gateway;
pub mod notification;
pub mod realtime;
pub mod session;

pub use client::{ClientError, NotificationClient};
pub use config::{BackoffStrategy, ClientConfig, ReconnectConfig};
pub use gateway::{GatewayError, HttpGateway, NotificationApi};
pub use notification::{Notification, NotificationStore, NotificationType, PushEvent, SharedStore};
pub use realtime::{ChannelEvent, ChannelHandle, RealtimeChannel, ReconnectPolicy};
pub use session::{Session, SessionFile};
