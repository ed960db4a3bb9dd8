//! 推送通道事件

use serde::{Deserialize, Serialize};

use super::model::Notification;

/// 推送通道收到的帧，按 `type` 区分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    /// 新通知，附带服务端权威未读数
    NewNotification {
        notification: Notification,
        unread_count: u64,
    },
    /// 本客户端不处理的类型
    #[serde(other)]
    Unknown,
}

impl PushEvent {
    /// 解析文本帧
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
