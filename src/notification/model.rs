//! 后端返回的通知记录

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    TaskAssigned,
    EventStatusChange,
    RegistrationUpdate,
    /// 尚未识别的类型
    #[serde(other)]
    Other,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::TaskAssigned => "task_assigned",
            NotificationType::EventStatusChange => "event_status_change",
            NotificationType::RegistrationUpdate => "registration_update",
            NotificationType::Other => "other",
        }
    }
}

/// 当前用户的一条通知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    /// 指向触发该通知的活动页面
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// `GET /notifications` 的响应体。后端既返回过裸数组，
/// 也返回过分页包装，两种都接受。
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NotificationPage {
    List(Vec<Notification>),
    Paged {
        #[serde(alias = "data", alias = "notifications")]
        items: Vec<Notification>,
    },
}

impl NotificationPage {
    pub fn into_items(self) -> Vec<Notification> {
        match self {
            NotificationPage::List(items) => items,
            NotificationPage::Paged { items } => items,
        }
    }
}

/// `GET /notifications/unread-count` 的响应体
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UnreadCount {
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_type() {
        let json = r#"{"id":"n1","type":"task_assigned","title":"New task","message":"Set up chairs","link":"/events/7","is_read":false,"created_at":"2026-03-01T10:00:00Z"}"#;
        let n: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(n.kind, NotificationType::TaskAssigned);
        assert_eq!(n.link.as_deref(), Some("/events/7"));
        assert!(!n.is_read);
    }

    #[test]
    fn test_unknown_type_falls_back_to_other() {
        let json = r#"{"id":"n2","type":"budget_alert","title":"t","message":"m","is_read":true,"created_at":"2026-03-01T10:00:00Z"}"#;
        let n: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(n.kind, NotificationType::Other);
        assert!(n.link.is_none());
    }

    #[test]
    fn test_page_accepts_array_and_envelope() {
        let item = r#"{"id":"a","type":"registration_update","title":"t","message":"m","is_read":false,"created_at":"2026-03-01T10:00:00Z"}"#;

        let bare: NotificationPage = serde_json::from_str(&format!("[{}]", item)).unwrap();
        assert_eq!(bare.into_items().len(), 1);

        let paged: NotificationPage =
            serde_json::from_str(&format!(r#"{{"items":[{}],"total":1,"page":1,"size":10}}"#, item)).unwrap();
        assert_eq!(paged.into_items()[0].id, "a");

        let data: NotificationPage = serde_json::from_str(&format!(r#"{{"data":[{}]}}"#, item)).unwrap();
        assert_eq!(data.into_items().len(), 1);
    }
}
