//! CLI 命令的输出格式化

use chrono::Utc;
use serde::Serialize;

use crate::notification::{format_store, Notification, NotificationStore};

/// 格式化 JSON，序列化失败时输出 `{}`
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

/// store 的 JSON 视图
#[derive(Debug, Serialize)]
pub struct StoreOutput<'a> {
    pub user_id: &'a str,
    pub unread_count: u64,
    pub notifications: &'a [Notification],
}

impl<'a> StoreOutput<'a> {
    pub fn new(store: &'a NotificationStore) -> Self {
        Self {
            user_id: store.owner(),
            unread_count: store.unread_count(),
            notifications: store.notifications(),
        }
    }
}

/// 按 --json 输出 JSON 或文本列表
pub fn format_output(store: &NotificationStore, json: bool) -> String {
    if json {
        format_json(&StoreOutput::new(store))
    } else {
        format_store(store, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_output_shape() {
        let store = NotificationStore::new("u1", 10);
        let out = format_output(&store, true);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["user_id"], "u1");
        assert_eq!(value["unread_count"], 0);
        assert!(value["notifications"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_text_output() {
        let store = NotificationStore::new("u1", 10);
        assert!(format_output(&store, false).starts_with("Notifications (0 unread)"));
    }
}
