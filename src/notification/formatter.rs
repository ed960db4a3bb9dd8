//! 通知列表的文本渲染

use chrono::{DateTime, Duration, Utc};

use super::model::{Notification, NotificationType};
use super::store::NotificationStore;

/// 相对时间，如 `5m ago`
pub fn relative_time(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(created_at);

    // 客户端与后端时钟不一致时时间戳可能在未来
    if elapsed < Duration::minutes(1) {
        return "just now".to_string();
    }
    if elapsed < Duration::hours(1) {
        return format!("{}m ago", elapsed.num_minutes());
    }
    if elapsed < Duration::days(1) {
        return format!("{}h ago", elapsed.num_hours());
    }
    if elapsed < Duration::days(7) {
        return format!("{}d ago", elapsed.num_days());
    }
    created_at.format("%Y-%m-%d").to_string()
}

/// 类型简称
pub fn type_label(kind: NotificationType) -> &'static str {
    match kind {
        NotificationType::TaskAssigned => "task",
        NotificationType::EventStatusChange => "event",
        NotificationType::RegistrationUpdate => "registration",
        NotificationType::Other => "notice",
    }
}

/// 单行：`* [task] Title - message (5m ago)`
pub fn format_line(notification: &Notification, now: DateTime<Utc>) -> String {
    let marker = if notification.is_read { ' ' } else { '*' };
    let mut line = format!(
        "{} [{}] {} - {} ({})",
        marker,
        type_label(notification.kind),
        notification.title,
        notification.message,
        relative_time(notification.created_at, now),
    );
    if let Some(link) = &notification.link {
        line.push_str(&format!(" -> {}", link));
    }
    line
}

/// 渲染整个 store，先输出标题行
pub fn format_store(store: &NotificationStore, now: DateTime<Utc>) -> String {
    let mut out = format!("Notifications ({} unread)\n", store.unread_count());
    if store.is_empty() {
        out.push_str("  No notifications yet\n");
        return out;
    }
    for n in store.notifications() {
        out.push_str(&format_line(n, now));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, h, m, 0).unwrap()
    }

    #[test]
    fn test_relative_time_buckets() {
        let now = at(12, 0);
        assert_eq!(relative_time(at(11, 59), now), "1m ago");
        assert_eq!(relative_time(now, now), "just now");
        assert_eq!(relative_time(at(11, 15), now), "45m ago");
        assert_eq!(relative_time(at(9, 0), now), "3h ago");
        assert_eq!(relative_time(now - Duration::days(2), now), "2d ago");
        assert_eq!(relative_time(now - Duration::days(30), now), "2026-02-08");
    }

    #[test]
    fn test_future_timestamp_is_just_now() {
        let now = at(12, 0);
        assert_eq!(relative_time(at(12, 5), now), "just now");
    }

    #[test]
    fn test_format_line_marks_unread_and_link() {
        let n = Notification {
            id: "a".to_string(),
            kind: NotificationType::RegistrationUpdate,
            title: "Registration confirmed".to_string(),
            message: "See you there".to_string(),
            link: Some("/events/9".to_string()),
            is_read: false,
            created_at: at(11, 55),
        };
        assert_eq!(
            format_line(&n, at(12, 0)),
            "* [registration] Registration confirmed - See you there (5m ago) -> /events/9"
        );
    }

    #[test]
    fn test_format_empty_store() {
        let store = NotificationStore::new("u1", 10);
        let out = format_store(&store, at(12, 0));
        assert!(out.contains("0 unread"));
        assert!(out.contains("No notifications yet"));
    }
}
