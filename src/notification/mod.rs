//! 通知数据模型、推送事件与本地 store
//!
//! # 用法
//! ```ignore
//! use gatherly_notify::notification::{NotificationStore, PushEvent};
//!
//! let mut store = NotificationStore::new("user-1", 10);
//! if let PushEvent::NewNotification { notification, unread_count } = PushEvent::parse(text)? {
//!     store.prepend_and_cap(notification, unread_count);
//! }
//! ```

pub mod event;
pub mod formatter;
pub mod model;
pub mod store;

pub use event::PushEvent;
pub use formatter::{format_line, format_store, relative_time, type_label};
pub use model::{Notification, NotificationPage, NotificationType, UnreadCount};
pub use store::{NotificationStore, SharedStore, DEFAULT_WINDOW_SIZE};
