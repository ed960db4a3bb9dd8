//! 通知存储 - 最近通知的有界内存缓存
//!
//! 保存单个用户新的在前的通知窗口和未读计数。
//! 计数与列表分开维护：列表只是窗口，
//! 服务端的总数可能超过本地持有的条数。

use std::sync::{Arc, Mutex, MutexGuard};

use super::model::Notification;

/// 默认保留条数
pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// 单个用户的最近通知
#[derive(Debug, Clone)]
pub struct NotificationStore {
    owner: String,
    capacity: usize,
    items: Vec<Notification>,
    unread_count: u64,
}

impl NotificationStore {
    /// 创建属于 `owner` 的空 store，容量为 0 时按 1 处理
    pub fn new(owner: impl Into<String>, capacity: usize) -> Self {
        Self {
            owner: owner.into(),
            capacity: capacity.max(1),
            items: Vec::new(),
            unread_count: 0,
        }
    }

    /// 所属用户
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 用拉取到的快照整体替换列表和计数
    pub fn load(&mut self, notifications: Vec<Notification>, unread_count: u64) {
        self.items = notifications;
        self.items.truncate(self.capacity);
        self.unread_count = unread_count;
    }

    /// 推送的通知插到最前，计数以服务端为准。
    ///
    /// 同 id 的旧条目会先被移除，
    /// 重连后重复投递不会出现两次。
    pub fn prepend_and_cap(&mut self, notification: Notification, authoritative_unread_count: u64) {
        self.items.retain(|n| n.id != notification.id);
        self.items.insert(0, notification);
        self.items.truncate(self.capacity);
        self.unread_count = authoritative_unread_count;
    }

    /// 标记单条已读，计数有变化时返回 `true`
    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(n) if !n.is_read => {
                n.is_read = true;
                self.unread_count = self.unread_count.saturating_sub(1);
                true
            }
            _ => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for n in &mut self.items {
            n.is_read = true;
        }
        self.unread_count = 0;
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.unread_count = 0;
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.items.iter().find(|n| n.id == id)
    }

    pub fn unread_count(&self) -> u64 {
        self.unread_count
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// 推送通道与用户操作共享的句柄
#[derive(Debug, Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<NotificationStore>>,
}

impl SharedStore {
    pub fn new(store: NotificationStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// 独占访问执行 `f`，不要跨 await 持有
    pub fn with<R>(&self, f: impl FnOnce(&mut NotificationStore) -> R) -> R {
        f(&mut self.lock())
    }

    /// 当前状态的副本，用于渲染
    pub fn snapshot(&self) -> NotificationStore {
        self.lock().clone()
    }

    pub fn unread_count(&self) -> u64 {
        self.lock().unread_count()
    }

    fn lock(&self) -> MutexGuard<'_, NotificationStore> {
        // 修改不会留下半写状态
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
