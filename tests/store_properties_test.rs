use chrono::{TimeZone, Utc};
use gatherly_notify::notification::{Notification, NotificationStore, NotificationType};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Load(Vec<(u8, bool)>, u64),
    Push(u8, bool, u64),
    MarkRead(u8),
    MarkAllRead,
}

fn note(id: u8, is_read: bool) -> Notification {
    Notification {
        id: format!("n{}", id),
        kind: NotificationType::TaskAssigned,
        title: "t".to_string(),
        message: "m".to_string(),
        link: None,
        is_read,
        created_at: Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
    }
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (prop::collection::vec((0u8..20, any::<bool>()), 0..15), 0u64..30)
            .prop_map(|(items, unread)| Op::Load(items, unread)),
        (0u8..20, any::<bool>(), 0u64..30).prop_map(|(id, read, unread)| Op::Push(id, read, unread)),
        (0u8..20).prop_map(Op::MarkRead),
        Just(Op::MarkAllRead),
    ]
}

fn apply(store: &mut NotificationStore, op: &Op) {
    match op {
        Op::Load(items, unread) => {
            store.load(items.iter().map(|(id, read)| note(*id, *read)).collect(), *unread)
        }
        Op::Push(id, read, unread) => store.prepend_and_cap(note(*id, *read), *unread),
        Op::MarkRead(id) => {
            store.mark_read(&format!("n{}", id));
        }
        Op::MarkAllRead => store.mark_all_read(),
    }
}

proptest! {
    #[test]
    fn window_never_exceeds_capacity(cap in 1usize..12, ops in prop::collection::vec(op(), 0..60)) {
        let mut store = NotificationStore::new("u1", cap);
        for op in &ops {
            apply(&mut store, op);
            prop_assert!(store.len() <= cap);
        }
    }

    #[test]
    fn pushes_stay_newest_first(cap in 1usize..12, ids in prop::collection::vec(0u8..200, 1..40)) {
        let mut store = NotificationStore::new("u1", cap);
        for (i, id) in ids.iter().enumerate() {
            store.prepend_and_cap(note(*id, false), i as u64);
        }

        // 期望：到达顺序倒序，后到的重复项胜出，再截断
        let mut expected: Vec<String> = Vec::new();
        for id in ids.iter().rev() {
            let id = format!("n{}", id);
            if !expected.contains(&id) {
                expected.push(id);
            }
        }
        expected.truncate(cap);

        let actual: Vec<String> = store.notifications().iter().map(|n| n.id.clone()).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn mark_read_on_read_or_missing_is_noop(ops in prop::collection::vec(op(), 0..40), target in 0u8..40) {
        let mut store = NotificationStore::new("u1", 10);
        for op in &ops {
            apply(&mut store, op);
        }

        let id = format!("n{}", target);
        let was_unread = store.get(&id).map(|n| !n.is_read).unwrap_or(false);
        let before = store.unread_count();
        let changed = store.mark_read(&id);

        prop_assert_eq!(changed, was_unread);
        if was_unread {
            prop_assert_eq!(store.unread_count(), before.saturating_sub(1));
        } else {
            prop_assert_eq!(store.unread_count(), before);
        }

        // 第二次调用不再改变计数
        let after = store.unread_count();
        prop_assert!(!store.mark_read(&id));
        prop_assert_eq!(store.unread_count(), after);
    }

    #[test]
    fn mark_all_read_always_clears(ops in prop::collection::vec(op(), 0..40)) {
        let mut store = NotificationStore::new("u1", 10);
        for op in &ops {
            apply(&mut store, op);
        }
        store.mark_all_read();
        prop_assert_eq!(store.unread_count(), 0);
        prop_assert!(store.notifications().iter().all(|n| n.is_read));
    }

    #[test]
    fn load_is_idempotent(items in prop::collection::vec((0u8..20, any::<bool>()), 0..15), unread in 0u64..30) {
        let input: Vec<Notification> = items.iter().map(|(id, read)| note(*id, *read)).collect();
        let mut store = NotificationStore::new("u1", 10);

        store.load(input.clone(), unread);
        let first = (store.notifications().to_vec(), store.unread_count());
        store.load(input, unread);
        let second = (store.notifications().to_vec(), store.unread_count());
        prop_assert_eq!(first, second);
    }
}

#[test]
fn example_scenario_end_to_end() {
    let mut store = NotificationStore::new("u1", 10);
    store.load(vec![note(1, false), note(2, true)], 1);
    store.prepend_and_cap(note(3, false), 2);

    let ids: Vec<&str> = store.notifications().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["n3", "n1", "n2"]);
    assert_eq!(store.unread_count(), 2);

    assert!(store.mark_read("n3"));
    assert_eq!(store.unread_count(), 1);
    assert!(store.get("n3").unwrap().is_read);
}
