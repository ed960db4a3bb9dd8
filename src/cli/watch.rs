//! `gatherly watch` - 保持连接，实时打印新通知

use anyhow::Result;
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::info;

use super::output::{format_output, StoreOutput};
use crate::client::NotificationClient;
use crate::config::ClientConfig;
use crate::notification::format_line;
use crate::realtime::ChannelEvent;
use crate::session::Session;

pub async fn handle_watch(config: ClientConfig, session: Session, json: bool) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut client = NotificationClient::with_http(config, session)?.with_events(tx);
    client.start()?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, closing push channel");
                break;
            }
            event = rx.recv() => {
                let Some(event) = event else { break };
                let finished = matches!(event, ChannelEvent::GaveUp { .. } | ChannelEvent::Stopped);
                render_event(&client, &event, json);
                if finished {
                    break;
                }
            }
        }
    }

    client.stop().await;
    Ok(())
}

fn render_event(client: &NotificationClient, event: &ChannelEvent, json: bool) {
    match event {
        ChannelEvent::Notification(notification) => {
            if json {
                println!("{}", serde_json::to_string(notification).unwrap_or_default());
            } else {
                println!("{}", format_line(notification, Utc::now()));
                println!("  ({} unread)", client.store().unread_count());
            }
        }
        ChannelEvent::SnapshotLoaded { .. } => {
            let store = client.store().snapshot();
            if json {
                let output = StoreOutput::new(&store);
                println!("{}", serde_json::to_string(&output).unwrap_or_default());
            } else {
                print!("{}", format_output(&store, false));
            }
        }
        other => {
            if json {
                println!("{}", serde_json::json!({ "status": status_line(other) }));
            } else {
                eprintln!("{}", status_line(other));
            }
        }
    }
}

/// 连接状态描述
fn status_line(event: &ChannelEvent) -> String {
    match event {
        ChannelEvent::Connecting { attempt: 0 } => "Connecting...".to_string(),
        ChannelEvent::Connecting { attempt } => format!("Reconnecting (attempt {})...", attempt),
        ChannelEvent::Connected { .. } => "Connected".to_string(),
        ChannelEvent::SnapshotFailed { error } => {
            format!("Notifications temporarily unavailable: {}", error)
        }
        ChannelEvent::Disconnected { reason } => format!("Disconnected: {}", reason),
        ChannelEvent::ReconnectScheduled { delay, .. } => {
            format!("Retrying in {}s", delay.as_secs_f32())
        }
        ChannelEvent::GaveUp { attempts } => format!("Gave up after {} attempts", attempts),
        ChannelEvent::Stopped => "Stopped".to_string(),
        ChannelEvent::SnapshotLoaded { count, unread_count } => {
            format!("Loaded {} notifications ({} unread)", count, unread_count)
        }
        ChannelEvent::Notification(n) => format!("New notification {}", n.id),
    }
}
