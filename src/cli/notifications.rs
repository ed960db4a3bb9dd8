//! 一次性通知命令：list、unread、read、read-all

use anyhow::{Context, Result};

use super::output::format_output;
use crate::client::NotificationClient;
use crate::config::ClientConfig;
use crate::session::Session;

/// 拉取最新快照并打印
pub async fn handle_list(config: ClientConfig, session: Session, json: bool) -> Result<()> {
    let client = NotificationClient::with_http(config, session)?;
    client
        .refresh()
        .await
        .context("Notifications are temporarily unavailable")?;
    print!("{}", format_output(&client.store().snapshot(), json));
    if json {
        println!();
    }
    Ok(())
}

pub async fn handle_unread(config: ClientConfig, session: Session) -> Result<()> {
    let client = NotificationClient::with_http(config, session)?;
    client
        .refresh()
        .await
        .context("Notifications are temporarily unavailable")?;
    println!("{}", client.store().unread_count());
    Ok(())
}

pub async fn handle_read(config: ClientConfig, session: Session, id: &str) -> Result<()> {
    let client = NotificationClient::with_http(config, session)?;
    client
        .mark_read(id)
        .await
        .with_context(|| format!("Failed to mark {} as read", id))?;
    println!("Marked {} as read", id);
    Ok(())
}

pub async fn handle_read_all(config: ClientConfig, session: Session) -> Result<()> {
    let client = NotificationClient::with_http(config, session)?;
    client
        .mark_all_read()
        .await
        .context("Failed to mark notifications as read")?;
    println!("All notifications marked as read");
    Ok(())
}
