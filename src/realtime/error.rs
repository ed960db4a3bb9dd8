//! 推送通道错误

use thiserror::Error;

use super::address::PushUrlError;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error(transparent)]
    Address(#[from] PushUrlError),

    #[error("connect failed: {0}")]
    Connect(String),

    #[error("socket error: {0}")]
    Socket(String),
}
