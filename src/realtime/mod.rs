//! 实时推送通道 - 带自动重连的通知投递

pub mod address;
pub mod channel;
pub mod connector;
pub mod error;
pub mod policy;

pub use address::{push_url, PushUrlError};
pub use channel::{ChannelEvent, ChannelHandle, RealtimeChannel};
pub use connector::{PushConnection, PushConnector, PushFrame, WebSocketConnector};
pub use error::ChannelError;
pub use policy::ReconnectPolicy;
