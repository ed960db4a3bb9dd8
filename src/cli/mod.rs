//! CLI 命令处理

pub mod notifications;
pub mod output;
pub mod session;
pub mod watch;

pub use notifications::*;
pub use output::*;
pub use session::*;
pub use watch::*;
