//! 客户端配置
//!
//! 加载顺序（后者覆盖前者）：
//! 1. 内置默认值
//! 2. `~/.config/gatherly/config.json`
//! 3. 环境变量 `GATHERLY_API_URL`
//! 4. 命令行 `--api-url`（由 CLI 应用）

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::notification::DEFAULT_WINDOW_SIZE;

/// 未配置时使用的后端地址
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// 覆盖后端地址的环境变量
pub const API_URL_ENV: &str = "GATHERLY_API_URL";

/// 默认请求超时（秒），也用作 WebSocket 握手超时
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// 默认重连间隔（毫秒）
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5_000;

/// 指数退避的上限（毫秒）
pub const DEFAULT_MAX_RECONNECT_DELAY_MS: u64 = 60_000;

/// 推送连接空闲多久后发 ping（秒）
pub const DEFAULT_HEARTBEAT_SECS: u64 = 30;

/// 重连间隔的变化方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// 固定间隔
    Fixed,
    /// 每次翻倍，不超过 `max_delay_ms`
    Exponential,
}

/// 推送通道的重连设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub strategy: BackoffStrategy,
    pub delay_ms: u64,
    pub max_delay_ms: u64,
    /// `None` 表示一直重试
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            strategy: BackoffStrategy::Fixed,
            delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_RECONNECT_DELAY_MS,
            max_attempts: None,
        }
    }
}

/// 除会话以外客户端需要的全部配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// REST 基础地址，如 `https://api.gatherly.app/api/v1`
    pub api_url: String,
    /// 本地保留的通知条数
    pub window_size: usize,
    pub request_timeout_secs: u64,
    /// 空闲这么久发一次 ping，再等同样时长没有任何帧就判定断线
    pub heartbeat_secs: u64,
    pub reconnect: ReconnectConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            window_size: DEFAULT_WINDOW_SIZE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            heartbeat_secs: DEFAULT_HEARTBEAT_SECS,
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl ClientConfig {
    /// 默认配置文件路径
    pub fn path() -> PathBuf {
        config_dir().join("config.json")
    }

    /// 从默认路径和环境变量加载
    pub fn auto_load() -> Result<Self> {
        let mut config = Self::load_from(&Self::path())?;
        if let Ok(url) = std::env::var(API_URL_ENV) {
            config.apply_api_url(&url);
        }
        Ok(config)
    }

    /// 从文件加载，文件不存在时返回默认值
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        debug!(path = %path.display(), api_url = %config.api_url, "Loaded config");
        Ok(config)
    }

    /// 覆盖后端地址，空白值忽略
    pub fn apply_api_url(&mut self, url: &str) {
        let url = url.trim();
        if !url.is_empty() {
            self.api_url = url.to_string();
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs.max(1))
    }
}

/// `~/.config/gatherly`
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("gatherly")
}
