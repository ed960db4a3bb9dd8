//! 推送通道的重连时机

use std::time::Duration;

use crate::config::{BackoffStrategy, ReconnectConfig};

/// 决定每次重连前等待多久、何时放弃
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    strategy: BackoffStrategy,
    delay: Duration,
    max_delay: Duration,
    max_attempts: Option<u32>,
}

impl ReconnectPolicy {
    /// 固定间隔
    pub fn fixed(delay: Duration) -> Self {
        Self {
            strategy: BackoffStrategy::Fixed,
            delay,
            max_delay: delay,
            max_attempts: None,
        }
    }

    /// 从 `delay` 开始翻倍，不超过 `max_delay`
    pub fn exponential(delay: Duration, max_delay: Duration) -> Self {
        Self {
            strategy: BackoffStrategy::Exponential,
            delay,
            max_delay: max_delay.max(delay),
            max_attempts: None,
        }
    }

    /// 连续重连这么多次后放弃
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// 第 `attempt` 次（从 1 开始）重连前的等待时间，
    /// 超过上限时返回 `None`
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if let Some(max) = self.max_attempts {
            if attempt > max {
                return None;
            }
        }

        let delay = match self.strategy {
            BackoffStrategy::Fixed => self.delay,
            BackoffStrategy::Exponential => {
                let shift = attempt.saturating_sub(1).min(31);
                self.delay
                    .checked_mul(1u32 << shift)
                    .unwrap_or(self.max_delay)
                    .min(self.max_delay)
            }
        };
        Some(delay)
    }

    pub fn base_delay(&self) -> Duration {
        self.delay
    }
}

impl From<&ReconnectConfig> for ReconnectPolicy {
    fn from(config: &ReconnectConfig) -> Self {
        let delay = Duration::from_millis(config.delay_ms);
        let policy = match config.strategy {
            BackoffStrategy::Fixed => Self::fixed(delay),
            BackoffStrategy::Exponential => {
                Self::exponential(delay, Duration::from_millis(config.max_delay_ms))
            }
        };
        match config.max_attempts {
            Some(max) => policy.with_max_attempts(max),
            None => policy,
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from(&ReconnectConfig::default())
    }
}
