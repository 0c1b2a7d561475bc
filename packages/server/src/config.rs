//! Relay configuration.
//!
//! Values come from command-line flags or their `KYODO_*` environment
//! variables (see `bin/server.rs`); zero means "disabled" for the optional
//! limits.

use std::time::Duration;

use crate::{infrastructure::trace::python_tutor::DEFAULT_ENDPOINT, usecase::BrokerSettings};

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// Chat messages kept per room; `None` keeps all of them
    pub history_capacity: Option<usize>,
    /// Rooms left empty this long are evicted; `None` never evicts
    pub room_idle_ttl: Option<Duration>,
    pub eviction_interval: Duration,
    pub trace_service_url: String,
    pub trace_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            history_capacity: None,
            room_idle_ttl: Some(Duration::from_secs(3600)),
            eviction_interval: Duration::from_secs(60),
            trace_service_url: DEFAULT_ENDPOINT.to_string(),
            trace_timeout: Duration::from_secs(20),
        }
    }
}

impl RelayConfig {
    /// Build from raw flag values, mapping zeros to "disabled"
    pub fn from_raw(
        host: String,
        port: u16,
        history_capacity: usize,
        room_idle_ttl_secs: u64,
        eviction_interval_secs: u64,
        trace_service_url: String,
        trace_timeout_secs: u64,
    ) -> Self {
        Self {
            host,
            port,
            history_capacity: (history_capacity > 0).then_some(history_capacity),
            room_idle_ttl: (room_idle_ttl_secs > 0).then(|| Duration::from_secs(room_idle_ttl_secs)),
            eviction_interval: Duration::from_secs(eviction_interval_secs.max(1)),
            trace_service_url,
            trace_timeout: Duration::from_secs(trace_timeout_secs),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn broker_settings(&self) -> BrokerSettings {
        BrokerSettings {
            room_idle_ttl: self.room_idle_ttl,
            eviction_interval: self.eviction_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_values_disable_limits() {
        // テスト項目: 0 を指定した上限値は無効化される
        // when (操作):
        let config = RelayConfig::from_raw(
            "0.0.0.0".to_string(),
            8080,
            0,
            0,
            0,
            DEFAULT_ENDPOINT.to_string(),
            20,
        );

        // then (期待する結果):
        assert_eq!(config.history_capacity, None);
        assert_eq!(config.room_idle_ttl, None);
        assert_eq!(config.eviction_interval, Duration::from_secs(1));
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_positive_values_are_kept() {
        // テスト項目: 正の値はそのまま設定に反映される
        // when (操作):
        let config = RelayConfig::from_raw(
            "127.0.0.1".to_string(),
            3000,
            100,
            600,
            30,
            "http://localhost:9000/web_exec".to_string(),
            5,
        );

        // then (期待する結果):
        assert_eq!(config.history_capacity, Some(100));
        assert_eq!(config.room_idle_ttl, Some(Duration::from_secs(600)));
        assert_eq!(
            config.broker_settings(),
            BrokerSettings {
                room_idle_ttl: Some(Duration::from_secs(600)),
                eviction_interval: Duration::from_secs(30),
            }
        );
        assert_eq!(config.trace_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_default_matches_documented_values() {
        // テスト項目: デフォルト設定がポート 3000、履歴無制限、1 時間の TTL になる
        // when (操作):
        let config = RelayConfig::default();

        // then (期待する結果):
        assert_eq!(config.port, 3000);
        assert_eq!(config.history_capacity, None);
        assert_eq!(config.room_idle_ttl, Some(Duration::from_secs(3600)));
        assert_eq!(config.trace_service_url, "https://pythontutor.com/web_exec");
    }
}
