use std::time::Duration;

use pipeframe_frame::FrameConfig;

use crate::diagnostics::DiagnosticsMode;

/// Read timeout in milliseconds, applied to the payload of each frame.
pub const READ_TIMEOUT_ENV: &str = "PIPEFRAME_READ_TIMEOUT_MS";
/// Write timeout in milliseconds, applied to each `send`.
pub const WRITE_TIMEOUT_ENV: &str = "PIPEFRAME_WRITE_TIMEOUT_MS";
/// Maximum payload size in bytes, both directions.
pub const MAX_PAYLOAD_ENV: &str = "PIPEFRAME_MAX_PAYLOAD";

/// What the read loop does with a payload that fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeErrorPolicy {
    /// Stop the read loop with the decode error.
    #[default]
    Fatal,
    /// Log and continue with the next frame. The full declared payload has
    /// already been consumed, so frame alignment is unaffected.
    Skip,
}

/// Controls transport behavior.
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    /// Frame size limits and read chunking.
    pub frame: FrameConfig,
    /// Wire-level message logging.
    pub diagnostics: DiagnosticsMode,
    /// Handling of undecodable inbound payloads.
    pub decode_error_policy: DecodeErrorPolicy,
    /// Bound on receiving a frame's payload once its prefix has arrived.
    /// Idle time between frames is never bounded.
    pub read_timeout: Option<Duration>,
    /// Bound on writing and flushing one frame.
    pub write_timeout: Option<Duration>,
}

impl TransportConfig {
    /// Defaults overlaid with `PIPEFRAME_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`. Unparseable values are
    /// logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self {
            diagnostics: DiagnosticsMode::from_lookup(&lookup),
            ..Self::default()
        };

        if let Some(ms) = parse_var::<u64>(&lookup, READ_TIMEOUT_ENV) {
            config.read_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(ms) = parse_var::<u64>(&lookup, WRITE_TIMEOUT_ENV) {
            config.write_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(max) = parse_var::<usize>(&lookup, MAX_PAYLOAD_ENV) {
            config.frame.max_payload_size = max;
        }

        config
    }

    pub fn with_decode_error_policy(mut self, policy: DecodeErrorPolicy) -> Self {
        self.decode_error_policy = policy;
        self
    }

    pub fn with_diagnostics(mut self, mode: DiagnosticsMode) -> Self {
        self.diagnostics = mode;
        self
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = key, value = %raw, "ignoring invalid environment value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeframe_frame::DEFAULT_MAX_PAYLOAD;

    #[test]
    fn defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.decode_error_policy, DecodeErrorPolicy::Fatal);
        assert_eq!(config.diagnostics, DiagnosticsMode::Off);
        assert_eq!(config.frame.max_payload_size, DEFAULT_MAX_PAYLOAD);
        assert!(config.read_timeout.is_none());
        assert!(config.write_timeout.is_none());
    }

    #[test]
    fn environment_overrides() {
        let config = TransportConfig::from_lookup(|key| match key {
            READ_TIMEOUT_ENV => Some("250".to_string()),
            WRITE_TIMEOUT_ENV => Some(" 1000 ".to_string()),
            MAX_PAYLOAD_ENV => Some("4096".to_string()),
            "PIPEFRAME_DEBUG" => Some("1".to_string()),
            _ => None,
        });

        assert_eq!(config.read_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.write_timeout, Some(Duration::from_secs(1)));
        assert_eq!(config.frame.max_payload_size, 4096);
        assert_eq!(config.diagnostics, DiagnosticsMode::Method);
    }

    #[test]
    fn invalid_values_are_ignored() {
        let config = TransportConfig::from_lookup(|key| match key {
            READ_TIMEOUT_ENV => Some("soon".to_string()),
            _ => None,
        });
        assert!(config.read_timeout.is_none());
    }
}
