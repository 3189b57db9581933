//! Optional wire-level message logging.
//!
//! Purely observational: enabling it never changes what goes on the wire.
//! Events are emitted at DEBUG level with target [`WIRE_TARGET`], so a
//! subscriber must also let that target through for anything to appear.

use crate::message::{method_of, Message};

/// Set to log the `method` field of every message sent and received.
///
/// Ignored when [`DEBUG_PAYLOAD_ENV`] is also set: that variable takes
/// precedence, and its full output already includes the method.
pub const DEBUG_ENV: &str = "PIPEFRAME_DEBUG";
/// Set to log every message sent and received in full.
pub const DEBUG_PAYLOAD_ENV: &str = "PIPEFRAME_DEBUGP";
/// Tracing target used for wire events.
pub const WIRE_TARGET: &str = "pipeframe::wire";

/// How much of each message to log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagnosticsMode {
    #[default]
    Off,
    /// Only the `method` field.
    Method,
    /// The whole message, pretty-printed.
    Full,
}

impl DiagnosticsMode {
    /// Resolve the mode from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `PIPEFRAME_DEBUGP` wins over `PIPEFRAME_DEBUG`; presence is enough.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        if lookup(DEBUG_PAYLOAD_ENV).is_some() {
            DiagnosticsMode::Full
        } else if lookup(DEBUG_ENV).is_some() {
            DiagnosticsMode::Method
        } else {
            DiagnosticsMode::Off
        }
    }

    pub fn is_enabled(self) -> bool {
        self != DiagnosticsMode::Off
    }
}

/// Direction of a logged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Send,
    Recv,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Send => "SEND",
            Direction::Recv => "RECV",
        }
    }
}

/// Log a decoded message according to `mode`.
pub fn log_message(mode: DiagnosticsMode, direction: Direction, message: &Message) {
    match mode {
        DiagnosticsMode::Off => {}
        DiagnosticsMode::Method => {
            tracing::debug!(
                target: WIRE_TARGET,
                direction = direction.as_str(),
                method = method_of(message).unwrap_or("<none>"),
                "message"
            );
        }
        DiagnosticsMode::Full => {
            let body = serde_json::to_string_pretty(message)
                .unwrap_or_else(|_| message.to_string());
            tracing::debug!(
                target: WIRE_TARGET,
                direction = direction.as_str(),
                method = method_of(message).unwrap_or("<none>"),
                body = %body,
                "message"
            );
        }
    }
}

/// Log an already-encoded payload. Only parses it when logging is enabled.
pub fn log_payload(mode: DiagnosticsMode, direction: Direction, payload: &[u8]) {
    if !mode.is_enabled() {
        return;
    }
    match serde_json::from_slice::<Message>(payload) {
        Ok(message) => log_message(mode, direction, &message),
        Err(_) => {
            tracing::debug!(
                target: WIRE_TARGET,
                direction = direction.as_str(),
                size = payload.len(),
                "unparseable payload"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn mode_from_environment() {
        assert_eq!(DiagnosticsMode::from_lookup(lookup(&[])), DiagnosticsMode::Off);
        assert_eq!(
            DiagnosticsMode::from_lookup(lookup(&[(DEBUG_ENV, "1")])),
            DiagnosticsMode::Method
        );
        assert_eq!(
            DiagnosticsMode::from_lookup(lookup(&[(DEBUG_ENV, "1"), (DEBUG_PAYLOAD_ENV, "")])),
            DiagnosticsMode::Full
        );
    }

    #[test]
    fn logging_without_subscriber_is_harmless() {
        let message = serde_json::json!({"method": "ping"});
        log_message(DiagnosticsMode::Full, Direction::Recv, &message);
        log_payload(DiagnosticsMode::Method, Direction::Send, b"not json");
        log_payload(DiagnosticsMode::Off, Direction::Send, b"{}");
    }
}
