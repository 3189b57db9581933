use crate::error::DecodeError;

/// A decoded message. Treated as opaque structured data.
pub type Message = serde_json::Value;

/// The `method` field of a message, if it has a string one.
pub fn method_of(message: &Message) -> Option<&str> {
    message.get("method").and_then(Message::as_str)
}

/// Decode a frame payload: UTF-8 text holding one JSON document.
pub fn decode_message(payload: &[u8]) -> Result<Message, DecodeError> {
    let text = std::str::from_utf8(payload)?;
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_ping() {
        let message = decode_message(br#"{"method":"ping","id":1}"#).unwrap();
        assert_eq!(message, json!({"method": "ping", "id": 1}));
        assert_eq!(method_of(&message), Some("ping"));
    }

    #[test]
    fn method_is_optional() {
        assert_eq!(method_of(&json!({"id": 1})), None);
        assert_eq!(method_of(&json!({"method": 7})), None);
        assert_eq!(method_of(&json!([1, 2])), None);
    }

    #[test]
    fn empty_payload_fails() {
        assert!(matches!(decode_message(b""), Err(DecodeError::Json(_))));
    }

    #[test]
    fn invalid_utf8_fails() {
        assert!(matches!(
            decode_message(&[b'"', 0xFF, b'"']),
            Err(DecodeError::Utf8(_))
        ));
    }

    #[test]
    fn trailing_garbage_fails() {
        assert!(matches!(
            decode_message(b"{} {}"),
            Err(DecodeError::Json(_))
        ));
    }
}
