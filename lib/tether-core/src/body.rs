//! JSON body helpers.

use bytes::Bytes;

use crate::Result;

/// MIME type used for JSON bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Serialize a value to JSON bytes.
///
/// # Example
///
/// ```
/// use tether_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Login { user: String }
///
/// let bytes = to_json(&Login { user: "alice".to_string() }).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"user":"alice"}"#);
/// ```
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Deserialize JSON bytes, reporting the failing path on error.
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct Session {
        user: User,
    }

    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct User {
        id: u64,
    }

    #[test]
    fn from_json_ok() {
        let session: Session = from_json(br#"{"user":{"id":7}}"#).expect("decode");
        assert_eq!(session, Session { user: User { id: 7 } });
    }

    #[test]
    fn from_json_reports_path() {
        let err = from_json::<Session>(br#"{"user":{"id":"seven"}}"#).expect_err("type mismatch");
        match err {
            crate::Error::JsonDeserialization { path, .. } => assert_eq!(path, "user.id"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
