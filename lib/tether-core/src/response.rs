//! HTTP responses produced by a transport or an interceptor.

use std::collections::HashMap;

use bytes::Bytes;
use http::StatusCode;

/// HTTP response with status, headers, and a buffered body.
#[derive(Debug, Clone)]
pub struct Response<B = Bytes> {
    status: StatusCode,
    headers: HashMap<String, String>,
    body: B,
}

impl<B> Response<B> {
    /// Creates a new response.
    #[must_use]
    pub fn new(status: StatusCode, headers: HashMap<String, String>, body: B) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Mutable access to headers, for interceptors rewriting a response.
    #[must_use]
    pub fn headers_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.headers
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &B {
        &self.body
    }

    /// Consume into body.
    #[must_use]
    pub fn into_body(self) -> B {
        self.body
    }

    /// Status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl Response<Bytes> {
    /// A response with the given status and no headers or body.
    ///
    /// Handy for interceptors that answer a request themselves.
    #[must_use]
    pub fn empty(status: StatusCode) -> Self {
        Self::new(status, HashMap::new(), Bytes::new())
    }

    /// Deserialize the response body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        crate::from_json(&self.body)
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_headers() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "text/plain".to_string());
        let response = Response::new(StatusCode::OK, headers, Bytes::from("pong"));

        assert!(response.is_success());
        assert_eq!(response.header("Content-Type"), Some("text/plain"));
        assert_eq!(response.text().expect("utf-8"), "pong");
    }

    #[test]
    fn empty_response() {
        let response = Response::empty(StatusCode::UNAUTHORIZED);
        assert!(!response.is_success());
        assert!(response.body().is_empty());
        assert!(response.headers().is_empty());
    }

    #[test]
    fn json_body() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct Token {
            value: String,
        }

        let response = Response::new(StatusCode::OK, HashMap::new(), Bytes::from(r#"{"value":"t"}"#));
        let token: Token = response.json().expect("decode");
        assert_eq!(
            token,
            Token {
                value: "t".to_string()
            }
        );
    }
}
