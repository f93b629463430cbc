//! Core types for the tether interceptor chain.
//!
//! - [`Request`] and [`RequestBuilder`] - outgoing requests, with extensions
//!   used as the request's propagation context
//! - [`Response`] - buffered responses
//! - [`Error`] and [`Result`] - error handling
//! - [`Transport`] - the contract for whatever performs the real network call
//! - [`Method`], [`StatusCode`], [`header`] - re-exported from the `http` crate

mod body;
mod error;
pub mod prelude;
mod request;
mod response;
mod transport;

pub use body::{JSON_CONTENT_TYPE, from_json, to_json};
pub use error::{Error, Result};
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use transport::Transport;

// Re-export http crate types for methods, status codes and headers
pub use http::{Extensions, Method, StatusCode, header};
