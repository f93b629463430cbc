//! Prelude module for convenient imports.
//!
//! ```ignore
//! use tether_core::prelude::*;
//! ```

pub use crate::{Error, Method, Request, RequestBuilder, Response, Result, StatusCode, Transport};
