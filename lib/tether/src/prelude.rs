//! Prelude module for convenient imports.
//!
//! ```ignore
//! use tether::prelude::*;
//! ```

pub use crate::{
    ChainEnd, ClientConfig, Error, HyperTransport, Interceptor, Method, Request, Response, Result,
    StatusCode, Transport,
};
pub use url::Url;
