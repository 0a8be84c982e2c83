//! Cache-aside API dispatcher
//!
//! Builds callable operations from a declarative endpoint registry. Each
//! call resolves its URL from the endpoint's path template, checks the
//! cache, and only performs an HTTP request on a miss; fresh results are
//! written back with the endpoint's TTL.

mod client;
mod endpoint;
mod transport;
mod url;

pub use client::{ApiClient, CallArgs, CallOutcome};
pub use endpoint::{ApiRegistry, Endpoint};
pub use transport::{HttpTransport, ReqwestTransport, TransportError, TransportResponse};
pub use url::{
    format_params_to_string, format_url_with_params, replace_path_params, Params,
};
