//! Blocking client for the PolyAnalyst 6 HTTP API.
//!
//! # Overview
//! Lists project nodes, reads execution statistics, and starts or aborts
//! project execution on behalf of an already authenticated session.
//!
//! # Design
//! - `Session` holds the session id and base URL and splits every operation
//!   into `build_*` (produces an `HttpRequest`) and `parse_*` (consumes an
//!   `HttpResponse`), so request shaping and the status policy are tested
//!   without a network.
//! - `Transport` performs the round-trip; `UreqTransport` is the default and
//!   any closure can stand in for it.
//! - `Client` glues the two together and exposes the four operations.
//! - Parameter sets in `params` convert to query/body pairs as pure functions.

pub mod client;
pub mod error;
pub mod http;
pub mod params;
pub mod session;
pub mod transport;
pub mod types;

pub use client::Client;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use params::{FullParams, ProjectExecute, ToFullParams};
pub use session::Session;
pub use transport::{Transport, UreqTransport};
pub use types::{ExecutionStatistics, Node, NodeRef};
