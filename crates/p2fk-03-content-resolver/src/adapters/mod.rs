//! Adapters: HTTP fetchers for gateways and node APIs.

pub mod http;

pub use http::{build_http_client, HttpGatewayFetcher, NodeApiFetcher};
