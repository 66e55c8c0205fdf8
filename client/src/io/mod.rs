//! HTTP plumbing: transport trait, error type and the typed API client.

pub mod api;
pub mod http;

#[cfg(test)]
pub mod test_utils;

pub use api::{ApiClient, LedgerKind};
pub use http::{
    ApiError, HttpRequest, HttpResponse, HttpTransport, InitDataSource, Method, NoInitData,
    INIT_DATA_HEADER,
};
