//! HTTP transport for the scanning service

pub mod classify;
pub mod client;
pub use classify::{classify, RemoteFailure};
pub use client::{decode_json, expect_success, ApiClient};
