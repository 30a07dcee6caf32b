//! scanwatch - drives a remote web vulnerability scanning service
//!
//! Authenticates against the service, launches a scan of one target URL, waits
//! for it to finish, fetches the results and reduces them to the high-severity
//! findings.

pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod pipeline;
pub mod report;
