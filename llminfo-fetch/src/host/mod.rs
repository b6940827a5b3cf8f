//! Host APIs.
//!
//! - [`http`] - HTTP client with bearer auth, timeout, and status classification

pub mod http;
