//! Apvd Client - HTTP gateway to the analytics platform
//!
//! This crate provides:
//! - `ApvdHttpClient`: authenticated JSON client with server failover
//! - `HttpGateway`: every repository trait implemented over the platform's REST API

pub mod error;
pub mod gateway;
pub mod http;
pub mod import;

pub use error::{ClientError, Result};
pub use gateway::HttpGateway;
pub use http::{ApvdHttpClient, HttpClientConfig};
