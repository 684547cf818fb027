//! Network access for the strategies.
//!
//! The engine never talks to reqwest directly; it goes through [`Fetcher`]
//! so hosts and tests can substitute their own transport.

mod client;

pub use client::HttpFetcher;

use crate::error::Result;
use crate::models::{Request, Response};
use async_trait::async_trait;
use std::sync::Arc;

/// Performs a network fetch.
///
/// Any HTTP response, whatever its status, is `Ok`; `Err` means the
/// request never produced a response (offline, DNS, connection reset).
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response>;
}

/// Shared fetcher handle.
pub type DynFetcher = Arc<dyn Fetcher>;
