//! Catalog API client.
//!
//! This crate owns the wire contract for `/api/produtos`: page listing,
//! search, single-record reads and partial updates.
//!
//! Blocking only. No retries: a failed call is reported and the caller
//! decides what to do.

mod client;

pub use client::{CatalogClient, ApiError, DEFAULT_TIMEOUT};
