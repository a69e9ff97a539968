//! The seam between the grid and whatever serves `/api/produtos`.

use std::fmt;

use serde_json::Value;

use crate::grid::{GridEffect, GridEvent};
use crate::query::{PageRequest, PageResponse};

/// A catalog backend. The HTTP client implements this; tests use fakes.
pub trait CatalogBackend {
    type Error: fmt::Display;

    fn fetch_page(&self, request: &PageRequest) -> Result<PageResponse, Self::Error>;

    /// Persist a partial record. Returns the updated raw record when the
    /// server sends one back.
    fn update_product(&self, item_id: &str, body: &Value) -> Result<Option<Value>, Self::Error>;

    fn fetch_product(&self, item_id: &str) -> Result<Value, Self::Error>;
}

/// Run one effect against `backend` and describe the result.
pub fn execute<B: CatalogBackend + ?Sized>(backend: &B, effect: GridEffect) -> GridEvent {
    match effect {
        GridEffect::FetchPage { ticket, request } => match backend.fetch_page(&request) {
            Ok(response) => GridEvent::PageLoaded { ticket, response },
            Err(e) => GridEvent::PageFailed { ticket, message: e.to_string() },
        },
        GridEffect::Persist { edit, item_id, update } => {
            match backend.update_product(&item_id, &update.body()) {
                Ok(_) => GridEvent::Persisted { edit },
                Err(e) => GridEvent::PersistFailed { edit, message: e.to_string() },
            }
        }
        GridEffect::FetchProduct { item_id } => match backend.fetch_product(&item_id) {
            Ok(raw) => GridEvent::ProductFetched { item_id, raw },
            Err(e) => GridEvent::ProductFetchFailed { item_id, message: e.to_string() },
        },
    }
}
