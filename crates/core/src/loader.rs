//! Infinite-scroll paging.
//!
//! At most one page fetch is outstanding at a time. Every fetch carries a
//! [`FetchTicket`]; a reload bumps the generation so responses to tickets
//! from an earlier generation are discarded on arrival.

use crate::query::PageResponse;
use crate::record::{normalize, RecordStore};

/// Identifies one outstanding page fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    /// 1-based page number
    pub page: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Response belonged to an older generation and was dropped
    Stale,
    Loaded { added: usize, has_more: bool },
}

#[derive(Debug, Clone)]
pub struct PageLoader {
    generation: u64,
    next_page: u32,
    in_flight: Option<FetchTicket>,
    has_more: bool,
    total_items: Option<u64>,
}

impl Default for PageLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PageLoader {
    pub fn new() -> Self {
        Self {
            generation: 0,
            next_page: 1,
            in_flight: None,
            has_more: true,
            total_items: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Total reported by the backend for the current query, if any.
    pub fn total_items(&self) -> Option<u64> {
        self.total_items
    }

    /// Start over at page 1. Outstanding tickets become stale.
    pub fn reset(&mut self) {
        self.invalidate();
        self.next_page = 1;
        self.has_more = true;
        self.total_items = None;
    }

    /// Drop any outstanding fetch without changing paging position.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.in_flight = None;
    }

    /// Claim the next page, unless a fetch is already running or the end has
    /// been reached.
    pub fn begin(&mut self) -> Option<FetchTicket> {
        if self.in_flight.is_some() || !self.has_more {
            return None;
        }
        let ticket = FetchTicket { generation: self.generation, page: self.next_page };
        self.in_flight = Some(ticket);
        log::debug!("fetching page {} (generation {})", ticket.page, ticket.generation);
        Some(ticket)
    }

    /// Merge a page into `store`. Records already held are skipped, and a
    /// page that adds nothing ends paging.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        response: &PageResponse,
        limit: u32,
        store: &mut RecordStore,
    ) -> LoadOutcome {
        if self.in_flight != Some(ticket) {
            log::debug!("discarding stale page {} (generation {})", ticket.page, ticket.generation);
            return LoadOutcome::Stale;
        }
        self.in_flight = None;

        let mut added = 0;
        for raw in &response.items {
            let record = normalize(raw);
            if record.item_id.is_empty() {
                log::debug!("skipping record without item_id");
                continue;
            }
            if store.insert_new(record) {
                added += 1;
            }
        }

        self.has_more = added > 0 && response.has_more(limit);
        self.next_page = ticket.page + 1;
        if let Some(total) = response.total_items() {
            self.total_items = Some(total);
        }
        log::debug!(
            "page {} added {} of {} records, has_more={}",
            ticket.page,
            added,
            response.items.len(),
            self.has_more
        );
        LoadOutcome::Loaded { added, has_more: self.has_more }
    }

    /// Record a failed fetch. Paging stops until the next reset. Returns
    /// false if the ticket was stale.
    pub fn fail(&mut self, ticket: FetchTicket) -> bool {
        if self.in_flight != Some(ticket) {
            return false;
        }
        self.in_flight = None;
        self.has_more = false;
        true
    }
}
