//! Optimistic field edits.
//!
//! An edit is written to the local record immediately and remembered with a
//! snapshot of the value it replaced. When the backend rejects it, the
//! snapshot is restored. Snapshots are taken per edit, so two quick edits of
//! the same field roll back independently.

use serde_json::{Map, Value};

use crate::record::{FieldValue, ProductField, RecordStore};

/// Identifies one optimistic edit until it settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EditId(u64);

impl EditId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// A single-field change in the shape the backend accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub field: ProductField,
    pub value: FieldValue,
}

impl FieldUpdate {
    /// `{ "<backend name>": value }`
    pub fn body(&self) -> Value {
        let mut map = Map::new();
        map.insert(self.field.backend_name(), self.value.to_json());
        Value::Object(map)
    }
}

#[derive(Debug, Clone)]
struct PendingEdit {
    id: EditId,
    item_id: String,
    field: ProductField,
    previous: FieldValue,
    /// The record list was replaced after this edit; nothing to roll back
    orphaned: bool,
}

/// How an edit settled.
#[derive(Debug, Clone, PartialEq)]
pub enum SettleOutcome {
    /// No such pending edit (already settled)
    Unknown,
    Confirmed,
    /// The local record was put back to `restored`
    RolledBack {
        item_id: String,
        field: ProductField,
        restored: FieldValue,
    },
    /// The edit failed but a later edit of the same field is still pending;
    /// that edit now rolls back to this one's snapshot instead
    Superseded { item_id: String, field: ProductField },
    /// The edit was made before the record list was replaced; the outcome is
    /// reported but no local value changes
    Orphaned { item_id: String, field: ProductField },
}

#[derive(Debug, Default)]
pub struct EditLedger {
    next_id: u64,
    pending: Vec<PendingEdit>,
}

impl EditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn has_pending(&self, item_id: &str) -> bool {
        self.pending.iter().any(|e| e.item_id == item_id)
    }

    /// Apply `value` to the held record and return the update to persist.
    ///
    /// The value sent is the one the record ended up holding after type
    /// coercion (for example a blank status becomes `"A"`). Returns `None`
    /// when the record is not held or the field is the immutable id.
    pub fn apply(
        &mut self,
        store: &mut RecordStore,
        item_id: &str,
        field: ProductField,
        value: FieldValue,
    ) -> Option<(EditId, FieldUpdate)> {
        if field == ProductField::ItemId {
            return None;
        }
        let previous = store.update_field(item_id, field, value)?;
        let stored = store.find(item_id)?.get(field);

        self.next_id += 1;
        let id = EditId(self.next_id);
        log::debug!("edit {} on {}.{}: {} -> {}", id.0, item_id, field, previous, stored);
        self.pending.push(PendingEdit {
            id,
            item_id: item_id.to_string(),
            field,
            previous,
            orphaned: false,
        });
        Some((id, FieldUpdate { field, value: stored }))
    }

    /// Settle edit `id`. A failure restores the snapshot unless a later edit
    /// of the same field is still pending.
    pub fn settle(&mut self, store: &mut RecordStore, id: EditId, succeeded: bool) -> SettleOutcome {
        let Some(pos) = self.pending.iter().position(|e| e.id == id) else {
            return SettleOutcome::Unknown;
        };
        let edit = self.pending.remove(pos);

        if succeeded {
            return SettleOutcome::Confirmed;
        }

        if edit.orphaned {
            log::warn!(
                "edit {} on {}.{} failed after the list was reloaded",
                id.0,
                edit.item_id,
                edit.field
            );
            return SettleOutcome::Orphaned { item_id: edit.item_id, field: edit.field };
        }

        // Pending edits keep insertion order, so anything at or after `pos`
        // on the same field was made later.
        if let Some(later) = self.pending[pos..]
            .iter_mut()
            .find(|e| !e.orphaned && e.item_id == edit.item_id && e.field == edit.field)
        {
            later.previous = edit.previous;
            log::warn!(
                "edit {} on {}.{} failed; later edit {} now rolls back to its snapshot",
                id.0,
                edit.item_id,
                edit.field,
                later.id.0
            );
            return SettleOutcome::Superseded { item_id: edit.item_id, field: edit.field };
        }

        store.update_field(&edit.item_id, edit.field, edit.previous.clone());
        log::warn!(
            "edit {} on {}.{} failed; restored {}",
            id.0,
            edit.item_id,
            edit.field,
            edit.previous
        );
        SettleOutcome::RolledBack {
            item_id: edit.item_id,
            field: edit.field,
            restored: edit.previous,
        }
    }

    /// The record list was replaced. Edits still in flight keep their ids so
    /// their outcome can be reported, but lose their rollback snapshots.
    pub fn orphan_all(&mut self) {
        for edit in &mut self.pending {
            edit.orphaned = true;
        }
    }
}
