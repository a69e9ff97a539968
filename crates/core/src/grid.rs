//! The editable catalog grid.
//!
//! `Grid` owns the record list, the cursor and every edit session. It never
//! performs I/O: operations that need the backend return [`GridEffect`]s, and
//! the host feeds the results back through [`Grid::apply_event`]. All state
//! changes therefore happen on the host's UI thread.

use serde_json::Value;

use crate::cell::{CellAction, CellEditor, CellKey, CommitOutcome, TextBuffer};
use crate::column::{catalog_columns, ColumnSpec};
use crate::loader::{FetchTicket, LoadOutcome, PageLoader};
use crate::navigation::{self, Direction, GridCursor};
use crate::query::{CatalogQuery, PageRequest, PageResponse, SortDirection};
use crate::record::{normalize, FieldValue, ProductField, ProductRecord, RecordStore};
use crate::update::{EditId, EditLedger, FieldUpdate, SettleOutcome};
use crate::window::{compute_window, VirtualWindow, WindowParams};

/// Tuning knobs, normally built from the user's settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    pub page_size: u32,
    pub sort: SortDirection,
    /// Moving down within this many rows of the end fetches the next page
    pub lookahead_rows: usize,
    /// Rows kept between the cursor and the viewport edge
    pub scroll_padding_rows: usize,
    /// Scrolling within this many rows of the bottom fetches the next page
    pub load_more_threshold_rows: usize,
    pub window: WindowParams,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            sort: SortDirection::Asc,
            lookahead_rows: 5,
            scroll_padding_rows: 2,
            load_more_threshold_rows: 10,
            window: WindowParams::default(),
        }
    }
}

/// Work the host must perform on the grid's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEffect {
    FetchPage {
        ticket: FetchTicket,
        request: PageRequest,
    },
    Persist {
        edit: EditId,
        item_id: String,
        update: FieldUpdate,
    },
    FetchProduct {
        item_id: String,
    },
}

/// The result of a [`GridEffect`].
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    PageLoaded { ticket: FetchTicket, response: PageResponse },
    PageFailed { ticket: FetchTicket, message: String },
    Persisted { edit: EditId },
    PersistFailed { edit: EditId, message: String },
    ProductFetched { item_id: String, raw: Value },
    ProductFetchFailed { item_id: String, message: String },
}

/// Where keyboard focus is. The renderer draws focus from this alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Cell(GridCursor),
    StatusBar,
}

#[derive(Debug, Clone)]
struct StatusEditor {
    item_id: String,
    original: String,
    buffer: TextBuffer,
}

pub struct Grid {
    config: GridConfig,
    columns: Vec<ColumnSpec>,
    store: RecordStore,
    /// Indices into `store` that pass the quick filter
    visible: Vec<usize>,
    filter: String,
    query: CatalogQuery,
    cursor: GridCursor,
    editor: CellEditor,
    status_editor: Option<StatusEditor>,
    loader: PageLoader,
    ledger: EditLedger,
    scroll_top: usize,
    viewport_height: usize,
    error: Option<String>,
}

impl Grid {
    pub fn new(config: GridConfig) -> Self {
        Self::with_columns(config, catalog_columns())
    }

    pub fn with_columns(config: GridConfig, columns: Vec<ColumnSpec>) -> Self {
        let col = navigation::first_editable(&columns).unwrap_or(0);
        Self {
            config,
            columns,
            store: RecordStore::new(),
            visible: Vec::new(),
            filter: String::new(),
            query: CatalogQuery::All,
            cursor: GridCursor::new(0, col),
            editor: CellEditor::new(),
            status_editor: None,
            loader: PageLoader::new(),
            ledger: EditLedger::new(),
            scroll_top: 0,
            viewport_height: 0,
            error: None,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn query(&self) -> &CatalogQuery {
        &self.query
    }

    pub fn sort(&self) -> SortDirection {
        self.config.sort
    }

    /// Rows currently shown (after the quick filter).
    pub fn record_count(&self) -> usize {
        self.visible.len()
    }

    /// Records held, filtered or not.
    pub fn loaded_count(&self) -> usize {
        self.store.len()
    }

    pub fn total_items(&self) -> Option<u64> {
        self.loader.total_items()
    }

    pub fn record_at(&self, row: usize) -> Option<&ProductRecord> {
        self.visible.get(row).and_then(|&i| self.store.get(i))
    }

    pub fn find_record(&self, item_id: &str) -> Option<&ProductRecord> {
        self.store.find(item_id)
    }

    /// The record under the cursor.
    pub fn selected_record(&self) -> Option<&ProductRecord> {
        self.record_at(self.cursor.row)
    }

    pub fn cursor(&self) -> GridCursor {
        self.cursor
    }

    pub fn focus(&self) -> Focus {
        if self.status_editor.is_some() {
            Focus::StatusBar
        } else {
            Focus::Cell(self.cursor)
        }
    }

    pub fn editor(&self) -> &CellEditor {
        &self.editor
    }

    pub fn is_editing(&self) -> bool {
        self.editor.is_editing() || self.status_editor.is_some()
    }

    /// Buffer of the status-bar description editor, when it is open.
    pub fn status_buffer(&self) -> Option<&TextBuffer> {
        self.status_editor.as_ref().map(|s| &s.buffer)
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    pub fn has_more(&self) -> bool {
        self.loader.has_more()
    }

    pub fn pending_edits(&self) -> usize {
        self.ledger.pending_count()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub fn viewport_height(&self) -> usize {
        self.viewport_height
    }

    /// The slice of rows to render for the current scroll position.
    pub fn window(&self) -> VirtualWindow {
        compute_window(
            self.scroll_top,
            self.viewport_height,
            &self.config.window,
            self.visible.len(),
        )
    }

    // ------------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------------

    /// Replace the list with the first page of `query`.
    pub fn reload(&mut self, query: CatalogQuery) -> Vec<GridEffect> {
        self.editor.cancel();
        self.status_editor = None;
        self.store.clear();
        self.visible.clear();
        self.ledger.orphan_all();
        self.loader.reset();
        self.query = query;
        self.cursor = GridCursor::new(0, self.cursor.col);
        self.scroll_top = 0;
        self.load_more().into_iter().collect()
    }

    /// Flip the sort direction and reload.
    pub fn toggle_sort(&mut self) -> Vec<GridEffect> {
        self.config.sort = self.config.sort.toggled();
        let query = self.query.clone();
        self.reload(query)
    }

    /// Request the next page unless one is in flight or none remain.
    pub fn load_more(&mut self) -> Option<GridEffect> {
        let ticket = self.loader.begin()?;
        Some(GridEffect::FetchPage {
            ticket,
            request: PageRequest {
                query: self.query.clone(),
                page: ticket.page,
                limit: self.config.page_size,
                sort: self.config.sort,
            },
        })
    }

    /// Discard results of anything still in flight (host teardown).
    pub fn detach(&mut self) {
        self.loader.invalidate();
    }

    /// Re-read the selected record from the backend.
    pub fn refresh_selected(&mut self) -> Option<GridEffect> {
        let item_id = self.selected_record()?.item_id.clone();
        Some(GridEffect::FetchProduct { item_id })
    }

    // ------------------------------------------------------------------------
    // Scrolling
    // ------------------------------------------------------------------------

    /// Set the measured viewport height (host units).
    pub fn set_viewport(&mut self, height: usize) -> Vec<GridEffect> {
        self.viewport_height = height;
        self.scroll_top = self.scroll_top.min(self.max_scroll());
        self.ensure_cursor_visible();
        self.maybe_load_more().into_iter().collect()
    }

    pub fn scroll_to(&mut self, offset: usize) -> Vec<GridEffect> {
        self.scroll_top = offset.min(self.max_scroll());
        self.maybe_load_more().into_iter().collect()
    }

    /// Scroll by `rows` rows (negative is up). The cursor does not move.
    pub fn scroll_by(&mut self, rows: isize) -> Vec<GridEffect> {
        let delta = rows.unsigned_abs() * self.config.window.item_height.max(1);
        let offset = if rows < 0 {
            self.scroll_top.saturating_sub(delta)
        } else {
            self.scroll_top + delta
        };
        self.scroll_to(offset)
    }

    fn max_scroll(&self) -> usize {
        let total = self.visible.len() * self.config.window.item_height.max(1);
        total.saturating_sub(self.viewport_height)
    }

    fn ensure_cursor_visible(&mut self) {
        if let Some(top) = navigation::scroll_into_view(
            self.cursor.row,
            self.scroll_top,
            self.viewport_height,
            self.config.window.item_height,
            self.config.scroll_padding_rows,
        ) {
            self.scroll_top = top.min(self.max_scroll());
        }
    }

    // The quick filter only searches what is held, so scrolling a filtered
    // view does not pull more pages.
    fn maybe_load_more(&mut self) -> Option<GridEffect> {
        if !self.filter.is_empty() || self.viewport_height == 0 {
            return None;
        }
        let threshold = self.config.load_more_threshold_rows * self.config.window.item_height.max(1);
        if self
            .window()
            .near_bottom(self.scroll_top, self.viewport_height, threshold)
        {
            self.load_more()
        } else {
            None
        }
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Move the cursor one step. Ignored while an edit is open.
    pub fn move_cursor(&mut self, direction: Direction) -> Vec<GridEffect> {
        if self.is_editing() {
            return Vec::new();
        }
        self.cursor = navigation::step(self.cursor, direction, self.visible.len(), &self.columns);
        self.ensure_cursor_visible();

        let mut effects = Vec::new();
        if direction == Direction::Down
            && navigation::needs_prefetch(
                self.cursor.row,
                self.visible.len(),
                self.config.lookahead_rows,
                self.loader.has_more(),
            )
        {
            effects.extend(self.load_more());
        }
        effects
    }

    /// Point the cursor at a cell directly (mouse). An open edit on another
    /// cell is committed first.
    pub fn set_cursor(&mut self, cursor: GridCursor) -> Vec<GridEffect> {
        if self.visible.is_empty() || self.columns.is_empty() {
            return Vec::new();
        }
        let target = GridCursor::new(
            cursor.row.min(self.visible.len() - 1),
            cursor.col.min(self.columns.len() - 1),
        );
        let mut effects = Vec::new();
        if target != self.cursor {
            effects.extend(self.blur());
        }
        self.cursor = target;
        self.ensure_cursor_visible();
        effects
    }

    /// Mouse click on a cell; `double` starts editing.
    pub fn click(&mut self, cursor: GridCursor, double: bool) -> Vec<GridEffect> {
        let mut effects = self.set_cursor(cursor);
        if double && !self.is_editing() {
            effects.extend(self.handle_key(CellKey::DoubleClick));
        }
        effects
    }

    // ------------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------------

    /// Feed a key to whichever editor has focus.
    pub fn handle_key(&mut self, key: CellKey) -> Vec<GridEffect> {
        if self.status_editor.is_some() {
            return self.handle_status_key(key);
        }

        let Some(column) = self.columns.get(self.cursor.col).cloned() else {
            return Vec::new();
        };
        let Some(value) = self.selected_record().map(|r| r.get(column.field)) else {
            return Vec::new();
        };

        match self.editor.handle_key(key, &value, &column) {
            CellAction::Navigate(direction) => self.move_cursor(direction),
            CellAction::Committed { outcome, then } => {
                let mut effects: Vec<GridEffect> =
                    self.apply_commit(outcome, column.field).into_iter().collect();
                if let Some(direction) = then {
                    effects.extend(self.move_cursor(direction));
                }
                effects
            }
            CellAction::Started | CellAction::Edited | CellAction::Cancelled | CellAction::Ignored => {
                Vec::new()
            }
        }
    }

    /// Commit whatever edit is open, in place.
    pub fn blur(&mut self) -> Vec<GridEffect> {
        if self.status_editor.is_some() {
            return self.handle_status_key(CellKey::Blur);
        }
        if self.editor.is_editing() {
            return self.handle_key(CellKey::Blur);
        }
        Vec::new()
    }

    fn apply_commit(&mut self, outcome: CommitOutcome, field: ProductField) -> Option<GridEffect> {
        match outcome {
            CommitOutcome::Unchanged => None,
            CommitOutcome::Changed(value) => {
                let item_id = self.selected_record()?.item_id.clone();
                self.apply_edit(&item_id, field, value)
            }
            CommitOutcome::Rejected(e) => {
                log::warn!("rejected edit of {}: {}", field, e);
                self.error = Some(e.to_string());
                None
            }
        }
    }

    /// Optimistically set one field and return the persist effect. A record
    /// that is not held is a no-op.
    pub fn apply_edit(&mut self, item_id: &str, field: ProductField, value: FieldValue) -> Option<GridEffect> {
        let (edit, update) = self.ledger.apply(&mut self.store, item_id, field, value)?;
        Some(GridEffect::Persist { edit, item_id: item_id.to_string(), update })
    }

    /// Open the status-bar editor on the selected record's description.
    pub fn begin_status_edit(&mut self) -> bool {
        if self.editor.is_editing() || self.status_editor.is_some() {
            return false;
        }
        let Some(record) = self.selected_record() else {
            return false;
        };
        self.status_editor = Some(StatusEditor {
            item_id: record.item_id.clone(),
            original: record.description.clone(),
            buffer: TextBuffer::new(record.description.clone()),
        });
        true
    }

    fn handle_status_key(&mut self, key: CellKey) -> Vec<GridEffect> {
        let Some(status) = self.status_editor.as_mut() else {
            return Vec::new();
        };
        match key {
            CellKey::Char(c) if !c.is_control() => status.buffer.insert(c),
            CellKey::Backspace => status.buffer.backspace(),
            CellKey::Delete => status.buffer.delete(),
            CellKey::Left => status.buffer.left(),
            CellKey::Right => status.buffer.right(),
            CellKey::Home => status.buffer.home(),
            CellKey::End => status.buffer.end(),
            CellKey::Escape => self.status_editor = None,
            CellKey::Enter | CellKey::Tab | CellKey::Blur => {
                let Some(status) = self.status_editor.take() else {
                    return Vec::new();
                };
                if status.buffer.as_str() != status.original {
                    let value = FieldValue::Text(status.buffer.as_str().to_string());
                    return self
                        .apply_edit(&status.item_id, ProductField::Description, value)
                        .into_iter()
                        .collect();
                }
            }
            _ => {}
        }
        Vec::new()
    }

    // ------------------------------------------------------------------------
    // Quick filter
    // ------------------------------------------------------------------------

    /// Show only held records whose code or name contains `filter`
    /// (case-insensitive). The cursor follows the selected record when it
    /// stays visible.
    pub fn set_filter(&mut self, filter: &str) -> Vec<GridEffect> {
        let mut effects = self.blur();
        let selected = self.selected_record().map(|r| r.item_id.clone());
        self.filter = filter.trim().to_string();
        self.rebuild_visible();

        let row = selected
            .and_then(|id| self.store.position(&id))
            .and_then(|i| self.visible.iter().position(|&v| v == i))
            .unwrap_or(0);
        self.cursor.row = row;
        self.scroll_top = 0;
        self.ensure_cursor_visible();
        effects.extend(self.maybe_load_more());
        effects
    }

    fn rebuild_visible(&mut self) {
        if self.filter.is_empty() {
            self.visible = (0..self.store.len()).collect();
            return;
        }
        let needle = self.filter.to_lowercase();
        self.visible = self
            .store
            .records()
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                r.item_id.to_lowercase().contains(&needle)
                    || r.description.to_lowercase().contains(&needle)
            })
            .map(|(i, _)| i)
            .collect();
    }

    // ------------------------------------------------------------------------
    // Results
    // ------------------------------------------------------------------------

    /// Apply the result of an effect. May request follow-up work.
    pub fn apply_event(&mut self, event: GridEvent) -> Vec<GridEffect> {
        match event {
            GridEvent::PageLoaded { ticket, response } => {
                let outcome =
                    self.loader
                        .complete(ticket, &response, self.config.page_size, &mut self.store);
                if let LoadOutcome::Loaded { added, .. } = outcome {
                    if added > 0 {
                        self.rebuild_visible();
                    }
                    return self.maybe_load_more().into_iter().collect();
                }
            }
            GridEvent::PageFailed { ticket, message } => {
                if self.loader.fail(ticket) {
                    log::warn!("page {} failed: {}", ticket.page, message);
                    self.error = Some(message);
                }
            }
            GridEvent::Persisted { edit } => {
                self.ledger.settle(&mut self.store, edit, true);
            }
            GridEvent::PersistFailed { edit, message } => {
                if self.ledger.settle(&mut self.store, edit, false) != SettleOutcome::Unknown {
                    self.error = Some(message);
                }
            }
            GridEvent::ProductFetched { item_id, raw } => {
                if self.ledger.has_pending(&item_id) {
                    log::debug!("not refreshing {} while edits are pending", item_id);
                    return Vec::new();
                }
                let mut record = normalize(&raw);
                if record.item_id.is_empty() {
                    record.item_id = item_id;
                }
                self.store.replace(record);
            }
            GridEvent::ProductFetchFailed { item_id, message } => {
                log::warn!("refresh of {} failed: {}", item_id, message);
                self.error = Some(message);
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Pagination;
    use serde_json::json;

    fn config() -> GridConfig {
        GridConfig {
            window: WindowParams { item_height: 1, ..WindowParams::default() },
            ..GridConfig::default()
        }
    }

    fn page(ids: std::ops::Range<u32>, has_next: bool) -> PageResponse {
        PageResponse {
            items: ids
                .map(|id| json!({ "item_id": id, "descricao": format!("ITEM {}", id) }))
                .collect(),
            pagination: Some(Pagination { has_next_page: Some(has_next), ..Default::default() }),
        }
    }

    fn ticket_of(effects: &[GridEffect]) -> FetchTicket {
        effects
            .iter()
            .find_map(|e| match e {
                GridEffect::FetchPage { ticket, .. } => Some(*ticket),
                _ => None,
            })
            .expect("fetch effect")
    }

    fn loaded(n: u32) -> Grid {
        let mut grid = Grid::new(config());
        let effects = grid.reload(CatalogQuery::All);
        let ticket = ticket_of(&effects);
        grid.apply_event(GridEvent::PageLoaded { ticket, response: page(0..n, false) });
        grid
    }

    #[test]
    fn reload_requests_first_page() {
        let mut grid = Grid::new(config());
        let effects = grid.reload(CatalogQuery::All);
        match &effects[..] {
            [GridEffect::FetchPage { ticket, request }] => {
                assert_eq!(ticket.page, 1);
                assert_eq!(request.limit, 50);
                assert_eq!(request.sort, SortDirection::Asc);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(grid.is_loading());
        assert!(grid.reload(CatalogQuery::All).len() == 1);
    }

    #[test]
    fn cursor_starts_on_first_editable_column() {
        let grid = loaded(3);
        assert_eq!(grid.cursor(), GridCursor::new(0, 1));
        assert_eq!(grid.focus(), Focus::Cell(GridCursor::new(0, 1)));
        assert_eq!(grid.selected_record().map(|r| r.item_id.as_str()), Some("0"));
    }

    #[test]
    fn enter_edit_commit_moves_down_and_persists() {
        let mut grid = loaded(3);
        grid.handle_key(CellKey::Enter);
        assert!(grid.is_editing());
        grid.handle_key(CellKey::Char('!'));
        let effects = grid.handle_key(CellKey::Enter);
        match &effects[..] {
            [GridEffect::Persist { item_id, update, .. }] => {
                assert_eq!(item_id, "0");
                assert_eq!(update.body(), json!({ "descricao": "ITEM 0!" }));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(grid.cursor().row, 1);
        assert_eq!(grid.record_at(0).map(|r| r.description.as_str()), Some("ITEM 0!"));
    }

    #[test]
    fn persist_failure_rolls_back_and_reports() {
        let mut grid = loaded(3);
        let effect = grid
            .apply_edit("1", ProductField::Description, FieldValue::Text("B".into()))
            .unwrap();
        let GridEffect::Persist { edit, .. } = effect else { panic!("expected persist") };
        grid.apply_event(GridEvent::PersistFailed { edit, message: "HTTP 500".into() });
        assert_eq!(grid.record_at(1).map(|r| r.description.as_str()), Some("ITEM 1"));
        assert_eq!(grid.error(), Some("HTTP 500"));
        grid.dismiss_error();
        assert_eq!(grid.error(), None);
    }

    #[test]
    fn save_failing_after_reload_still_reports() {
        let mut grid = loaded(3);
        let effect = grid
            .apply_edit("1", ProductField::Description, FieldValue::Text("B".into()))
            .unwrap();
        let GridEffect::Persist { edit, .. } = effect else { panic!("expected persist") };

        let effects = grid.reload(CatalogQuery::All);
        grid.apply_event(GridEvent::PageLoaded { ticket: ticket_of(&effects), response: page(0..3, false) });
        assert_eq!(grid.pending_edits(), 1);

        grid.apply_event(GridEvent::PersistFailed { edit, message: "HTTP 500: boom".into() });
        assert_eq!(grid.error(), Some("HTTP 500: boom"));
        assert_eq!(grid.record_at(1).map(|r| r.description.as_str()), Some("ITEM 1"));
        assert_eq!(grid.pending_edits(), 0);
    }

    #[test]
    fn typing_over_status_changes_it() {
        let mut grid = loaded(2);
        grid.set_cursor(GridCursor::new(0, 3));
        grid.handle_key(CellKey::Char('I'));
        let effects = grid.handle_key(CellKey::Enter);
        match &effects[..] {
            [GridEffect::Persist { update, .. }] => assert_eq!(update.body(), json!({ "ativo": "I" })),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(grid.record_at(0).map(|r| r.status.as_str()), Some("I"));
    }

    #[test]
    fn rejected_number_keeps_value() {
        let mut grid = loaded(3);
        grid.move_cursor(Direction::Right);
        assert_eq!(grid.cursor().col, 2);
        grid.handle_key(CellKey::Char('x'));
        let effects = grid.handle_key(CellKey::Enter);
        assert!(effects.iter().all(|e| !matches!(e, GridEffect::Persist { .. })));
        assert_eq!(grid.record_at(0).map(|r| r.supplier_id), Some(0));
        assert!(grid.error().is_some());
    }

    #[test]
    fn escape_cancels_without_effects() {
        let mut grid = loaded(2);
        grid.handle_key(CellKey::Char('Z'));
        assert!(grid.handle_key(CellKey::Escape).is_empty());
        assert!(!grid.is_editing());
        assert_eq!(grid.record_at(0).map(|r| r.description.as_str()), Some("ITEM 0"));
    }

    #[test]
    fn navigation_blocked_while_editing() {
        let mut grid = loaded(3);
        grid.handle_key(CellKey::Enter);
        assert!(grid.move_cursor(Direction::Down).is_empty());
        assert_eq!(grid.cursor().row, 0);
    }

    #[test]
    fn moving_down_near_end_prefetches() {
        let mut grid = Grid::new(config());
        let effects = grid.reload(CatalogQuery::All);
        grid.apply_event(GridEvent::PageLoaded { ticket: ticket_of(&effects), response: page(0..10, true) });
        let mut fetched = Vec::new();
        for _ in 0..5 {
            fetched.extend(grid.move_cursor(Direction::Down));
        }
        assert_eq!(grid.cursor().row, 5);
        assert_eq!(fetched.len(), 1);
        assert_eq!(ticket_of(&fetched).page, 2);
        // in-flight guard
        assert!(grid.move_cursor(Direction::Down).is_empty());
    }

    #[test]
    fn stale_page_after_reload_is_dropped() {
        let mut grid = Grid::new(config());
        let old = ticket_of(&grid.reload(CatalogQuery::All));
        let fresh = ticket_of(&grid.reload(CatalogQuery::search(
            "x",
            crate::query::SearchField::Description,
            crate::query::SearchMode::Contains,
        )));
        grid.apply_event(GridEvent::PageLoaded { ticket: old, response: page(0..5, false) });
        assert_eq!(grid.loaded_count(), 0);
        grid.apply_event(GridEvent::PageLoaded { ticket: fresh, response: page(0..2, false) });
        assert_eq!(grid.loaded_count(), 2);
    }

    #[test]
    fn page_failure_stops_loading() {
        let mut grid = Grid::new(config());
        let ticket = ticket_of(&grid.reload(CatalogQuery::All));
        grid.apply_event(GridEvent::PageFailed { ticket, message: "timeout".into() });
        assert!(!grid.has_more());
        assert!(grid.load_more().is_none());
        assert_eq!(grid.error(), Some("timeout"));
    }

    #[test]
    fn quick_filter_keeps_selection() {
        let mut grid = loaded(20);
        for _ in 0..12 {
            grid.move_cursor(Direction::Down);
        }
        grid.set_filter("item 1");
        // 1, 10..19
        assert_eq!(grid.record_count(), 11);
        assert_eq!(grid.selected_record().map(|r| r.item_id.as_str()), Some("12"));
        grid.set_filter("");
        assert_eq!(grid.record_count(), 20);
        assert_eq!(grid.cursor().row, 12);
    }

    #[test]
    fn status_bar_edits_description() {
        let mut grid = loaded(2);
        assert!(grid.begin_status_edit());
        assert_eq!(grid.focus(), Focus::StatusBar);
        grid.handle_key(CellKey::Backspace);
        grid.handle_key(CellKey::Char('9'));
        let effects = grid.handle_key(CellKey::Enter);
        assert_eq!(effects.len(), 1);
        assert_eq!(grid.focus(), Focus::Cell(GridCursor::new(0, 1)));
        assert_eq!(grid.record_at(0).map(|r| r.description.as_str()), Some("ITEM 9"));
    }

    #[test]
    fn refresh_replaces_record() {
        let mut grid = loaded(2);
        let effect = grid.refresh_selected();
        assert_eq!(effect, Some(GridEffect::FetchProduct { item_id: "0".into() }));
        grid.apply_event(GridEvent::ProductFetched {
            item_id: "0".into(),
            raw: json!({ "item_id": 0, "descricao": "NOVO", "estoque_pdv2": "8" }),
        });
        let record = grid.record_at(0).unwrap();
        assert_eq!(record.description, "NOVO");
        assert_eq!(record.store_stock[1], 8);
    }

    #[test]
    fn toggle_sort_reloads_descending() {
        let mut grid = loaded(2);
        let effects = grid.toggle_sort();
        assert_eq!(grid.sort(), SortDirection::Desc);
        assert_eq!(grid.loaded_count(), 0);
        match &effects[..] {
            [GridEffect::FetchPage { request, .. }] => assert_eq!(request.sort, SortDirection::Desc),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn scrolling_near_bottom_loads_more() {
        let mut grid = Grid::new(config());
        let ticket = ticket_of(&grid.reload(CatalogQuery::All));
        grid.apply_event(GridEvent::PageLoaded { ticket, response: page(0..50, true) });
        assert!(grid.set_viewport(20).is_empty());
        assert!(grid.scroll_to(10).is_empty());
        let effects = grid.scroll_to(25);
        assert_eq!(ticket_of(&effects).page, 2);
        assert_eq!(grid.cursor().row, 0);
    }

    #[test]
    fn cursor_change_scrolls_viewport() {
        let mut grid = loaded(50);
        grid.set_viewport(10);
        for _ in 0..9 {
            grid.move_cursor(Direction::Down);
        }
        assert_eq!(grid.scroll_top(), 2);
        assert!(grid.window().contains(9));
    }

    #[test]
    fn double_click_starts_edit() {
        let mut grid = loaded(3);
        grid.click(GridCursor::new(2, 4), true);
        assert_eq!(grid.cursor(), GridCursor::new(2, 4));
        assert!(grid.editor().is_editing());
        // clicking elsewhere commits the open edit
        grid.handle_key(CellKey::Char('5'));
        let effects = grid.click(GridCursor::new(0, 1), false);
        assert!(matches!(&effects[..], [GridEffect::Persist { .. }]));
        assert_eq!(grid.record_at(2).map(|r| r.store_stock[0]), Some(5));
    }
}
