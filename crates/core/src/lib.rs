//! Catalog grid model.
//!
//! Everything the editable product grid needs that is not I/O: record
//! normalization, value formatting, the virtual window, cursor navigation,
//! the cell editor, page loading and optimistic edits. The [`grid::Grid`]
//! ties them together and hands network work out as [`grid::GridEffect`]s.

pub mod backend;
pub mod cell;
pub mod column;
pub mod format;
pub mod grid;
pub mod loader;
pub mod navigation;
pub mod query;
pub mod record;
pub mod update;
pub mod window;

pub use backend::{execute, CatalogBackend};
pub use cell::{CellAction, CellEditor, CellKey, CellMode, CommitOutcome, TextBuffer};
pub use column::{catalog_columns, ColumnKind, ColumnSpec, NumericFormat};
pub use format::{edit_seed, format_value, parse_decimal_input, InputError};
pub use grid::{Focus, Grid, GridConfig, GridEffect, GridEvent};
pub use loader::{FetchTicket, LoadOutcome, PageLoader};
pub use navigation::{Direction, GridCursor};
pub use query::{
    CatalogQuery, PageRequest, PageResponse, Pagination, SearchField, SearchMode, SortDirection,
};
pub use record::{normalize, FieldValue, ProductField, ProductRecord, RecordStore};
pub use update::{EditId, EditLedger, FieldUpdate, SettleOutcome};
pub use window::{compute_window, VirtualWindow, WindowParams};
