//! Static column definitions for the catalog grid.

use crate::record::{ProductField, PRICE_TIERS, STORE_COUNT};

/// Input kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Number,
}

/// How a numeric column is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericFormat {
    /// Truncated, no grouping (stock counts, supplier id)
    Integer,
    /// Two decimals with pt-BR punctuation (`1.234,50`)
    Decimal2,
}

/// One grid column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub field: ProductField,
    pub header: String,
    pub editable: bool,
    pub kind: ColumnKind,
    pub numeric_format: Option<NumericFormat>,
    /// Display width in terminal cells
    pub width: u16,
}

impl ColumnSpec {
    pub fn text(field: ProductField, header: &str, editable: bool, width: u16) -> Self {
        Self {
            field,
            header: header.to_string(),
            editable,
            kind: ColumnKind::Text,
            numeric_format: None,
            width,
        }
    }

    pub fn number(field: ProductField, header: &str, format: NumericFormat, width: u16) -> Self {
        Self {
            field,
            header: header.to_string(),
            editable: true,
            kind: ColumnKind::Number,
            numeric_format: Some(format),
            width,
        }
    }

    /// Stable id (the client field key).
    pub fn id(&self) -> String {
        self.field.key()
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnKind::Number
    }
}

/// The production column layout: code, name, supplier, status, 15 stores,
/// final cost and 4 sale prices.
pub fn catalog_columns() -> Vec<ColumnSpec> {
    let mut columns = vec![
        ColumnSpec::text(ProductField::ItemId, "Código", false, 8),
        ColumnSpec::text(ProductField::Description, "Nome", true, 32),
        ColumnSpec::number(ProductField::SupplierId, "Fornecedor", NumericFormat::Integer, 10),
        ColumnSpec::text(ProductField::Status, "Situação", true, 8),
    ];
    for n in 1..=STORE_COUNT as u8 {
        columns.push(ColumnSpec::number(
            ProductField::StoreStock(n),
            &format!("Loja{}", n),
            NumericFormat::Integer,
            6,
        ));
    }
    columns.push(ColumnSpec::number(
        ProductField::FinalCost,
        "Custo Final",
        NumericFormat::Decimal2,
        11,
    ));
    for n in 1..=PRICE_TIERS as u8 {
        columns.push(ColumnSpec::number(
            ProductField::SalePrice(n),
            &format!("Venda{}", n),
            NumericFormat::Decimal2,
            10,
        ));
    }
    columns
}
