//! Product records and the normalizer.
//!
//! The backend speaks `estoque_pdv7` / `valor_venda2` / `custo_venda` / `ativo`;
//! the grid speaks `loja7` / `venda2` / `custo_final` / `situacao`. Everything
//! that crosses that boundary goes through [`ProductField`].

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};

/// Number of stores carrying per-store stock counts.
pub const STORE_COUNT: usize = 15;

/// Number of independent sale-price tiers.
pub const PRICE_TIERS: usize = 4;

/// Status code used when none is given.
pub const DEFAULT_STATUS: &str = "A";

/// One field of a [`ProductRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductField {
    ItemId,
    Description,
    SupplierId,
    Status,
    /// Stock for store `n` (1-based, 1..=15)
    StoreStock(u8),
    FinalCost,
    /// Sale price tier `n` (1-based, 1..=4)
    SalePrice(u8),
}

/// Which spelling of field names to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldNaming {
    /// `loja1`, `venda1`, `custo_final`, `situacao`
    Client,
    /// `estoque_pdv1`, `valor_venda1`, `custo_venda`, `ativo`
    Backend,
}

impl ProductField {
    /// Every field, in grid column order.
    pub fn all() -> Vec<ProductField> {
        let mut fields = vec![
            ProductField::ItemId,
            ProductField::Description,
            ProductField::SupplierId,
            ProductField::Status,
        ];
        fields.extend((1..=STORE_COUNT as u8).map(ProductField::StoreStock));
        fields.push(ProductField::FinalCost);
        fields.extend((1..=PRICE_TIERS as u8).map(ProductField::SalePrice));
        fields
    }

    /// Client-side key.
    pub fn key(&self) -> String {
        match self {
            ProductField::ItemId => "item_id".to_string(),
            ProductField::Description => "descricao".to_string(),
            ProductField::SupplierId => "fornecedor_id".to_string(),
            ProductField::Status => "situacao".to_string(),
            ProductField::StoreStock(n) => format!("loja{}", n),
            ProductField::FinalCost => "custo_final".to_string(),
            ProductField::SalePrice(n) => format!("venda{}", n),
        }
    }

    /// Column name on the backend.
    pub fn backend_name(&self) -> String {
        match self {
            ProductField::ItemId => "item_id".to_string(),
            ProductField::Description => "descricao".to_string(),
            ProductField::SupplierId => "fornecedor_id".to_string(),
            ProductField::Status => "ativo".to_string(),
            ProductField::StoreStock(n) => format!("estoque_pdv{}", n),
            ProductField::FinalCost => "custo_venda".to_string(),
            ProductField::SalePrice(n) => format!("valor_venda{}", n),
        }
    }

    /// Holds a single-letter code, so a typed letter replaces it.
    pub fn is_code(&self) -> bool {
        matches!(self, ProductField::Status)
    }

    pub fn name(&self, naming: FieldNaming) -> String {
        match naming {
            FieldNaming::Client => self.key(),
            FieldNaming::Backend => self.backend_name(),
        }
    }

    /// Parse a field name in either spelling (case-insensitive).
    pub fn parse(name: &str) -> Option<ProductField> {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "item_id" | "id" | "codigo" => return Some(ProductField::ItemId),
            "descricao" | "description" => return Some(ProductField::Description),
            "fornecedor_id" | "fornecedor" | "supplier_id" => {
                return Some(ProductField::SupplierId)
            }
            "situacao" | "ativo" | "status" => return Some(ProductField::Status),
            "custo_final" | "custo_venda" | "final_cost" => return Some(ProductField::FinalCost),
            _ => {}
        }

        let numbered = |prefixes: &[&str], max: usize| -> Option<u8> {
            prefixes.iter().find_map(|prefix| {
                let n: usize = name.strip_prefix(prefix)?.parse().ok()?;
                (1..=max).contains(&n).then_some(n as u8)
            })
        };

        if let Some(n) = numbered(&["estoque_pdv", "loja"], STORE_COUNT) {
            return Some(ProductField::StoreStock(n));
        }
        numbered(&["valor_venda", "venda"], PRICE_TIERS).map(ProductField::SalePrice)
    }

    /// True for fields holding numbers.
    pub fn is_numeric(&self) -> bool {
        !matches!(
            self,
            ProductField::ItemId | ProductField::Description | ProductField::Status
        )
    }

    /// True for the 2-decimal money fields.
    pub fn is_decimal(&self) -> bool {
        matches!(self, ProductField::FinalCost | ProductField::SalePrice(_))
    }
}

impl fmt::Display for ProductField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
}

impl FieldValue {
    /// Numeric view of the value (text goes through the safe parser).
    pub fn as_f64(&self) -> f64 {
        match self {
            FieldValue::Text(s) => safe_parse_str(s),
            FieldValue::Integer(n) => *n as f64,
            FieldValue::Decimal(d) => *d,
        }
    }

    /// Empty text or numeric zero.
    pub fn is_blank_or_zero(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Integer(n) => *n == 0,
            FieldValue::Decimal(d) => *d == 0.0,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Integer(n) => Value::from(*n),
            FieldValue::Decimal(d) => Value::from(*d),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Decimal(d) => write!(f, "{}", d),
        }
    }
}

/// One row of the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub item_id: String,
    pub description: String,
    pub supplier_id: i64,
    /// Single-character status code, `A` = active
    pub status: String,
    pub store_stock: [i64; STORE_COUNT],
    pub final_cost: f64,
    pub sale_price: [f64; PRICE_TIERS],
}

impl Default for ProductRecord {
    fn default() -> Self {
        Self {
            item_id: String::new(),
            description: String::new(),
            supplier_id: 0,
            status: DEFAULT_STATUS.to_string(),
            store_stock: [0; STORE_COUNT],
            final_cost: 0.0,
            sale_price: [0.0; PRICE_TIERS],
        }
    }
}

impl ProductRecord {
    pub fn get(&self, field: ProductField) -> FieldValue {
        match field {
            ProductField::ItemId => FieldValue::Text(self.item_id.clone()),
            ProductField::Description => FieldValue::Text(self.description.clone()),
            ProductField::SupplierId => FieldValue::Integer(self.supplier_id),
            ProductField::Status => FieldValue::Text(self.status.clone()),
            ProductField::StoreStock(n) => match store_slot(n) {
                Some(i) => FieldValue::Integer(self.store_stock[i]),
                None => FieldValue::Integer(0),
            },
            ProductField::FinalCost => FieldValue::Decimal(self.final_cost),
            ProductField::SalePrice(n) => match tier_slot(n) {
                Some(i) => FieldValue::Decimal(self.sale_price[i]),
                None => FieldValue::Decimal(0.0),
            },
        }
    }

    /// Write one field, coercing the value to the field's type.
    ///
    /// `ItemId` is immutable and ignored here. Stock and supplier values are
    /// truncated to integers, money values rounded to 2 places.
    pub fn set(&mut self, field: ProductField, value: FieldValue) {
        match field {
            ProductField::ItemId => {}
            ProductField::Description => self.description = value.to_string(),
            ProductField::SupplierId => self.supplier_id = to_integer(&value),
            ProductField::Status => self.status = normalize_status(&value.to_string()),
            ProductField::StoreStock(n) => {
                if let Some(i) = store_slot(n) {
                    self.store_stock[i] = to_integer(&value);
                }
            }
            ProductField::FinalCost => self.final_cost = round2(value.as_f64()),
            ProductField::SalePrice(n) => {
                if let Some(i) = tier_slot(n) {
                    self.sale_price[i] = round2(value.as_f64());
                }
            }
        }
    }

    /// Serialize with the given field naming.
    pub fn to_json(&self, naming: FieldNaming) -> Value {
        let mut map = Map::new();
        for field in ProductField::all() {
            map.insert(field.name(naming), self.get(field).to_json());
        }
        Value::Object(map)
    }
}

/// Map a raw backend record onto a [`ProductRecord`].
///
/// Backend names win; client keys are accepted as a fallback so an already
/// normalized record can be fed back in. Missing or malformed values fall back
/// to `0` / `""` / `"A"`.
pub fn normalize(raw: &Value) -> ProductRecord {
    let mut record = ProductRecord::default();

    for field in ProductField::all() {
        let value = lookup(raw, field);
        match field {
            ProductField::ItemId => record.item_id = value.map(text_of).unwrap_or_default(),
            ProductField::Description | ProductField::Status => {
                record.set(field, FieldValue::Text(value.map(text_of).unwrap_or_default()));
            }
            _ => {
                let n = value.map(safe_parse_number).unwrap_or(0.0);
                record.set(field, FieldValue::Decimal(n));
            }
        }
    }

    record
}

fn lookup(raw: &Value, field: ProductField) -> Option<&Value> {
    let present = |v: &&Value| !v.is_null();
    raw.get(field.backend_name())
        .filter(present)
        .or_else(|| raw.get(field.key()).filter(present))
}

fn text_of(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Numeric coercion that never yields NaN: numbers pass through, strings are
/// parsed leniently, everything else is `0`.
pub fn safe_parse_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).unwrap_or(0.0),
        Value::String(s) => safe_parse_str(s),
        _ => 0.0,
    }
}

/// Strip everything except digits, `.` and `-`, then parse the longest valid
/// numeric prefix. Returns `0` when nothing parses.
pub fn safe_parse_str(s: &str) -> f64 {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    let n = leading_number(&cleaned).unwrap_or(0.0);
    if n == 0.0 {
        0.0
    } else {
        n
    }
}

fn leading_number(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    let negative = bytes.first() == Some(&b'-');
    if negative {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let int_part = &s[int_start..end];

    let mut frac_part = "";
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        frac_part = &s[frac_start..j];
    }

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let candidate = format!(
        "{}{}.{}",
        if negative { "-" } else { "" },
        if int_part.is_empty() { "0" } else { int_part },
        if frac_part.is_empty() { "0" } else { frac_part },
    );
    candidate.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Status codes are one upper-case character; blank means active.
pub fn normalize_status(raw: &str) -> String {
    match raw.trim().chars().next() {
        Some(c) => c.to_uppercase().collect(),
        None => DEFAULT_STATUS.to_string(),
    }
}

fn to_integer(value: &FieldValue) -> i64 {
    match value {
        FieldValue::Integer(n) => *n,
        other => other.as_f64().trunc() as i64,
    }
}

fn round2(n: f64) -> f64 {
    let rounded = (n * 100.0).round() / 100.0;
    if rounded == 0.0 || !rounded.is_finite() {
        0.0
    } else {
        rounded
    }
}

fn store_slot(n: u8) -> Option<usize> {
    (1..=STORE_COUNT).contains(&(n as usize)).then(|| n as usize - 1)
}

fn tier_slot(n: u8) -> Option<usize> {
    (1..=PRICE_TIERS).contains(&(n as usize)).then(|| n as usize - 1)
}

// ============================================================================
// RecordStore
// ============================================================================

/// The held record list, indexed by `item_id`.
///
/// Insertion refuses ids that are already present, so the list can never hold
/// two records with the same id no matter how pages overlap.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<ProductRecord>,
    index: HashMap<String, usize>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&ProductRecord> {
        self.records.get(index)
    }

    pub fn position(&self, item_id: &str) -> Option<usize> {
        self.index.get(item_id).copied()
    }

    pub fn find(&self, item_id: &str) -> Option<&ProductRecord> {
        self.position(item_id).and_then(|i| self.records.get(i))
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.index.contains_key(item_id)
    }

    /// Append a record unless its id is already held. Returns true if added.
    pub fn insert_new(&mut self, record: ProductRecord) -> bool {
        if self.index.contains_key(&record.item_id) {
            return false;
        }
        self.index.insert(record.item_id.clone(), self.records.len());
        self.records.push(record);
        true
    }

    /// Replace the held record with the same id. Returns false if not held.
    pub fn replace(&mut self, record: ProductRecord) -> bool {
        match self.position(&record.item_id) {
            Some(i) => {
                self.records[i] = record;
                true
            }
            None => false,
        }
    }

    /// Write one field of the record with `item_id`, returning the previous
    /// value, or `None` if the record is not held.
    pub fn update_field(
        &mut self,
        item_id: &str,
        field: ProductField,
        value: FieldValue,
    ) -> Option<FieldValue> {
        let i = self.position(item_id)?;
        let record = &mut self.records[i];
        let previous = record.get(field);
        record.set(field, value);
        Some(previous)
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_item() -> Value {
        json!({
            "item_id": 1001,
            "descricao": "PARAFUSO 3/8",
            "fornecedor_id": "17",
            "ativo": "A",
            "estoque_pdv1": 12,
            "estoque_pdv7": "4.0000",
            "custo_venda": "10.50",
            "valor_venda1": 15.9,
            "valor_venda2": null,
        })
    }

    #[test]
    fn field_names_round_trip() {
        for field in ProductField::all() {
            assert_eq!(ProductField::parse(&field.key()), Some(field));
            assert_eq!(ProductField::parse(&field.backend_name()), Some(field));
        }
        assert_eq!(ProductField::all().len(), 4 + STORE_COUNT + 1 + PRICE_TIERS);
    }

    #[test]
    fn parse_rejects_out_of_range_slots() {
        assert_eq!(ProductField::parse("loja0"), None);
        assert_eq!(ProductField::parse("loja16"), None);
        assert_eq!(ProductField::parse("venda5"), None);
        assert_eq!(ProductField::parse("LOJA15"), Some(ProductField::StoreStock(15)));
        assert_eq!(ProductField::parse("bogus"), None);
    }

    #[test]
    fn backend_names() {
        assert_eq!(ProductField::StoreStock(7).backend_name(), "estoque_pdv7");
        assert_eq!(ProductField::SalePrice(2).backend_name(), "valor_venda2");
        assert_eq!(ProductField::FinalCost.backend_name(), "custo_venda");
        assert_eq!(ProductField::Status.backend_name(), "ativo");
    }

    #[test]
    fn normalize_maps_backend_fields() {
        let record = normalize(&raw_item());
        assert_eq!(record.item_id, "1001");
        assert_eq!(record.description, "PARAFUSO 3/8");
        assert_eq!(record.supplier_id, 17);
        assert_eq!(record.status, "A");
        assert_eq!(record.store_stock[0], 12);
        assert_eq!(record.store_stock[6], 4);
        assert_eq!(record.store_stock[1], 0);
        assert_eq!(record.final_cost, 10.5);
        assert_eq!(record.sale_price[0], 15.9);
        assert_eq!(record.sale_price[1], 0.0);
    }

    #[test]
    fn normalize_tolerates_missing_fields() {
        let record = normalize(&json!({ "item_id": "X1" }));
        assert_eq!(record.item_id, "X1");
        assert_eq!(record.description, "");
        assert_eq!(record.status, "A");
        assert_eq!(record.store_stock, [0; STORE_COUNT]);
    }

    #[test]
    fn normalize_accepts_client_keys() {
        let record = normalize(&raw_item());
        let again = normalize(&record.to_json(FieldNaming::Client));
        assert_eq!(record, again);
    }

    #[test]
    fn safe_parse_never_nan() {
        assert_eq!(safe_parse_str("abc"), 0.0);
        assert_eq!(safe_parse_str(""), 0.0);
        assert_eq!(safe_parse_str("-"), 0.0);
        assert_eq!(safe_parse_str("R$ 12.50"), 12.5);
        assert_eq!(safe_parse_str("1.2.3"), 1.2);
        assert_eq!(safe_parse_str(".5"), 0.5);
        assert_eq!(safe_parse_str("-3"), -3.0);
        assert_eq!(safe_parse_number(&json!(true)), 0.0);
        assert_eq!(safe_parse_number(&json!(2.25)), 2.25);
    }

    #[test]
    fn status_normalization() {
        assert_eq!(normalize_status(""), "A");
        assert_eq!(normalize_status("  "), "A");
        assert_eq!(normalize_status("i"), "I");
        assert_eq!(normalize_status("inativo"), "I");
    }

    #[test]
    fn set_coerces_types() {
        let mut record = ProductRecord::default();
        record.set(ProductField::StoreStock(3), FieldValue::Decimal(7.9));
        record.set(ProductField::SalePrice(4), FieldValue::Decimal(1.005));
        record.set(ProductField::ItemId, FieldValue::Text("changed".into()));
        record.set(ProductField::Status, FieldValue::Text(String::new()));
        assert_eq!(record.store_stock[2], 7);
        assert!((record.sale_price[3] - 1.0).abs() < 0.011);
        assert_eq!(record.item_id, "");
        assert_eq!(record.status, "A");
    }

    #[test]
    fn store_refuses_duplicates() {
        let mut store = RecordStore::new();
        let a = normalize(&json!({ "item_id": 1 }));
        assert!(store.insert_new(a.clone()));
        assert!(!store.insert_new(a));
        assert_eq!(store.len(), 1);
        assert_eq!(store.position("1"), Some(0));
    }

    #[test]
    fn store_update_field_returns_previous() {
        let mut store = RecordStore::new();
        store.insert_new(normalize(&json!({ "item_id": 1, "descricao": "A" })));
        let prev = store.update_field("1", ProductField::Description, FieldValue::Text("B".into()));
        assert_eq!(prev, Some(FieldValue::Text("A".into())));
        assert_eq!(store.find("1").map(|r| r.description.as_str()), Some("B"));
        assert_eq!(
            store.update_field("missing", ProductField::Description, FieldValue::Text("x".into())),
            None
        );
    }
}
