// Property-based tests for the grid model.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::HashSet;

use proptest::prelude::*;
use serde_json::{json, Map, Value};
use stockgrid_core::navigation::step;
use stockgrid_core::record::FieldNaming;
use stockgrid_core::*;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Numeric field as the backend might send it: number, numeric string,
/// junk, or missing.
fn arb_numeric() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        3 => (-999_999_999i64..999_999_999).prop_map(|n| Some(json!(n))),
        2 => (-99_999_999i64..99_999_999).prop_map(|c| Some(json!(c as f64 / 100.0))),
        2 => r"-?[0-9]{1,7}(\.[0-9]{1,4})?".prop_map(|s| Some(json!(s))),
        1 => r"[a-zA-Z$ ]{0,6}".prop_map(|s| Some(json!(s))),
        1 => Just(Some(Value::Null)),
        1 => Just(None),
    ]
}

fn arb_raw_record() -> impl Strategy<Value = Value> {
    (
        r"[0-9]{1,8}",
        r"[A-Za-z0-9 /.-]{0,24}",
        r"[a-zA-Z ]{0,3}",
        prop::collection::vec(arb_numeric(), 21),
    )
        .prop_map(|(id, desc, status, numbers)| {
            let mut map = Map::new();
            map.insert("item_id".into(), json!(id));
            map.insert("descricao".into(), json!(desc));
            map.insert("ativo".into(), json!(status));
            let numeric_fields = ProductField::all()
                .into_iter()
                .filter(|f| f.is_numeric())
                .collect::<Vec<_>>();
            for (field, value) in numeric_fields.iter().zip(numbers) {
                if let Some(v) = value {
                    map.insert(field.backend_name(), v);
                }
            }
            Value::Object(map)
        })
}

/// Column layout with a random editable mask; column 0 stays read-only.
fn arb_columns() -> impl Strategy<Value = Vec<ColumnSpec>> {
    prop::collection::vec(any::<bool>(), 1..8).prop_map(|mask| {
        let mut cols = vec![ColumnSpec::text(ProductField::ItemId, "Id", false, 4)];
        for (i, editable) in mask.into_iter().enumerate() {
            let mut col = ColumnSpec::number(
                ProductField::StoreStock(i as u8 + 1),
                &format!("Loja{}", i + 1),
                NumericFormat::Integer,
                6,
            );
            col.editable = editable;
            cols.push(col);
        }
        cols
    })
}

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::Up),
        Just(Direction::Down),
        Just(Direction::Left),
        Just(Direction::Right),
    ]
}

fn integer_column() -> ColumnSpec {
    ColumnSpec::number(ProductField::StoreStock(1), "Loja1", NumericFormat::Integer, 6)
}

fn decimal_column() -> ColumnSpec {
    ColumnSpec::number(ProductField::FinalCost, "Custo Final", NumericFormat::Decimal2, 11)
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn normalization_is_idempotent(raw in arb_raw_record()) {
        let once = normalize(&raw);
        prop_assert_eq!(&normalize(&once.to_json(FieldNaming::Backend)), &once);
        prop_assert_eq!(&normalize(&once.to_json(FieldNaming::Client)), &once);
    }

    #[test]
    fn normalized_numbers_are_finite(raw in arb_raw_record()) {
        let record = normalize(&raw);
        prop_assert!(record.final_cost.is_finite());
        prop_assert!(record.sale_price.iter().all(|p| p.is_finite()));
        prop_assert_eq!(record.status.chars().count(), 1);
    }

    #[test]
    fn integer_display_parses_back(n in 0i64..1_000_000_000_000) {
        let shown = format_value(&FieldValue::Integer(n), &integer_column());
        prop_assert_eq!(parse_decimal_input(&shown), Ok(n as f64));
    }

    #[test]
    fn decimal_display_parses_back(cents in -1_000_000_000i64..1_000_000_000) {
        let d = cents as f64 / 100.0;
        let shown = format_value(&FieldValue::Decimal(d), &decimal_column());
        let back = parse_decimal_input(&shown);
        prop_assert!(back.is_ok(), "{} did not parse", shown);
        let back = back.unwrap_or_default();
        prop_assert!((back - d).abs() < 1e-9, "{} -> {} -> {}", d, shown, back);
    }

    #[test]
    fn navigation_stays_in_bounds(
        cols in arb_columns(),
        rows in 1usize..60,
        row_seed in any::<usize>(),
        col_seed in any::<usize>(),
        moves in prop::collection::vec(arb_direction(), 1..30),
    ) {
        let mut cursor = GridCursor::new(row_seed % rows, col_seed % cols.len());
        for direction in moves {
            cursor = step(cursor, direction, rows, &cols);
            prop_assert!(cursor.row < rows);
            prop_assert!(cursor.col < cols.len());
        }
    }

    #[test]
    fn horizontal_moves_land_on_editable(
        cols in arb_columns(),
        rows in 1usize..60,
        row_seed in any::<usize>(),
        moves in prop::collection::vec(prop_oneof![Just(Direction::Left), Just(Direction::Right)], 1..30),
    ) {
        let editable: Vec<usize> = (0..cols.len()).filter(|&c| cols[c].editable).collect();
        prop_assume!(!editable.is_empty());
        let mut cursor = GridCursor::new(row_seed % rows, editable[row_seed % editable.len()]);
        for direction in moves {
            cursor = step(cursor, direction, rows, &cols);
            prop_assert!(cols[cursor.col].editable, "landed on {:?}", cursor);
        }
    }

    #[test]
    fn reloading_a_page_never_duplicates(ids in prop::collection::vec(0u32..40, 0..60)) {
        let response = PageResponse {
            items: ids.iter().map(|id| json!({ "item_id": id })).collect(),
            pagination: None,
        };
        let distinct: HashSet<u32> = ids.iter().copied().collect();

        let mut store = RecordStore::new();
        let mut loader = PageLoader::new();
        for _ in 0..2 {
            if let Some(ticket) = loader.begin() {
                loader.complete(ticket, &response, 50, &mut store);
            }
        }
        prop_assert_eq!(store.len(), distinct.len());
    }

    #[test]
    fn window_covers_viewport(
        total in 0usize..500,
        scroll_top in 0usize..20_000,
        container in 1usize..1_000,
    ) {
        let params = WindowParams::default();
        let w = compute_window(scroll_top, container, &params, total);
        prop_assert!(w.start_index <= w.end_index);
        prop_assert!(w.end_index <= total);
        prop_assert_eq!(w.offset_y + w.len() * params.item_height + w.bottom_spacer(), w.total_height);
        let first_visible = scroll_top / params.item_height;
        let last_visible = (scroll_top + container - 1) / params.item_height;
        for row in first_visible..=last_visible {
            if row < total {
                prop_assert!(w.contains(row), "row {} outside {:?}", row, w);
            }
        }
    }
}
