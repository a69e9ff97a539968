//! Plain-text output for the headless commands.

use std::io::{self, Write};

use stockgrid_core::{format_value, ColumnSpec, ProductRecord};

use crate::util::{display_width, fit, Align};

/// Print records as an aligned table, one line per record. Columns widen to
/// their longest value so nothing is cut.
pub fn print_table(out: &mut impl Write, columns: &[ColumnSpec], records: &[ProductRecord]) -> io::Result<()> {
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| columns.iter().map(|c| format_value(&record.get(c.field), c)).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            rows.iter()
                .map(|row| display_width(&row[i]))
                .fold((c.width as usize).max(display_width(&c.header)), usize::max)
        })
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, &w)| fit(&c.header, w, Align::Left))
        .collect();
    writeln!(out, "{}", header.join(" ").trim_end())?;

    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    writeln!(out, "{}", rule.join(" "))?;

    for row in &rows {
        let cells: Vec<String> = columns
            .iter()
            .zip(row.iter().zip(&widths))
            .map(|(c, (text, &w))| {
                let align = if c.is_numeric() { Align::Right } else { Align::Left };
                fit(text, w, align)
            })
            .collect();
        writeln!(out, "{}", cells.join(" ").trim_end())?;
    }
    Ok(())
}

/// Print one record as `Header: value` lines.
pub fn print_record(out: &mut impl Write, columns: &[ColumnSpec], record: &ProductRecord) -> io::Result<()> {
    let label_width = columns.iter().map(|c| display_width(&c.header)).max().unwrap_or(0);
    for column in columns {
        let value = format_value(&record.get(column.field), column);
        writeln!(out, "{}  {}", fit(&column.header, label_width, Align::Left), value)?;
    }
    Ok(())
}
