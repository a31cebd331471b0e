//! CSV import of market quotes and export of surfaces.
//!
//! Two quote layouts are read:
//!
//! - matrix: the header row holds maturities (its first cell is a label and
//!   ignored), every following row starts with a strike and holds one price
//!   per maturity. Empty cells are missing quotes.
//! - long: one quote per row with `strike,maturity,market_price` headers.

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::debug;
use serde::Serialize;
use std::io::{Read, Write};

use super::{MarketQuote, VolatilitySurface};

fn parse_cell(record: &StringRecord, row: usize, column: usize, what: &str) -> Result<Option<f64>> {
    let Some(cell) = record.get(column) else {
        return Ok(None);
    };
    if cell.is_empty() {
        return Ok(None);
    }
    let value = cell
        .parse::<f64>()
        .with_context(|| format!("row {row}, column {column}: invalid {what} '{cell}'"))?;
    Ok(Some(value))
}

/// Reads a strike × maturity price matrix.
pub fn read_quote_matrix<R: Read>(reader: R) -> Result<Vec<MarketQuote>> {
    let mut csv = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let mut records = csv.records();

    let header = match records.next() {
        Some(record) => record.context("failed to read header row")?,
        None => bail!("quote matrix is empty"),
    };
    let maturities = (1..header.len())
        .map(|column| {
            parse_cell(&header, 0, column, "maturity")?
                .with_context(|| format!("header column {column}: missing maturity"))
        })
        .collect::<Result<Vec<f64>>>()?;
    if maturities.is_empty() {
        bail!("quote matrix header has no maturity columns");
    }

    let mut quotes = Vec::new();
    for (index, record) in records.enumerate() {
        let row = index + 1;
        let record = record.with_context(|| format!("failed to read row {row}"))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        if record.len() > maturities.len() + 1 {
            bail!(
                "row {row} has {} price columns, header has {} maturities",
                record.len() - 1,
                maturities.len()
            );
        }
        let strike = parse_cell(&record, row, 0, "strike")?
            .with_context(|| format!("row {row}: missing strike"))?;

        for (offset, &maturity) in maturities.iter().enumerate() {
            if let Some(market_price) = parse_cell(&record, row, offset + 1, "price")? {
                quotes.push(MarketQuote {
                    strike,
                    maturity,
                    market_price,
                });
            }
        }
    }

    debug!(
        "read {} quotes over {} maturities from price matrix",
        quotes.len(),
        maturities.len()
    );
    Ok(quotes)
}

/// Reads quotes in long format, one `strike,maturity,market_price` row each.
pub fn read_quotes<R: Read>(reader: R) -> Result<Vec<MarketQuote>> {
    let mut csv = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let quotes = csv
        .deserialize::<MarketQuote>()
        .enumerate()
        .map(|(index, row)| row.with_context(|| format!("invalid quote on line {}", index + 2)))
        .collect::<Result<Vec<MarketQuote>>>()?;
    debug!("read {} quotes", quotes.len());
    Ok(quotes)
}

#[derive(Serialize)]
struct SurfaceRow {
    strike: f64,
    time_to_maturity: f64,
    market_price: f64,
    implied_vol: Option<f64>,
}

/// Writes one row per surface point; gaps leave `implied_vol` empty.
pub fn write_surface<W: Write>(surface: &VolatilitySurface, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for point in &surface.points {
        csv.serialize(SurfaceRow {
            strike: point.strike,
            time_to_maturity: point.time_to_maturity,
            market_price: point.market_price,
            implied_vol: point.implied_vol,
        })
        .context("failed to write surface row")?;
    }
    csv.flush().context("failed to flush surface csv")?;
    Ok(())
}
