use std::collections::HashSet;
use std::io::{Read, Write};

use thiserror::Error;

use crate::match_engine::{MatchedRow, RowKey};
use crate::rows::{BalanceRow, TransactionRow};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write the denormalized balance view. The header row is always written,
/// even for an empty file.
pub fn write_balance_rows<W: Write>(out: W, rows: &[BalanceRow]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(BalanceRow::HEADERS)?;
    for row in rows {
        writer.write_record(row.record())?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the compact transaction view. The header row is always written.
pub fn write_transaction_rows<W: Write>(
    out: W,
    rows: &[TransactionRow],
) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(TransactionRow::HEADERS)?;
    for row in rows {
        writer.write_record(row.record())?;
    }
    writer.flush()?;
    Ok(())
}

/// Write matched rows: the transaction columns followed by the four match
/// columns.
pub fn write_matched_rows<W: Write>(out: W, rows: &[MatchedRow]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    let header: Vec<&str> = TransactionRow::HEADERS
        .iter()
        .copied()
        .chain(MatchedRow::MATCH_HEADERS)
        .collect();
    writer.write_record(&header)?;
    for row in rows {
        let record: Vec<&str> = row
            .row
            .record()
            .into_iter()
            .chain(row.match_record())
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

// Positional columns of the key fields in the matched/transaction layout.
const COL_DATE: usize = 0;
const COL_CREDIT_AMOUNT: usize = 8;
const COL_BANK_REF: usize = 10;
const COL_DESCRIPTION: usize = 13;

/// Re-read a previously written matched CSV and collect the row keys it
/// contains, so a re-run can skip rows already processed. Key columns are
/// addressed by position; short records read as empty cells.
pub fn read_matched_keys<R: Read>(input: R) -> Result<HashSet<RowKey>, ExportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let mut keys = HashSet::new();
    for result in reader.records() {
        let record = result?;
        let cell = |idx: usize| record.get(idx).unwrap_or("").to_string();
        keys.insert(RowKey {
            date: cell(COL_DATE),
            credit_amount: cell(COL_CREDIT_AMOUNT),
            description: cell(COL_DESCRIPTION),
            bank_ref: cell(COL_BANK_REF),
        });
    }
    Ok(keys)
}
