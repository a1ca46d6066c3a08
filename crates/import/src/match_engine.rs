use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;

use solvi_core::Invoice;

use crate::rows::TransactionRow;
use crate::util::token_set_ratio;

/// Scores incoming bank credits against open AR invoices.
///
/// Scoring out of 100: exact amount 50 points, amount within 1% 30 points,
/// customer-name token-set similarity up to 50 points. A candidate is
/// accepted only when the combined score clears `min_score`.
pub struct InvoiceMatchEngine {
    pub amount_exact_pts: u32,
    pub amount_close_pts: u32,
    pub name_max_pts: u32,
    pub min_score: u32,
}

impl Default for InvoiceMatchEngine {
    fn default() -> Self {
        Self {
            amount_exact_pts: 50,
            amount_close_pts: 30,
            name_max_pts: 50,
            min_score: 60,
        }
    }
}

/// A transaction row with the four match columns appended; all four are
/// empty when no invoice qualified.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedRow {
    pub row: TransactionRow,
    pub matched_customer: String,
    pub invoice_number: String,
    pub confidence: String,
    pub invoice_link: String,
}

impl MatchedRow {
    pub const MATCH_HEADERS: [&'static str; 4] =
        ["Matched Customer", "Invoice #", "Confidence", "Invoice Link"];

    pub fn match_record(&self) -> [&str; 4] {
        [
            &self.matched_customer,
            &self.invoice_number,
            &self.confidence,
            &self.invoice_link,
        ]
    }
}

impl InvoiceMatchEngine {
    pub fn new(
        amount_exact_pts: u32,
        amount_close_pts: u32,
        name_max_pts: u32,
        min_score: u32,
    ) -> Self {
        Self {
            amount_exact_pts,
            amount_close_pts,
            name_max_pts,
            min_score,
        }
    }

    /// Annotate every row with its best qualifying invoice, preserving input
    /// order and cardinality. Rows without a positive credit amount pass
    /// through unmatched unconditionally.
    pub fn match_rows(&self, rows: &[TransactionRow], invoices: &[Invoice]) -> Vec<MatchedRow> {
        rows.iter().map(|row| self.match_row(row, invoices)).collect()
    }

    fn match_row(&self, row: &TransactionRow, invoices: &[Invoice]) -> MatchedRow {
        let amount = parse_credit_amount(&row.credit_amount);

        let mut best: Option<(&Invoice, u32)> = None;
        if amount > Decimal::ZERO {
            for invoice in invoices {
                let total = self.amount_score(amount, invoice.amount_remaining)
                    + self.name_score(&row.description, &invoice.customer_name);
                best = match best {
                    None if total > 0 => Some((invoice, total)),
                    Some((_, score)) if total > score => Some((invoice, total)),
                    // Exact tie: the invoice whose remaining amount sits
                    // closer to the credit wins; equal distances keep the
                    // first-seen invoice.
                    Some((current, score))
                        if total == score
                            && (amount - invoice.amount_remaining).abs()
                                < (amount - current.amount_remaining).abs() =>
                    {
                        Some((invoice, score))
                    }
                    other => other,
                };
            }
        }

        match best {
            Some((invoice, score)) if score >= self.min_score => MatchedRow {
                row: row.clone(),
                matched_customer: invoice.customer_name.clone(),
                invoice_number: invoice.number.clone(),
                confidence: format!("{}%", score.min(100)),
                invoice_link: invoice.hyperlink(),
            },
            _ => MatchedRow {
                row: row.clone(),
                matched_customer: String::new(),
                invoice_number: String::new(),
                confidence: String::new(),
                invoice_link: String::new(),
            },
        }
    }

    /// 50 points for an exact amount hit, 30 within 1% relative difference,
    /// else 0. Non-positive amounts on either side never score.
    fn amount_score(&self, txn: Decimal, remaining: Decimal) -> u32 {
        if txn <= Decimal::ZERO || remaining <= Decimal::ZERO {
            return 0;
        }
        let tolerance = Decimal::new(1, 2);
        let diff = (txn - remaining).abs();
        if diff < tolerance {
            return self.amount_exact_pts;
        }
        if diff / txn.max(remaining) <= tolerance {
            return self.amount_close_pts;
        }
        0
    }

    fn name_score(&self, description: &str, customer_name: &str) -> u32 {
        if description.is_empty() || customer_name.is_empty() {
            return 0;
        }
        let similarity = token_set_ratio(description, customer_name);
        (similarity * self.name_max_pts as f64 / 100.0).round() as u32
    }
}

/// Credit amounts arrive formatted ("1,500.00"); separators are stripped and
/// anything unparseable reads as zero, which makes the row ineligible.
fn parse_credit_amount(raw: &str) -> Decimal {
    let cleaned = raw.replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(cleaned).unwrap_or(Decimal::ZERO)
}

/// Fields that identify a transaction row across runs, used to skip rows an
/// earlier run already processed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey {
    pub date: String,
    pub credit_amount: String,
    pub description: String,
    pub bank_ref: String,
}

impl RowKey {
    pub fn of(row: &TransactionRow) -> Self {
        Self {
            date: row.date.clone(),
            credit_amount: row.credit_amount.clone(),
            description: row.description.clone(),
            bank_ref: row.bank_ref.clone(),
        }
    }
}

/// Drop rows whose key appeared in an earlier run's output.
pub fn filter_unprocessed(
    rows: Vec<TransactionRow>,
    seen: &HashSet<RowKey>,
) -> Vec<TransactionRow> {
    rows.into_iter()
        .filter(|row| !seen.contains(&RowKey::of(row)))
        .collect()
}
