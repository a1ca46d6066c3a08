use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use solvi_core::Money;

use crate::bai2::FileRecord;

/// Static column values stamped onto every exported transaction row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportProfile {
    pub account_title: String,
    pub entity: String,
}

impl Default for ExportProfile {
    fn default() -> Self {
        Self {
            account_title: "AR Account".to_string(),
            entity: String::new(),
        }
    }
}

/// Fully-denormalized balance view: one row per balance entry, carrying
/// every ancestor and trailer field.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceRow {
    pub file_sender_id: String,
    pub file_receiver_id: String,
    pub file_creation_date: String,
    pub file_creation_time: String,
    pub resend_indicator: String,
    pub group_originator_id: String,
    pub group_receiver_id: String,
    pub group_status: String,
    pub as_of_date: String,
    pub as_of_time: String,
    pub as_of_date_modifier: String,
    pub currency: String,
    pub customer_account: String,
    pub balance_type_code: String,
    pub balance_amount: String,
    pub balance_item_count: String,
    pub balance_funds_type: String,
    pub account_control_total: String,
    pub account_record_count: String,
    pub group_control_total: String,
    pub group_record_count: String,
    pub file_control_total: String,
    pub file_record_count: String,
}

impl BalanceRow {
    pub const HEADERS: [&'static str; 23] = [
        "file_sender_id",
        "file_receiver_id",
        "file_creation_date",
        "file_creation_time",
        "resend_indicator",
        "group_originator_id",
        "group_receiver_id",
        "group_status",
        "as_of_date",
        "as_of_time",
        "as_of_date_modifier",
        "currency",
        "customer_account",
        "balance_type_code",
        "balance_amount",
        "balance_item_count",
        "balance_funds_type",
        "account_control_total",
        "account_record_count",
        "group_control_total",
        "group_record_count",
        "file_control_total",
        "file_record_count",
    ];

    pub fn record(&self) -> [&str; 23] {
        [
            &self.file_sender_id,
            &self.file_receiver_id,
            &self.file_creation_date,
            &self.file_creation_time,
            &self.resend_indicator,
            &self.group_originator_id,
            &self.group_receiver_id,
            &self.group_status,
            &self.as_of_date,
            &self.as_of_time,
            &self.as_of_date_modifier,
            &self.currency,
            &self.customer_account,
            &self.balance_type_code,
            &self.balance_amount,
            &self.balance_item_count,
            &self.balance_funds_type,
            &self.account_control_total,
            &self.account_record_count,
            &self.group_control_total,
            &self.group_record_count,
            &self.file_control_total,
            &self.file_record_count,
        ]
    }
}

/// Compact inherited-context transaction view in spreadsheet column order.
/// Credit and debit amounts are mutually exclusive on each row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionRow {
    pub date: String,
    pub bank_id: String,
    pub account_number: String,
    pub account_title: String,
    pub entity: String,
    pub tran_type: String,
    pub type_code: String,
    pub currency: String,
    pub credit_amount: String,
    pub debit_amount: String,
    pub bank_ref: String,
    pub end_to_end_id: String,
    pub customer_ref: String,
    pub description: String,
    pub reason_for_payment: String,
    pub notes: String,
}

impl TransactionRow {
    pub const HEADERS: [&'static str; 16] = [
        "Date",
        "Bank ID",
        "Account Number",
        "Account Title",
        "Entity",
        "Tran Type",
        "BAI Type Code",
        "Currency",
        "Credit Amount",
        "Debit Amount",
        "Bank Ref #",
        "End to End ID",
        "Customer Ref #",
        "Description",
        "Reason for Payment",
        "Notes",
    ];

    pub fn record(&self) -> [&str; 16] {
        [
            &self.date,
            &self.bank_id,
            &self.account_number,
            &self.account_title,
            &self.entity,
            &self.tran_type,
            &self.type_code,
            &self.currency,
            &self.credit_amount,
            &self.debit_amount,
            &self.bank_ref,
            &self.end_to_end_id,
            &self.customer_ref,
            &self.description,
            &self.reason_for_payment,
            &self.notes,
        ]
    }
}

/// Flatten every balance entry into one denormalized row, in file order.
pub fn balance_rows(file: &FileRecord) -> Vec<BalanceRow> {
    let mut rows = Vec::new();
    for group in &file.groups {
        for account in &group.accounts {
            for balance in &account.balances {
                rows.push(BalanceRow {
                    file_sender_id: file.sender_id.clone(),
                    file_receiver_id: file.receiver_id.clone(),
                    file_creation_date: file.creation_date.clone(),
                    file_creation_time: file.creation_time.clone(),
                    resend_indicator: file.resend_indicator.clone(),
                    group_originator_id: group.originator_id.clone(),
                    group_receiver_id: group.ultimate_receiver_id.clone(),
                    group_status: group.status.clone(),
                    as_of_date: group.as_of_date.clone(),
                    as_of_time: group.as_of_time.clone(),
                    as_of_date_modifier: group.as_of_date_modifier.clone(),
                    currency: if account.currency.is_empty() {
                        group.currency.clone()
                    } else {
                        account.currency.clone()
                    },
                    customer_account: account.customer_account.clone(),
                    balance_type_code: balance.type_code.clone(),
                    balance_amount: balance.amount.clone(),
                    balance_item_count: balance.item_count.clone(),
                    balance_funds_type: balance.funds_type.clone(),
                    account_control_total: account.control_total.clone(),
                    account_record_count: account.record_count.clone(),
                    group_control_total: group.control_total.clone(),
                    group_record_count: group.record_count.clone(),
                    file_control_total: file.control_total.clone(),
                    file_record_count: file.record_count.clone(),
                });
            }
        }
    }
    rows
}

/// Flatten every transaction into one export row, in file order, using the
/// context snapshot taken at parse time.
pub fn transaction_rows(file: &FileRecord, profile: &ExportProfile) -> Vec<TransactionRow> {
    let mut rows = Vec::new();
    for group in &file.groups {
        for account in &group.accounts {
            for txn in &account.transactions {
                let credit = is_credit(&txn.type_code);
                let amount = format_minor_units(&txn.amount);
                rows.push(TransactionRow {
                    date: format_bai_date(&txn.context.as_of_date),
                    bank_id: txn.context.bank_id.clone(),
                    account_number: txn.context.account_id.clone(),
                    account_title: profile.account_title.clone(),
                    entity: profile.entity.clone(),
                    tran_type: type_label(&txn.type_code),
                    type_code: txn.type_code.clone(),
                    currency: txn.context.currency.clone(),
                    credit_amount: if credit { amount.clone() } else { String::new() },
                    debit_amount: if credit { String::new() } else { amount },
                    bank_ref: txn.bank_ref.clone(),
                    end_to_end_id: String::new(),
                    customer_ref: txn.customer_ref.clone(),
                    description: txn.text.clone(),
                    reason_for_payment: String::new(),
                    notes: String::new(),
                });
            }
        }
    }
    rows
}

/// Type codes 100-399 report money in; 400-699 report money out. Anything
/// unparseable or out of range is treated as a debit.
pub fn is_credit(type_code: &str) -> bool {
    type_code
        .trim()
        .parse::<u32>()
        .map_or(false, |code| (100..=399).contains(&code))
}

fn known_label(type_code: &str) -> Option<&'static str> {
    Some(match type_code {
        "169" => "ACH CREDIT",
        "174" => "Miscellaneous ACH Credit",
        "195" => "WIRE TRANSFER CREDIT",
        "214" => "FX Wire Transfer Credit",
        "301" => "MOBILE DEPOSIT",
        "469" => "ACH DEBIT",
        "495" => "WIRE TRANSFER DEBIT",
        "496" => "FX Wire Transfer Debit",
        "575" => "ZERO BAL TRF DEBIT",
        _ => return None,
    })
}

/// Human label for a type code, falling back to `Credit (<code>)` /
/// `Debit (<code>)` for codes outside the known table.
pub fn type_label(type_code: &str) -> String {
    if let Some(label) = known_label(type_code) {
        return label.to_string();
    }
    let side = if is_credit(type_code) { "Credit" } else { "Debit" };
    format!("{side} ({type_code})")
}

/// BAI2 amounts are integer strings in minor units. Unparseable input is
/// passed through untouched so the export never loses a row.
pub fn format_minor_units(raw: &str) -> String {
    match raw.trim().parse::<i64>() {
        Ok(cents) => Money::from_cents(cents).grouped(),
        Err(_) => raw.to_string(),
    }
}

/// 6-digit YYMMDD or 8-digit YYYYMMDD to M/D/YYYY without leading zeros;
/// anything else passes through.
pub fn format_bai_date(raw: &str) -> String {
    let raw = raw.trim();
    let parsed = match raw.len() {
        6 => NaiveDate::parse_from_str(raw, "%y%m%d"),
        8 => NaiveDate::parse_from_str(raw, "%Y%m%d"),
        _ => return raw.to_string(),
    };
    match parsed {
        Ok(date) => format!("{}/{}/{}", date.month(), date.day(), date.year()),
        Err(_) => raw.to_string(),
    }
}
