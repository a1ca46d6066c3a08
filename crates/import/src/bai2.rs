use thiserror::Error;

// BAI2 record type tags (first field of every line).
const RT_FILE_HEADER: &str = "01";
const RT_GROUP_HEADER: &str = "02";
const RT_ACCOUNT_HEADER: &str = "03";
const RT_TRANSACTION: &str = "16";
const RT_ACCOUNT_TRAILER: &str = "49";
const RT_CONTINUATION: &str = "88";
const RT_GROUP_TRAILER: &str = "98";
const RT_FILE_TRAILER: &str = "99";

/// Decoded BAI2 file: a 4-level ownership tree in file order.
/// Trailer fields stay empty until the matching trailer record is seen;
/// a truncated file simply leaves them empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileRecord {
    pub sender_id: String,
    pub receiver_id: String,
    pub creation_date: String,
    pub creation_time: String,
    pub resend_indicator: String,
    pub record_size: String,
    pub blocking_factor: String,
    pub version_number: String,
    pub groups: Vec<GroupRecord>,
    /// Transactions seen while no account was open. Kept visible for
    /// diagnostics; excluded from the row projections.
    pub orphans: Vec<TransactionRecord>,
    pub control_total: String,
    pub record_count: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupRecord {
    pub ultimate_receiver_id: String,
    pub originator_id: String,
    pub status: String,
    pub as_of_date: String,
    pub as_of_time: String,
    pub currency: String,
    pub as_of_date_modifier: String,
    pub accounts: Vec<AccountRecord>,
    pub control_total: String,
    pub record_count: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountRecord {
    pub customer_account: String,
    pub currency: String,
    pub balances: Vec<BalanceEntry>,
    pub transactions: Vec<TransactionRecord>,
    pub control_total: String,
    pub record_count: String,
}

/// One type/amount/count/funds quadruple from an `03` header. The header
/// may repeat the quadruple any number of times.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceEntry {
    pub type_code: String,
    pub amount: String,
    pub item_count: String,
    pub funds_type: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionRecord {
    pub type_code: String,
    /// Decimal-as-string in minor currency units, exactly as reported.
    pub amount: String,
    pub funds_type: String,
    pub bank_ref: String,
    pub customer_ref: String,
    pub text: String,
    pub context: InheritedContext,
}

/// Ancestor fields copied onto a transaction at construction time, so row
/// exports never have to re-walk the tree. Empty when the transaction was
/// seen without both an open account and an open group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InheritedContext {
    pub account_id: String,
    pub currency: String,
    pub as_of_date: String,
    pub as_of_time: String,
    pub as_of_date_modifier: String,
    pub bank_id: String,
    pub customer_id: String,
    pub file_date: String,
    pub file_time: String,
}

#[derive(Error, Debug)]
pub enum Bai2Error {
    #[error("file is empty")]
    EmptyFile,
    #[error("no file header (01) record found")]
    MissingFileHeader,
}

/// Currently-open record per level. The account pointer carries its owning
/// group index so it stays valid after the group pointer moves on.
#[derive(Default)]
struct Cursor {
    group: Option<usize>,
    account: Option<(usize, usize)>,
}

pub struct Bai2Parser;

impl Bai2Parser {
    /// Decode a full BAI2 file. Fails only on empty content or a missing
    /// file header; individual malformed lines are skipped or defaulted.
    pub fn parse(content: &str) -> Result<FileRecord, Bai2Error> {
        if content.trim().is_empty() {
            return Err(Bai2Error::EmptyFile);
        }

        let records = join_continuations(content);
        if !records
            .iter()
            .any(|r| r.split(',').next() == Some(RT_FILE_HEADER))
        {
            return Err(Bai2Error::MissingFileHeader);
        }

        let mut file = FileRecord::default();
        let mut cursor = Cursor::default();

        for record in &records {
            if record.trim().is_empty() {
                continue;
            }
            let fields = split_fields(record);

            match field(&fields, 0) {
                RT_FILE_HEADER => {
                    file.sender_id = field(&fields, 1).to_string();
                    file.receiver_id = field(&fields, 2).to_string();
                    file.creation_date = field(&fields, 3).to_string();
                    file.creation_time = field(&fields, 4).to_string();
                    file.resend_indicator = field(&fields, 5).to_string();
                    file.record_size = field(&fields, 6).to_string();
                    file.blocking_factor = field(&fields, 7).to_string();
                    file.version_number = field(&fields, 8).to_string();
                }
                RT_GROUP_HEADER => {
                    file.groups.push(GroupRecord {
                        ultimate_receiver_id: field(&fields, 1).to_string(),
                        originator_id: field(&fields, 2).to_string(),
                        status: field(&fields, 3).to_string(),
                        as_of_date: field(&fields, 4).to_string(),
                        as_of_time: field(&fields, 5).to_string(),
                        currency: field(&fields, 6).to_string(),
                        as_of_date_modifier: field(&fields, 7).to_string(),
                        ..GroupRecord::default()
                    });
                    cursor.group = Some(file.groups.len() - 1);
                }
                RT_ACCOUNT_HEADER => {
                    cursor.account = match cursor.group {
                        Some(g) => {
                            let mut account = AccountRecord {
                                customer_account: field(&fields, 1).to_string(),
                                currency: field(&fields, 2).to_string(),
                                ..AccountRecord::default()
                            };
                            // Repeating balance quadruples from position 3 to
                            // end-of-fields; an empty type code drops the entry.
                            let mut i = 3;
                            while i < fields.len() {
                                let entry = BalanceEntry {
                                    type_code: field(&fields, i).to_string(),
                                    amount: field(&fields, i + 1).to_string(),
                                    item_count: field(&fields, i + 2).to_string(),
                                    funds_type: field(&fields, i + 3).to_string(),
                                };
                                if !entry.type_code.is_empty() {
                                    account.balances.push(entry);
                                }
                                i += 4;
                            }
                            let group = &mut file.groups[g];
                            group.accounts.push(account);
                            Some((g, group.accounts.len() - 1))
                        }
                        // An 03 outside any group opens nothing; subsequent
                        // transactions land in the orphans bucket.
                        None => None,
                    };
                }
                RT_TRANSACTION => {
                    let mut txn = TransactionRecord {
                        type_code: field(&fields, 1).to_string(),
                        amount: field(&fields, 2).to_string(),
                        funds_type: field(&fields, 3).to_string(),
                        bank_ref: field(&fields, 4).to_string(),
                        customer_ref: field(&fields, 5).to_string(),
                        // Memo text may itself contain the field separator.
                        text: if fields.len() > 6 {
                            fields[6..].join(",")
                        } else {
                            String::new()
                        },
                        ..TransactionRecord::default()
                    };

                    if let (Some(g), Some((ag, ai))) = (cursor.group, cursor.account) {
                        let group = &file.groups[g];
                        let account = &file.groups[ag].accounts[ai];
                        txn.context = InheritedContext {
                            account_id: account.customer_account.clone(),
                            currency: if account.currency.is_empty() {
                                group.currency.clone()
                            } else {
                                account.currency.clone()
                            },
                            as_of_date: group.as_of_date.clone(),
                            as_of_time: group.as_of_time.clone(),
                            as_of_date_modifier: group.as_of_date_modifier.clone(),
                            bank_id: group.originator_id.clone(),
                            customer_id: group.ultimate_receiver_id.clone(),
                            file_date: file.creation_date.clone(),
                            file_time: file.creation_time.clone(),
                        };
                    }

                    match cursor.account {
                        Some((ag, ai)) => file.groups[ag].accounts[ai].transactions.push(txn),
                        None => file.orphans.push(txn),
                    }
                }
                RT_ACCOUNT_TRAILER => {
                    if let Some((ag, ai)) = cursor.account {
                        let account = &mut file.groups[ag].accounts[ai];
                        account.control_total = field(&fields, 1).to_string();
                        account.record_count = field(&fields, 2).to_string();
                    }
                }
                RT_GROUP_TRAILER => {
                    if let Some(g) = cursor.group {
                        let group = &mut file.groups[g];
                        group.control_total = field(&fields, 1).to_string();
                        group.record_count = field(&fields, 2).to_string();
                    }
                    cursor.account = None;
                }
                RT_FILE_TRAILER => {
                    file.control_total = field(&fields, 1).to_string();
                    file.record_count = field(&fields, 2).to_string();
                    cursor.group = None;
                }
                _ => {}
            }
        }

        Ok(file)
    }
}

/// Merge `88` continuation records into the preceding logical record: strip
/// the previous record's trailing `/` terminator, then append the payload.
/// Single left-to-right pass; consecutive continuations chain naturally.
fn join_continuations(content: &str) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for line in content.lines() {
        if line.is_empty() {
            continue;
        }
        let tag = line.split(',').next().unwrap_or("");
        match merged.last_mut() {
            Some(prev) if tag == RT_CONTINUATION => {
                let payload = line
                    .strip_prefix("88,")
                    .unwrap_or(&line[RT_CONTINUATION.len()..]);
                let keep = prev.trim_end_matches('/').len();
                prev.truncate(keep);
                prev.push_str(payload);
            }
            // An 88 with nothing before it is kept as-is; dispatch ignores it.
            _ => merged.push(line.to_string()),
        }
    }
    merged
}

/// Strip the `/` record terminator and any trailing field separators, then
/// split on the separator.
fn split_fields(line: &str) -> Vec<&str> {
    line.trim_end_matches('/')
        .trim_end_matches(',')
        .split(',')
        .collect()
}

/// Positional field access; positions past the end read as empty.
fn field<'a>(fields: &[&'a str], idx: usize) -> &'a str {
    fields.get(idx).copied().unwrap_or("")
}

pub fn parse(content: &str) -> Result<FileRecord, Bai2Error> {
    Bai2Parser::parse(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
01,122099999,9876543210,260730,0630,1,80,10,2/
02,9876543210,121000248,1,260730,0630,USD,2/
03,4400221100,USD,010,4350000,,,015,4200000,,/
16,169,150000,0,WT5501,INV1001,ACH PAYMENT ACME CO/
88,RP INVOICE 2041
16,495,98000,0,WT5502,,WIRE OUT VENDOR LLC/
49,4598000,6/
98,4598000,1,8/
99,4598000,1,10/
";

    // ── line pre-processing ───────────────────────────────────────────────────

    #[test]
    fn join_continuations_extends_previous_record() {
        let merged = join_continuations("16,169,100,0,R1,C1,PART ONE /\n88, PART TWO/\n");
        assert_eq!(merged, vec!["16,169,100,0,R1,C1,PART ONE  PART TWO/"]);
    }

    #[test]
    fn join_continuations_chains() {
        let merged = join_continuations("16,169,100,0,R1,C1,AB/\n88,CD\n88,EF/\n");
        assert_eq!(merged, vec!["16,169,100,0,R1,C1,ABCDEF/"]);
    }

    #[test]
    fn join_continuations_without_predecessor_keeps_line() {
        let merged = join_continuations("88,floating/\n01,A,B/\n");
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], "88,floating/");
    }

    #[test]
    fn split_fields_strips_terminator_and_trailing_separators() {
        assert_eq!(split_fields("49,900,5/"), vec!["49", "900", "5"]);
        assert_eq!(split_fields("03,123,USD,,,/"), vec!["03", "123", "USD"]);
    }

    #[test]
    fn field_defaults_missing_positions() {
        let fields = split_fields("01,SENDER/");
        assert_eq!(field(&fields, 1), "SENDER");
        assert_eq!(field(&fields, 7), "");
    }

    // ── structural errors ─────────────────────────────────────────────────────

    #[test]
    fn empty_input_errors() {
        assert!(matches!(parse(""), Err(Bai2Error::EmptyFile)));
        assert!(matches!(parse("  \n \n"), Err(Bai2Error::EmptyFile)));
    }

    #[test]
    fn missing_file_header_errors() {
        let content = "02,9876543210,121000248,1,260730,0630,USD,2/\n";
        assert!(matches!(parse(content), Err(Bai2Error::MissingFileHeader)));
    }

    #[test]
    fn header_only_file_is_valid_with_no_data() {
        let file = parse("01,122099999,9876543210,260730,0630,1,80,10,2/\n").unwrap();
        assert!(file.groups.is_empty());
        assert!(file.control_total.is_empty());
    }

    // ── full tree decode ──────────────────────────────────────────────────────

    #[test]
    fn parse_file_header_fields() {
        let file = parse(SAMPLE).unwrap();
        assert_eq!(file.sender_id, "122099999");
        assert_eq!(file.receiver_id, "9876543210");
        assert_eq!(file.creation_date, "260730");
        assert_eq!(file.creation_time, "0630");
        assert_eq!(file.resend_indicator, "1");
        assert_eq!(file.record_size, "80");
        assert_eq!(file.blocking_factor, "10");
        assert_eq!(file.version_number, "2");
    }

    #[test]
    fn parse_nesting_and_order() {
        let file = parse(SAMPLE).unwrap();
        assert_eq!(file.groups.len(), 1);
        assert_eq!(file.groups[0].accounts.len(), 1);
        let account = &file.groups[0].accounts[0];
        assert_eq!(account.customer_account, "4400221100");
        assert_eq!(account.transactions.len(), 2);
        assert_eq!(account.transactions[0].type_code, "169");
        assert_eq!(account.transactions[1].type_code, "495");
    }

    #[test]
    fn parse_balance_quadruples() {
        let file = parse(SAMPLE).unwrap();
        let balances = &file.groups[0].accounts[0].balances;
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].type_code, "010");
        assert_eq!(balances[0].amount, "4350000");
        assert_eq!(balances[1].type_code, "015");
        assert_eq!(balances[1].amount, "4200000");
        assert_eq!(balances[1].item_count, "");
    }

    #[test]
    fn balance_quadruple_with_empty_type_code_dropped() {
        let content = "\
01,S,R,260730,0630,1,80,10,2/
02,R,S,1,260730,0630,USD,2/
03,123,USD,,100,,,045,200,,/
99,0,1,4/
";
        let file = parse(content).unwrap();
        let balances = &file.groups[0].accounts[0].balances;
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].type_code, "045");
    }

    #[test]
    fn continuation_merges_into_memo() {
        let file = parse(SAMPLE).unwrap();
        let txn = &file.groups[0].accounts[0].transactions[0];
        assert_eq!(txn.text, "ACH PAYMENT ACME CORP INVOICE 2041");
    }

    #[test]
    fn continuation_round_trips_regardless_of_chunking() {
        let single = "\
01,S,R,260730,0630,1,80,10,2/
02,R,S,1,260730,0630,USD,2/
03,123,USD/
16,169,1000,0,R1,C1,PAYMENT FROM ACME CORP INVOICE 2041/
99,0,1,5/
";
        let chunked = "\
01,S,R,260730,0630,1,80,10,2/
02,R,S,1,260730,0630,USD,2/
03,123,USD/
16,169,1000,0,R1,C1,PAYMENT FR/
88,OM ACME CO
88,RP INVOICE 2041/
99,0,1,5/
";
        let a = parse(single).unwrap();
        let b = parse(chunked).unwrap();
        assert_eq!(
            a.groups[0].accounts[0].transactions[0].text,
            b.groups[0].accounts[0].transactions[0].text,
        );
    }

    #[test]
    fn memo_preserves_embedded_separators() {
        let content = "\
01,S,R,260730,0630,1,80,10,2/
02,R,S,1,260730,0630,USD,2/
03,123,USD/
16,169,1000,0,R1,C1,PAYMENT,ACME,CORP/
99,0,1,5/
";
        let file = parse(content).unwrap();
        assert_eq!(
            file.groups[0].accounts[0].transactions[0].text,
            "PAYMENT,ACME,CORP"
        );
    }

    #[test]
    fn inherited_context_matches_ancestors() {
        let file = parse(SAMPLE).unwrap();
        let ctx = &file.groups[0].accounts[0].transactions[0].context;
        assert_eq!(ctx.account_id, "4400221100");
        assert_eq!(ctx.currency, "USD");
        assert_eq!(ctx.as_of_date, "260730");
        assert_eq!(ctx.as_of_time, "0630");
        assert_eq!(ctx.as_of_date_modifier, "2");
        assert_eq!(ctx.bank_id, "121000248");
        assert_eq!(ctx.customer_id, "9876543210");
        assert_eq!(ctx.file_date, "260730");
        assert_eq!(ctx.file_time, "0630");
    }

    #[test]
    fn account_currency_falls_back_to_group() {
        let content = "\
01,S,R,260730,0630,1,80,10,2/
02,R,S,1,260730,0630,EUR,2/
03,123,,010,100,,/
16,169,1000,0,R1,C1,MEMO/
99,0,1,5/
";
        let file = parse(content).unwrap();
        let account = &file.groups[0].accounts[0];
        assert_eq!(account.currency, "");
        assert_eq!(account.transactions[0].context.currency, "EUR");
    }

    #[test]
    fn trailer_fields_set_when_trailers_present() {
        let file = parse(SAMPLE).unwrap();
        assert_eq!(file.groups[0].accounts[0].control_total, "4598000");
        assert_eq!(file.groups[0].accounts[0].record_count, "6");
        assert_eq!(file.groups[0].control_total, "4598000");
        assert_eq!(file.groups[0].record_count, "1");
        assert_eq!(file.control_total, "4598000");
        assert_eq!(file.record_count, "1");
    }

    #[test]
    fn truncated_file_leaves_trailers_empty() {
        let content = "\
01,S,R,260730,0630,1,80,10,2/
02,R,S,1,260730,0630,USD,2/
03,123,USD/
16,169,1000,0,R1,C1,MEMO/
";
        let file = parse(content).unwrap();
        assert_eq!(file.groups[0].accounts[0].transactions.len(), 1);
        assert!(file.groups[0].accounts[0].control_total.is_empty());
        assert!(file.groups[0].control_total.is_empty());
        assert!(file.control_total.is_empty());
    }

    #[test]
    fn orphan_transaction_without_account_is_collected() {
        let content = "\
01,S,R,260730,0630,1,80,10,2/
16,169,1000,0,R1,C1,LOST/
";
        let file = parse(content).unwrap();
        assert!(file.groups.is_empty());
        assert_eq!(file.orphans.len(), 1);
        assert_eq!(file.orphans[0].text, "LOST");
        assert_eq!(file.orphans[0].context, InheritedContext::default());
    }

    #[test]
    fn account_header_without_group_opens_nothing() {
        let content = "\
01,S,R,260730,0630,1,80,10,2/
03,123,USD/
16,169,1000,0,R1,C1,DANGLING/
";
        let file = parse(content).unwrap();
        assert!(file.groups.is_empty());
        assert_eq!(file.orphans.len(), 1);
    }

    #[test]
    fn unknown_record_types_ignored() {
        let content = "\
01,S,R,260730,0630,1,80,10,2/
02,R,S,1,260730,0630,USD,2/
36,anything,goes,here/
99,0,1,3/
";
        let file = parse(content).unwrap();
        assert_eq!(file.groups.len(), 1);
        assert_eq!(file.control_total, "0");
    }

    #[test]
    fn blank_and_crlf_lines_handled() {
        let content = "01,S,R,260730,0630,1,80,10,2/\r\n\r\n02,R,S,1,260730,0630,USD,2/\r\n99,0,1,3/\r\n";
        let file = parse(content).unwrap();
        assert_eq!(file.groups.len(), 1);
        assert_eq!(file.groups[0].currency, "USD");
    }

    #[test]
    fn decoding_is_idempotent() {
        assert_eq!(parse(SAMPLE).unwrap(), parse(SAMPLE).unwrap());
    }

    #[test]
    fn multiple_groups_and_accounts_preserve_order() {
        let content = "\
01,S,R,260730,0630,1,80,10,2/
02,R,BANK1,1,260730,0630,USD,2/
03,111,USD/
16,169,1000,0,R1,C1,FIRST/
49,1000,3/
98,1000,1,5/
02,R,BANK2,1,260730,0630,USD,2/
03,222,USD/
16,174,2000,0,R2,C2,SECOND/
49,2000,3/
98,2000,1,5/
99,3000,2,12/
";
        let file = parse(content).unwrap();
        assert_eq!(file.groups.len(), 2);
        assert_eq!(file.groups[0].accounts[0].customer_account, "111");
        assert_eq!(file.groups[1].accounts[0].customer_account, "222");
        assert_eq!(
            file.groups[1].accounts[0].transactions[0].context.bank_id,
            "BANK2"
        );
    }
}
