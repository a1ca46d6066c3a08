use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use solvi_core::Invoice;
use solvi_import::{
    bai2, balance_rows, export, filter_unprocessed, transaction_rows, ExportProfile,
    InvoiceMatchEngine,
};

/// Daily bank cash-position ingest and AR cash application.
#[derive(Debug, Parser)]
#[command(name = "solvi", version, about = "BAI2 ingest and invoice matching")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a BAI2 file and write transaction and balance CSVs.
    Ingest {
        /// Path to the raw BAI2 file.
        file: PathBuf,
        /// Directory receiving `<stem>_transactions.csv` and `<stem>_balances.csv`.
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Static "Entity" column value stamped onto every transaction row.
        #[arg(long, default_value = "")]
        entity: String,
        /// Static "Account Title" column value.
        #[arg(long, default_value = "AR Account")]
        account_title: String,
    },
    /// Match a BAI2 file's credits against open invoices and write the
    /// annotated CSV.
    Match {
        /// Path to the raw BAI2 file.
        file: PathBuf,
        /// JSON array of open invoices.
        #[arg(long)]
        invoices: PathBuf,
        /// Output CSV path.
        #[arg(long)]
        output: PathBuf,
        /// A previous run's matched CSV; rows already present there are skipped.
        #[arg(long)]
        skip_matched: Option<PathBuf>,
        /// Static "Entity" column value stamped onto every transaction row.
        #[arg(long, default_value = "")]
        entity: String,
        /// Static "Account Title" column value.
        #[arg(long, default_value = "AR Account")]
        account_title: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Ingest {
            file,
            out_dir,
            entity,
            account_title,
        } => ingest(
            &file,
            &out_dir,
            &ExportProfile {
                account_title,
                entity,
            },
        ),
        Command::Match {
            file,
            invoices,
            output,
            skip_matched,
            entity,
            account_title,
        } => run_match(
            &file,
            &invoices,
            &output,
            skip_matched.as_deref(),
            &ExportProfile {
                account_title,
                entity,
            },
        ),
    }
}

fn decode(file: &Path) -> Result<bai2::FileRecord> {
    tracing::info!("Parsing BAI2 file: {}", file.display());
    let content = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let decoded = bai2::parse(&content)?;
    if !decoded.orphans.is_empty() {
        tracing::warn!(
            "{} transaction(s) arrived outside any open account",
            decoded.orphans.len()
        );
    }
    Ok(decoded)
}

fn ingest(file: &Path, out_dir: &Path, profile: &ExportProfile) -> Result<()> {
    let decoded = decode(file)?;

    let txns = transaction_rows(&decoded, profile);
    let balances = balance_rows(&decoded);
    tracing::info!(
        "Decoded {} transaction row(s), {} balance row(s)",
        txns.len(),
        balances.len()
    );

    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("bai2");

    let txn_path = out_dir.join(format!("{stem}_transactions.csv"));
    export::write_transaction_rows(File::create(&txn_path)?, &txns)?;
    tracing::info!("Wrote {} row(s) to {}", txns.len(), txn_path.display());

    let bal_path = out_dir.join(format!("{stem}_balances.csv"));
    export::write_balance_rows(File::create(&bal_path)?, &balances)?;
    tracing::info!("Wrote {} row(s) to {}", balances.len(), bal_path.display());

    Ok(())
}

fn run_match(
    file: &Path,
    invoices_path: &Path,
    output: &Path,
    skip_matched: Option<&Path>,
    profile: &ExportProfile,
) -> Result<()> {
    let decoded = decode(file)?;
    let mut rows = transaction_rows(&decoded, profile);
    tracing::info!("Decoded {} transaction row(s)", rows.len());

    if let Some(prev) = skip_matched {
        let seen = export::read_matched_keys(
            File::open(prev).with_context(|| format!("failed to open {}", prev.display()))?,
        )?;
        let before = rows.len();
        rows = filter_unprocessed(rows, &seen);
        tracing::info!(
            "Skipping {} row(s) already matched in a previous run",
            before - rows.len()
        );
    }

    let invoices: Vec<Invoice> = serde_json::from_reader(
        File::open(invoices_path)
            .with_context(|| format!("failed to open {}", invoices_path.display()))?,
    )
    .with_context(|| format!("failed to parse invoices from {}", invoices_path.display()))?;
    tracing::info!("Loaded {} open invoice(s)", invoices.len());

    let matched = InvoiceMatchEngine::default().match_rows(&rows, &invoices);
    let hits = matched
        .iter()
        .filter(|m| !m.invoice_number.is_empty())
        .count();
    tracing::info!("Matched {} of {} transaction(s)", hits, matched.len());

    export::write_matched_rows(
        File::create(output).with_context(|| format!("failed to create {}", output.display()))?,
        &matched,
    )?;
    tracing::info!("Wrote {}", output.display());

    Ok(())
}
