use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use transcripts::{
    assemble::ColumnMapping,
    reconcile::{find_name_anchor, reconcile},
    sheet::{find_header_row, load_first_sheet, parse_sheet},
    CanonicalField, Config,
};

#[derive(Parser)]
#[command(name = "transcripts-inspect")]
#[command(about = "Show how one transcript workbook is parsed, reconciled and mapped")]
struct Args {
    /// Source workbook (.xls / .xlsx)
    file: PathBuf,

    /// Optional YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of data rows to print
    #[arg(short, long, default_value_t = 5)]
    rows: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    let cfg = Config::load(args.config.as_deref())?;
    info!("inspecting {}", args.file.display());

    // 1) raw sheet
    let raw = load_first_sheet(&args.file)?;
    println!("raw sheet: {} rows × {} columns", raw.height(), raw.width());

    // 2) header detection
    match find_header_row(&raw.rows, cfg.parse.header_scan_depth) {
        Some(i) => println!("header row: {} (0-based)", i),
        None => println!("header row: not found in first {} rows", cfg.parse.header_scan_depth),
    }

    // 3) labels as read
    let parsed = parse_sheet(&raw, &cfg.parse)?;
    println!("\nlabels:");
    for (i, label) in parsed.headers.iter().enumerate() {
        println!("  [{:>2}] {}", i, label);
    }
    if let Some(anchor) = find_name_anchor(&parsed.headers) {
        println!("name anchor: column {}", anchor);
    }

    // 4) after reconciliation
    let sheet = reconcile(parsed, &cfg.reconcile);
    println!("\nreconciled headers:");
    for (i, label) in sheet.headers.iter().enumerate() {
        println!("  [{:>2}] {}", i, label);
    }

    // 5) field mapping
    let mapping = ColumnMapping::from_headers(&sheet.headers);
    println!("\nfield mapping:");
    for field in CanonicalField::ALL {
        match mapping.column(field) {
            Some(col) => println!("  {:<20} ← column {}", field.header(), col),
            None => println!("  {:<20} (unmapped)", field.header()),
        }
    }

    // 6) first rows as records
    println!("\nfirst {} of {} data rows:", args.rows.min(sheet.rows.len()), sheet.rows.len());
    for row in sheet.rows.iter().take(args.rows) {
        let record = mapping.apply(row);
        let cells: Vec<String> = record.cells().iter().map(|c| c.to_string()).collect();
        println!("  {}", cells.join(" | "));
    }
    Ok(())
}
