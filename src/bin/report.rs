use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use transcripts::{
    artifact::load_dataset,
    export::{write_csv, write_summary, CSV_FILE, SUMMARY_FILE},
    stats::aggregate_with,
    Config, FrequencyTable,
};

#[derive(Parser, Debug)]
#[command(
    name = "transcripts-report",
    about = "Overview statistics for the consolidated transcript artifact"
)]
struct Args {
    /// Optional YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data root holding raw/ and processing/
    #[arg(long, env = "TRANSCRIPTS_BASE")]
    base: Option<PathBuf>,

    /// Also write exported_data.csv and statistics.json into processing/
    #[arg(long)]
    export: bool,

    /// How many subjects to list
    #[arg(long, default_value_t = 10)]
    top: usize,
}

fn print_table(title: &str, table: &FrequencyTable) {
    println!("\n{}:", title);
    for (key, count) in table.most_common() {
        println!("  {:<20} {:>6}", key, count);
    }
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cfg = Config::load(args.config.as_deref())?.with_base_path(args.base);

    let artifact = cfg.artifact_path();
    let dataset = load_dataset(&artifact, cfg.min_student_id_len)
        .with_context(|| format!("loading {}", artifact.display()))?;
    let stats = aggregate_with(dataset.records(), cfg.pass_threshold);

    println!("OVERVIEW");
    println!("  total records: {}", stats.total_records);
    println!("  mean score:    {:.2}", stats.avg_score);
    println!("  pass rate:     {:.1}%", stats.pass_rate);
    println!("  score range:   {:.2} – {:.2}", stats.min_score, stats.max_score);
    println!("  subjects:      {}", stats.by_subject.len());
    print_table("By cohort", &stats.by_cohort);
    print_table("By semester", &stats.by_semester);

    println!("\nTop {} subjects:", args.top);
    for (i, (subject, count)) in stats.by_subject.top(args.top).into_iter().enumerate() {
        println!("  {:>2}. {:<30} {:>6}", i + 1, subject, count);
    }

    if args.export {
        let out_dir = cfg.processing_path();
        write_csv(dataset.records(), out_dir.join(CSV_FILE))?;
        write_summary(&stats, out_dir.join(SUMMARY_FILE))?;
        info!(dir = %out_dir.display(), "exports written");
    }
    Ok(())
}
