use anyhow::{Context, Result};
use clap::Parser;
use std::{path::PathBuf, time::Instant};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use transcripts::{artifact::write_artifact, assemble_tree, Config};

#[derive(Parser, Debug)]
#[command(
    name = "transcripts",
    about = "Merge per-class transcript workbooks into one consolidated artifact"
)]
struct Args {
    /// Optional YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data root holding raw/ and processing/
    #[arg(long, env = "TRANSCRIPTS_BASE")]
    base: Option<PathBuf>,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) configure dirs ───────────────────────────────────────────
    let args = Args::parse();
    let cfg = Config::load(args.config.as_deref())?.with_base_path(args.base);
    info!(
        raw = %cfg.raw_path().display(),
        artifact = %cfg.artifact_path().display(),
        "startup"
    );

    // ─── 3) parse, reconcile and map every source workbook ───────────
    let start = Instant::now();
    let assembly = assemble_tree(&cfg)?;

    // ─── 4) write the consolidated artifact ──────────────────────────
    let output = cfg.artifact_path();
    write_artifact(&assembly.records, &output)
        .with_context(|| format!("writing artifact {}", output.display()))?;
    info!("done in {:?}", start.elapsed());

    // ─── 5) tally ────────────────────────────────────────────────────
    println!("SUMMARY");
    println!("  files processed: {}", assembly.attempted());
    println!("  succeeded:       {}", assembly.succeeded());
    println!("  failed:          {}", assembly.failed());
    println!("  total rows:      {}", assembly.total_rows());
    println!("  output:          {}", output.display());
    Ok(())
}
