use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::{ops::RangeInclusive, path::PathBuf};
use tracing_subscriber::{fmt, EnvFilter};
use transcripts::{
    artifact::load_dataset,
    query::{distinct_values, RecordQuery, RetakeFilter, ScoreBand, DEFAULT_DISPLAY_LIMIT},
    CanonicalField, CanonicalRecord, Config,
};

#[derive(Parser, Debug)]
#[command(
    name = "transcripts-search",
    about = "Search and filter students in the consolidated transcript artifact"
)]
struct Args {
    /// Optional YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data root holding raw/ and processing/
    #[arg(long, env = "TRANSCRIPTS_BASE")]
    base: Option<PathBuf>,

    /// Name words, in any order ("thế phú")
    #[arg(long)]
    name: Option<String>,

    /// Part of a student ID
    #[arg(long)]
    id: Option<String>,

    #[arg(long)]
    semester: Option<String>,

    #[arg(long)]
    cohort: Option<String>,

    #[arg(long)]
    subject: Option<String>,

    /// pass | fail | excellent | good | fair | average
    #[arg(long)]
    band: Option<String>,

    /// Inclusive score range, e.g. 2.5..3.2
    #[arg(long)]
    score: Option<String>,

    /// Inclusive total-credit range, e.g. 60..120
    #[arg(long)]
    credits: Option<String>,

    /// none | any | many
    #[arg(long)]
    retake: Option<String>,

    /// Print every match instead of the first few
    #[arg(long)]
    all: bool,

    /// Maximum matches to print
    #[arg(long, default_value_t = DEFAULT_DISPLAY_LIMIT)]
    limit: usize,

    /// List the distinct semesters, cohorts and subjects, then exit
    #[arg(long)]
    options: bool,
}

fn parse_range(s: &str) -> Result<RangeInclusive<f64>> {
    let (lo, hi) = s
        .split_once("..")
        .ok_or_else(|| anyhow!("range {:?} must look like LOW..HIGH", s))?;
    let lo: f64 = lo.trim().parse().with_context(|| format!("bad lower bound in {:?}", s))?;
    let hi: f64 = hi.trim().parse().with_context(|| format!("bad upper bound in {:?}", s))?;
    Ok(lo..=hi)
}

fn build_query(args: &Args) -> Result<RecordQuery> {
    let mut q = RecordQuery {
        name: args.name.clone(),
        student_id: args.id.clone(),
        semester: args.semester.clone(),
        cohort: args.cohort.clone(),
        subject: args.subject.clone(),
        ..RecordQuery::default()
    };
    if let Some(b) = &args.band {
        q = q.band(ScoreBand::parse(b).ok_or_else(|| anyhow!("unknown score band {:?}", b))?);
    }
    if let Some(r) = &args.retake {
        q = q.retake(RetakeFilter::parse(r).ok_or_else(|| anyhow!("unknown retake filter {:?}", r))?);
    }
    if let Some(s) = &args.score {
        q = q.score_range(parse_range(s)?);
    }
    if let Some(c) = &args.credits {
        q = q.credit_range(parse_range(c)?);
    }
    Ok(q)
}

fn print_record(r: &CanonicalRecord) {
    println!(
        "{:<12} {:<28} {:>6} {:>5} {:>4}  {}/{}/{}",
        r.student_id(),
        r.full_name(),
        r.text(CanonicalField::AverageScore),
        r.text(CanonicalField::TotalCredits),
        r.text(CanonicalField::RetakeCredits),
        r.text(CanonicalField::Semester),
        r.text(CanonicalField::Cohort),
        r.text(CanonicalField::Subject),
    );
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cfg = Config::load(args.config.as_deref())?.with_base_path(args.base.clone());
    let artifact = cfg.artifact_path();
    let dataset = load_dataset(&artifact, cfg.min_student_id_len)
        .with_context(|| format!("loading {}", artifact.display()))?;

    if args.options {
        for field in [CanonicalField::Semester, CanonicalField::Cohort, CanonicalField::Subject] {
            println!("{}: {}", field.header(), distinct_values(dataset.records(), field).join(", "));
        }
        return Ok(());
    }

    let query = build_query(&args)?;
    let found = query.run(dataset.records());
    let shown = if args.all { found.len() } else { found.len().min(args.limit) };

    println!("{} of {} records match", found.len(), dataset.len());
    for record in &found[..shown] {
        print_record(record);
    }
    if shown < found.len() {
        println!("… {} more (use --all)", found.len() - shown);
    }
    Ok(())
}
