use anyhow::Context;
use clap::Parser;
use logtriage::anomaly::{AnomalyMatcher, PatternCatalogue};
use logtriage::config::{GrammarVariant, MatchGranularity, TriageConfig};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Once;

fn init_parallelism() {
    static START: Once = Once::new();
    START.call_once(|| {
        let n = num_cpus::get();
        let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
    });
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logtriage=info".into()),
        )
        .init();
}

#[derive(Parser, Debug)]
#[command(name = "logtriage", version, about = "Reassemble, cluster and flag anomalies in application logs")]
struct Cli {
    /// Log file to analyse
    input: PathBuf,

    /// JSON configuration file; flags below override its values
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Known anomaly patterns (JSON array of case-insensitive regexes). Required.
    #[arg(long = "known-patterns", default_value = "known_anomalies.json")]
    known_patterns: PathBuf,

    /// False-positive patterns; missing file means nothing is suppressed
    #[arg(long = "false-positives", default_value = "false_positives.json")]
    false_positives: PathBuf,

    /// Number of clusters
    #[arg(long = "clusters", short = 'k')]
    clusters: Option<usize>,

    /// Seed for k-means++ initialisation
    #[arg(long = "seed")]
    seed: Option<u64>,

    #[arg(long = "max-iter")]
    max_iter: Option<usize>,

    /// Header grammar: with-pid | optional-pid
    #[arg(long = "grammar", value_enum)]
    grammar: Option<GrammarArg>,

    /// Anomaly matching unit: line | record
    #[arg(long = "match-on", value_enum)]
    match_on: Option<MatchArg>,

    /// Add per-user tallies taken straight from raw lines
    #[arg(long = "raw-user-counts")]
    raw_user_counts: bool,

    /// Print only a specific section: summary | records | clusters | anomalies | users | diagnostics
    #[arg(long = "only")]
    only: Option<String>,

    /// Write the plain-text anomaly report here
    #[arg(long = "anomaly-report")]
    anomaly_report: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum GrammarArg {
    WithPid,
    OptionalPid,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum MatchArg {
    Line,
    Record,
}

fn build_config(cli: &Cli) -> anyhow::Result<TriageConfig> {
    let mut config = match &cli.config {
        Some(path) => TriageConfig::load(path)?,
        None => TriageConfig::default(),
    };
    if let Some(k) = cli.clusters {
        config.clustering.clusters = k;
    }
    if let Some(seed) = cli.seed {
        config.clustering.seed = seed;
    }
    if let Some(m) = cli.max_iter {
        config.clustering.max_iter = m;
    }
    if cli.raw_user_counts {
        config.raw_user_counts = true;
    }
    if let Some(g) = cli.grammar {
        config.grammar = match g {
            GrammarArg::WithPid => GrammarVariant::WithPid,
            GrammarArg::OptionalPid => GrammarVariant::OptionalPid,
        };
    }
    if let Some(m) = cli.match_on {
        config.match_on = match m {
            MatchArg::Line => MatchGranularity::Line,
            MatchArg::Record => MatchGranularity::Record,
        };
    }
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    init_logging();
    init_parallelism();
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    // Catalogues and input are checked before any processing starts.
    let known = PatternCatalogue::load_required(&cli.known_patterns)?;
    let false_positives = PatternCatalogue::load_optional(&cli.false_positives)?;
    let matcher = AnomalyMatcher::new(known, false_positives);
    let decoded = logtriage::source::read_log_file(&cli.input)?;

    let mut out = logtriage::pipeline::run(&decoded.lines, &config, &matcher)
        .with_context(|| format!("analysing {}", cli.input.display()))?;
    out.diagnostics.extend(decoded.diagnostics);

    if let Some(path) = &cli.anomaly_report {
        let mut f = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        for a in &out.anomalies {
            writeln!(f, "{}", a.report_line())?;
        }
        tracing::info!(path = %path.display(), anomalies = out.anomalies.len(), "wrote anomaly report");
    }

    let json = match cli.only.as_deref() {
        Some("summary") => serde_json::to_string_pretty(&out.summary)?,
        Some("records") => serde_json::to_string_pretty(&out.records)?,
        Some("clusters") => serde_json::to_string_pretty(&out.clustering)?,
        Some("anomalies") => serde_json::to_string_pretty(&out.anomalies)?,
        Some("users") => serde_json::to_string_pretty(&out.users)?,
        Some("diagnostics") => serde_json::to_string_pretty(&out.diagnostics)?,
        Some(other) => anyhow::bail!("unknown section '{other}'"),
        None => serde_json::to_string_pretty(&out)?,
    };
    println!("{json}");
    Ok(())
}
