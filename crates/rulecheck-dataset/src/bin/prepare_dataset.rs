//! Turns the annotation tool's JSON export into train/val BIO datasets.
//!
//! Usage: cargo run --bin prepare-dataset -- --input data/sentences_all.json --output data/

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use rulecheck_core::{Pipeline, PipelineConfig, TrainingPair};
use rulecheck_dataset::{AnnotationRecord, Corpus, collect_tags, sync_tags_file, write_split};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Annotation JSON exported by the labeling tool
    #[arg(short, long, env = "RULECHECK_CORPUS", default_value = "data/sentences_all.json")]
    input: PathBuf,

    /// Dataset root; `train/` and `val/` are created below it
    #[arg(short, long, env = "RULECHECK_DATA_DIR", default_value = "data")]
    output: PathBuf,

    /// Share of sentences used for training
    #[arg(long, default_value_t = 0.8)]
    ratio: f64,

    /// Shuffle seed
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Model input length, including the leading [CLS]
    #[arg(long, env = "RULECHECK_MAX_LEN", default_value_t = 125)]
    max_len: usize,

    /// Save reconciled labels back to the input file (old file kept as .bak)
    #[arg(long)]
    write_back: bool,
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbosity {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn to_pairs(pipeline: &Pipeline, records: &[AnnotationRecord]) -> Result<Vec<TrainingPair>> {
    records
        .iter()
        .map(|record| {
            pipeline
                .prepare_training(&record.text, &record.label)
                .with_context(|| format!("sentence #{}", record.text_id))
        })
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let pipeline = Pipeline::new(PipelineConfig::new().with_max_len(cli.max_len))?;

    let mut corpus = Corpus::load(&cli.input)
        .with_context(|| format!("failed to load {}", cli.input.display()))?;
    corpus.validate()?;

    let updates = corpus.reconcile(pipeline.codec())?;
    if !updates.is_empty() {
        if cli.write_back {
            corpus.save_with_backup(&cli.input)?;
            info!(updates = updates.len(), "corpus written back");
        } else {
            warn!(
                updates = updates.len(),
                "corpus has stale labels or ids; rerun with --write-back to save them"
            );
        }
    }

    let split = corpus.split(cli.ratio, cli.seed)?;
    let train = to_pairs(&pipeline, &split.train)?;
    let val = to_pairs(&pipeline, &split.val)?;

    write_split(cli.output.join("train"), &train)?;
    write_split(cli.output.join("val"), &val)?;

    let tags = collect_tags(train.iter().chain(&val));
    if sync_tags_file(cli.output.join("tags.txt"), tags)? {
        warn!("tag set changed; retrain from scratch");
    }

    info!(
        total = corpus.len(),
        train = train.len(),
        val = val.len(),
        "dataset prepared"
    );
    Ok(())
}
