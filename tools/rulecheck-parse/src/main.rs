//! Reads one sentence per line on stdin and prints its rule tree as JSON.
//!
//! `--format slabel` expects markup such as `[设计压力/prop][不应大于/cmp][5MPa/Rprop]`;
//! `--format bio` expects `{"text": "…", "tags": ["B-prop", …]}` per line.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use rulecheck_core::{BioTag, Pipeline, PipelineConfig, RuleTree};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    Slabel,
    Bio,
}

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Line format on stdin
    #[arg(short, long, value_enum, default_value_t = InputFormat::Slabel)]
    format: InputFormat,

    /// Accept a requirement with no property before it
    #[arg(long, env = "RULECHECK_BARE_REQUIREMENT")]
    bare_requirement: bool,

    /// Fail on shape warnings instead of repairing
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct BioLine {
    text: String,
    tags: Vec<BioTag>,
}

#[derive(Debug, Serialize)]
struct ParseOutput {
    input: String,
    slabel: Option<String>,
    rule: Option<RuleTree>,
    outline: Option<String>,
    warnings: Vec<String>,
    error: Option<String>,
}

impl ParseOutput {
    fn failed(input: &str, error: impl ToString) -> Self {
        Self {
            input: input.to_string(),
            slabel: None,
            rule: None,
            outline: None,
            warnings: Vec::new(),
            error: Some(error.to_string()),
        }
    }
}

fn process(pipeline: &Pipeline, format: InputFormat, line: &str) -> ParseOutput {
    let (text, tags) = match format {
        InputFormat::Slabel => {
            let codec = pipeline.codec();
            let (iit, seq) = match codec.slabel_to_iit(line, false) {
                Ok(parsed) => parsed,
                Err(e) => return ParseOutput::failed(line, e),
            };
            let tags = codec.iit_to_bio(&iit, seq.chars().count()).into_value();
            (seq, tags)
        }
        InputFormat::Bio => match serde_json::from_str::<BioLine>(line) {
            Ok(bio) => (bio.text, bio.tags),
            Err(e) => return ParseOutput::failed(line, e),
        },
    };

    match pipeline.extract(&text, &tags) {
        Ok(out) => ParseOutput {
            input: line.to_string(),
            outline: out.rule.as_ref().map(|rule| rule.outline(&out.seq)),
            error: out.rule_error.map(|e| e.to_string()),
            warnings: out.warnings.iter().map(ToString::to_string).collect(),
            slabel: Some(out.slabel),
            rule: out.rule,
        },
        Err(e) => ParseOutput::failed(line, e),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::new()
        .with_bare_requirement(cli.bare_requirement)
        .with_strict_shape(cli.strict);
    let pipeline = Pipeline::new(config)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let output = process(&pipeline, cli.format, line);
        debug!(ok = output.error.is_none(), "processed line");
        writeln!(stdout, "{}", serde_json::to_string(&output)?)?;
    }

    Ok(())
}
