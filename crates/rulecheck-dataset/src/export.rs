//! BIO dataset files.
//!
//! Each split directory holds three parallel files:
//!
//! - `sentences.txt`: one sentence per line, tokens separated by a space
//! - `tags.txt`: one tag line per sentence, tags separated by a space
//! - `sentences&tags.txt`: tokens joined by four spaces, the tag line, then a blank line
//!
//! The dataset root also keeps a global `tags.txt` with the vocabulary, one tag per line.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use rulecheck_core::{BioTag, TagVocabulary, TrainingPair};
use tracing::{debug, info};

use crate::error::{DatasetError, Result};

pub const SENTENCES_FILE: &str = "sentences.txt";
pub const TAGS_FILE: &str = "tags.txt";
pub const COMBINED_FILE: &str = "sentences&tags.txt";

/// One sentence read back from a split directory, tags mapped to vocabulary ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedExample {
    pub tokens: Vec<String>,
    pub tag_ids: Vec<usize>,
}

/// Writes one split directory, creating it if needed.
pub fn write_split(dir: impl AsRef<Path>, pairs: &[TrainingPair]) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| DatasetError::io(dir, e))?;

    let mut sentences = String::new();
    let mut tags = String::new();
    let mut combined = String::new();
    for pair in pairs {
        let tag_line = join_tags(&pair.tags);

        sentences.push_str(&pair.tokens.join(" "));
        sentences.push('\n');
        tags.push_str(&tag_line);
        tags.push('\n');

        combined.push_str(&pair.tokens.join("    "));
        combined.push('\n');
        combined.push_str(&tag_line);
        combined.push_str("\n\n");
    }

    for (name, body) in [
        (SENTENCES_FILE, sentences),
        (TAGS_FILE, tags),
        (COMBINED_FILE, combined),
    ] {
        let path = dir.join(name);
        fs::write(&path, body).map_err(|e| DatasetError::io(&path, e))?;
    }

    info!(dir = %dir.display(), sentences = pairs.len(), "split written");
    Ok(())
}

/// Distinct tags used across `pairs`.
pub fn collect_tags<'a>(pairs: impl IntoIterator<Item = &'a TrainingPair>) -> BTreeSet<BioTag> {
    pairs
        .into_iter()
        .flat_map(|pair| pair.tags.iter().cloned())
        .collect()
}

/// Rewrites the global tag file when the canonically ordered tag set differs from it.
///
/// Returns whether the file changed. A missing file counts as empty.
pub fn sync_tags_file(
    path: impl AsRef<Path>,
    tags: impl IntoIterator<Item = BioTag>,
) -> Result<bool> {
    let path = path.as_ref();
    let vocab = TagVocabulary::from_unordered(tags);

    let previous = match fs::read_to_string(path) {
        Ok(text) => Some(TagVocabulary::parse(&text)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(DatasetError::io(path, e)),
    };
    if previous.as_ref().map(TagVocabulary::tags) == Some(vocab.tags()) {
        debug!(path = %path.display(), "tag set unchanged");
        return Ok(false);
    }

    info!(path = %path.display(), tags = vocab.len(), "tag set changed");
    fs::write(path, vocab.to_lines()).map_err(|e| DatasetError::io(path, e))?;
    Ok(true)
}

/// Reads a split directory back, keeping at most `max_len - 1` tokens per sentence.
///
/// One position is left for the leading `[CLS]` token the encoder adds.
pub fn load_bio_dataset(
    dir: impl AsRef<Path>,
    vocab: &TagVocabulary,
    max_len: usize,
) -> Result<Vec<EncodedExample>> {
    let dir = dir.as_ref();
    let sentences_path = dir.join(SENTENCES_FILE);
    let tags_path = dir.join(TAGS_FILE);
    let sentences =
        fs::read_to_string(&sentences_path).map_err(|e| DatasetError::io(&sentences_path, e))?;
    let tags = fs::read_to_string(&tags_path).map_err(|e| DatasetError::io(&tags_path, e))?;

    let sentence_lines: Vec<&str> = sentences.lines().collect();
    let tag_lines: Vec<&str> = tags.lines().collect();
    if sentence_lines.len() != tag_lines.len() {
        return Err(DatasetError::Format {
            path: tags_path,
            line: tag_lines.len().min(sentence_lines.len()) + 1,
            reason: format!(
                "{} tag lines for {} sentences",
                tag_lines.len(),
                sentence_lines.len()
            ),
        });
    }

    let budget = max_len.saturating_sub(1);
    let mut examples = Vec::with_capacity(sentence_lines.len());
    for (i, (sentence, tag_line)) in sentence_lines.iter().zip(&tag_lines).enumerate() {
        let format_err = |reason: String| DatasetError::Format {
            path: tags_path.clone(),
            line: i + 1,
            reason,
        };

        let mut tokens: Vec<String> = sentence.split(' ').map(str::to_string).collect();
        let line_tags = tag_line
            .split(' ')
            .map(str::parse)
            .collect::<rulecheck_core::Result<Vec<BioTag>>>()
            .map_err(|e| format_err(e.to_string()))?;
        if line_tags.len() != tokens.len() {
            return Err(format_err(format!(
                "{} tags for {} tokens",
                line_tags.len(),
                tokens.len()
            )));
        }

        let mut tag_ids = vocab
            .tags_to_ids(&line_tags)
            .map_err(|e| format_err(e.to_string()))?;
        tokens.truncate(budget);
        tag_ids.truncate(budget);
        examples.push(EncodedExample { tokens, tag_ids });
    }

    info!(dir = %dir.display(), sentences = examples.len(), "BIO dataset loaded");
    Ok(examples)
}

fn join_tags(tags: &[BioTag]) -> String {
    tags.iter()
        .map(BioTag::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
