//! # Extraction Pipeline
//!
//! One entry point from a sentence and its predicted BIO tags to every
//! downstream form: intervals, slabel markup and the rule tree. Also turns
//! annotated sentences into truncated training pairs.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::{Result, RuleCheckError};
use crate::grammar::{GrammarParser, SyntaxError};
use crate::label::{
    BioTag, Checked, Iit, Interval, LabelCodec, RenderStyle, RenderedLabels, ShapeWarning,
    clean_seq_label,
};
use crate::rule::RuleTreeBuilder;
use crate::text::CharTokenizer;
use crate::types::RuleTree;

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Model input length, special tokens included
    pub max_len: usize,
    /// Positions reserved for special tokens (the leading `[CLS]`)
    pub special_tokens: usize,
    /// Fail on shape warnings instead of recovering
    pub strict_shape: bool,
    /// Markup used when rendering labels
    pub render_style: RenderStyle,
    /// Accept rules that start with a bare requirement
    pub allow_bare_requirement: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_len: 125,
            special_tokens: 1,
            strict_shape: false,
            render_style: RenderStyle::Brackets,
            allow_bare_requirement: false,
        }
    }
}

impl PipelineConfig {
    /// Create a new pipeline configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model input length.
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    /// Set the number of special-token positions.
    pub fn with_special_tokens(mut self, special_tokens: usize) -> Self {
        self.special_tokens = special_tokens;
        self
    }

    /// Enable or disable strict shape checking.
    pub fn with_strict_shape(mut self, strict: bool) -> Self {
        self.strict_shape = strict;
        self
    }

    pub fn with_render_style(mut self, style: RenderStyle) -> Self {
        self.render_style = style;
        self
    }

    pub fn with_bare_requirement(mut self, allow: bool) -> Self {
        self.allow_bare_requirement = allow;
        self
    }

    /// Number of tag positions left after special tokens.
    pub fn tag_budget(&self) -> usize {
        self.max_len.saturating_sub(self.special_tokens)
    }
}

/// Everything recovered from one tagged sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub seq: String,
    pub iit: Iit,
    pub slabel: String,
    /// `None` when the tags do not encode a recognizable rule.
    pub rule: Option<RuleTree>,
    pub rule_error: Option<SyntaxError>,
    pub warnings: Vec<ShapeWarning>,
}

/// A cleaned, truncated `(tokens, tags)` pair for the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainingPair {
    pub tokens: Vec<String>,
    pub tags: Vec<BioTag>,
}

/// Label conversion and rule extraction with shared configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    codec: LabelCodec,
    builder: RuleTreeBuilder,
    tokenizer: CharTokenizer,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let parser = GrammarParser::new().with_bare_requirement(config.allow_bare_requirement);
        Ok(Self {
            codec: LabelCodec::new()?,
            builder: RuleTreeBuilder::with_parser(parser),
            tokenizer: CharTokenizer::new(),
            config,
        })
    }

    /// Create a new pipeline with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(PipelineConfig::default())
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn codec(&self) -> &LabelCodec {
        &self.codec
    }

    /// Recovers intervals, slabel and rule tree from predicted tags.
    ///
    /// A sentence whose tags do not reduce yields `rule: None` with the
    /// syntax error attached; that is not an error of this call.
    ///
    /// # Errors
    ///
    /// In strict mode, the first shape warning is returned as
    /// `RuleCheckError::Shape`.
    #[instrument(skip(self, tags), fields(chars = seq.chars().count()))]
    pub fn extract(&self, seq: &str, tags: &[BioTag]) -> Result<Extraction> {
        let mut warnings = Vec::new();
        let seq_len = seq.chars().count();

        let iit = self.accept(self.codec.bio_to_iit(tags, Some(seq_len)), &mut warnings)?;
        let slabel = self.accept(self.codec.iit_to_slabel(&iit, seq)?, &mut warnings)?;

        let (rule, rule_error) = match self.builder.build_from_iit(&iit) {
            Ok(tree) => (Some(tree), None),
            Err(RuleCheckError::NoRuleFound(err)) => {
                debug!(%err, "sentence holds no rule");
                (None, Some(err))
            }
            Err(err) => return Err(err),
        };

        Ok(Extraction {
            seq: seq.to_string(),
            iit,
            slabel,
            rule,
            rule_error,
            warnings,
        })
    }

    /// [`extract`](Self::extract) over many sentences in parallel.
    ///
    /// Results keep input order; one failing sentence does not affect the rest.
    pub fn extract_batch<S>(&self, items: &[(S, Vec<BioTag>)]) -> Vec<Result<Extraction>>
    where
        S: AsRef<str> + Sync,
    {
        items
            .par_iter()
            .map(|(seq, tags)| self.extract(seq.as_ref(), tags))
            .collect()
    }

    /// Turns an annotated sentence into a model training pair.
    ///
    /// Tags are cleaned (see [`clean_seq_label`]) and right-truncated to the
    /// tag budget.
    #[instrument(skip(self, iit), fields(chars = seq.chars().count()))]
    pub fn prepare_training(&self, seq: &str, iit: &[Interval]) -> Result<TrainingPair> {
        let mut warnings = Vec::new();
        let tokens = self.tokenizer.tokenize_to_strings(seq);

        let bio = self.accept(self.codec.iit_to_bio(iit, tokens.len()), &mut warnings)?;
        let (mut tokens, mut tags) = self.accept(clean_seq_label(&tokens, &bio), &mut warnings)?;

        let budget = self.config.tag_budget();
        if tags.len() > budget {
            debug!(len = tags.len(), budget, "truncating training pair");
            tokens.truncate(budget);
            tags.truncate(budget);
        }

        Ok(TrainingPair { tokens, tags })
    }

    /// Renders gold and predicted tags with the configured style.
    pub fn render<S: AsRef<str>>(
        &self,
        tokens: &[S],
        gold: Option<&[BioTag]>,
        pred: Option<&[BioTag]>,
    ) -> RenderedLabels {
        self.codec
            .render_seq_labels(tokens, gold, pred, self.config.render_style)
    }

    fn accept<T>(&self, checked: Checked<T>, warnings: &mut Vec<ShapeWarning>) -> Result<T> {
        if self.config.strict_shape {
            return checked.into_strict();
        }
        warnings.extend(checked.warnings);
        Ok(checked.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::parse_bio_line;

    fn bio(line: &str) -> Vec<BioTag> {
        parse_bio_line(line).unwrap()
    }

    #[test]
    fn test_pipeline_config() {
        let config = PipelineConfig::new()
            .with_max_len(10)
            .with_special_tokens(2)
            .with_strict_shape(true)
            .with_render_style(RenderStyle::Markdown);

        assert_eq!(config.tag_budget(), 8);
        assert!(config.strict_shape);
        assert_eq!(config.render_style, RenderStyle::Markdown);
        assert_eq!(PipelineConfig::new().with_max_len(0).tag_budget(), 0);
    }

    #[test]
    fn test_extract_rule() {
        let pipeline = Pipeline::with_defaults().unwrap();
        let tags = bio("B-prop I-prop B-cmp I-cmp B-Rprop I-Rprop");
        let out = pipeline.extract("压力小于1M", &tags).unwrap();

        assert_eq!(out.slabel, "[压力/prop][小于/cmp][1M/Rprop]");
        assert!(out.warnings.is_empty());
        let rule = out.rule.unwrap();
        assert_eq!(rule.groups.len(), 1);
        assert!(out.rule_error.is_none());
    }

    #[test]
    fn test_extract_without_rule_is_not_an_error() {
        let pipeline = Pipeline::with_defaults().unwrap();
        let out = pipeline.extract("水带", &bio("B-obj I-obj")).unwrap();
        assert!(out.rule.is_none());
        assert!(out.rule_error.is_some());
        assert_eq!(out.slabel, "[水带/obj]");
    }

    #[test]
    fn test_extract_length_mismatch() {
        let tags = bio("B-prop I-prop B-Rprop O O");

        let lenient = Pipeline::with_defaults().unwrap();
        let out = lenient.extract("长度5m", &tags).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert!(out.rule.is_some());

        let strict = Pipeline::new(PipelineConfig::new().with_strict_shape(true)).unwrap();
        let err = strict.extract("长度5m", &tags).unwrap_err();
        assert!(matches!(err, RuleCheckError::Shape(_)));
    }

    #[test]
    fn test_extract_batch_keeps_order() {
        let pipeline = Pipeline::with_defaults().unwrap();
        let items = vec![
            ("长度5m".to_string(), bio("B-prop I-prop B-Rprop I-Rprop")),
            ("水带".to_string(), bio("B-obj I-obj")),
        ];
        let results = pipeline.extract_batch(&items);
        assert_eq!(results.len(), 2);
        assert!(results[0].as_ref().unwrap().rule.is_some());
        assert!(results[1].as_ref().unwrap().rule.is_none());
    }

    #[test]
    fn test_prepare_training_truncates() {
        let pipeline = Pipeline::new(PipelineConfig::new().with_max_len(4)).unwrap();
        let iit = vec![Interval::new(1, 3, "prop"), Interval::new(3, 6, "Rprop")];
        let pair = pipeline.prepare_training("的长度5mm。", &iit).unwrap();

        assert_eq!(pair.tokens, vec!["长", "度", "5"]);
        assert_eq!(pair.tags, bio("B-prop I-prop B-Rprop"));
    }

    #[test]
    fn test_render_uses_configured_style() {
        let pipeline =
            Pipeline::new(PipelineConfig::new().with_render_style(RenderStyle::Markdown)).unwrap();
        let tokens = ["长", "度"];
        let gold = bio("B-prop I-prop");
        let rendered = pipeline.render(&tokens, Some(&gold), None);
        assert_eq!(rendered.label.as_deref(), Some("`长度/prop`"));
    }
}
