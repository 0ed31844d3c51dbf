//! Human-readable rendering of labeled token sequences.
//!
//! ```text
//! [设计工作压力/prop]为[0.8MPa/aRprop]、[1.6MPa/aRprop]的[水带/obj]
//! ```

use serde::{Deserialize, Serialize};

use crate::label::bio::BioTag;
use crate::label::codec::LabelCodec;
use crate::label::interval::Interval;

/// How tagged spans are marked up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderStyle {
    /// `[span/tag]`
    #[default]
    Brackets,
    /// `` `span/tag` `` padded with spaces, for Markdown logs.
    Markdown,
}

/// Gold and predicted labels rendered over the same tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedLabels {
    pub label: Option<String>,
    pub pred: Option<String>,
    /// The plain sequence, with literal brackets shown as `<` and `>`.
    pub seq: String,
}

impl LabelCodec {
    /// Renders gold and/or predicted BIO tags over model tokens.
    ///
    /// Word-piece `##` prefixes are dropped and literal brackets in tokens are
    /// shown as `<`/`>` so they cannot be confused with the markup.
    pub fn render_seq_labels<S: AsRef<str>>(
        &self,
        tokens: &[S],
        label: Option<&[BioTag]>,
        pred: Option<&[BioTag]>,
        style: RenderStyle,
    ) -> RenderedLabels {
        let display = display_tokens(tokens);
        let render = |tags: &[BioTag]| {
            let iit = self.bio_to_iit(tags, Some(display.len())).into_value();
            render_seq_label(&display, &iit, style)
        };

        RenderedLabels {
            label: label.map(&render),
            pred: pred.map(&render),
            seq: display.concat(),
        }
    }

    /// One `text tag` line per interval.
    pub fn render_label_lines<S: AsRef<str>>(&self, tokens: &[S], iit: &[Interval]) -> String {
        let display = display_tokens(tokens);
        iit.iter()
            .map(|iv| {
                let end = iv.end.min(display.len());
                let start = iv.start.min(end);
                format!("{} {}", display[start..end].concat(), iv.tag)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn display_tokens<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
    tokens
        .iter()
        .map(|t| {
            let t = t.as_ref();
            t.strip_prefix("##")
                .unwrap_or(t)
                .replace('[', "<")
                .replace(']', ">")
        })
        .collect()
}

fn render_seq_label(tokens: &[String], iit: &[Interval], style: RenderStyle) -> String {
    let mut cells = tokens.to_vec();
    for iv in iit {
        let end = iv.end.min(cells.len());
        if iv.start >= end {
            continue;
        }
        let span = cells[iv.start..end].concat();
        cells[iv.start] = match style {
            RenderStyle::Brackets => format!("[{span}/{}]", iv.tag),
            RenderStyle::Markdown => format!(" `{span}/{}` ", iv.tag),
        };
        for cell in &mut cells[iv.start + 1..end] {
            cell.clear();
        }
    }
    cells.concat().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::bio::parse_bio_line;

    fn tokens(s: &str) -> Vec<String> {
        s.chars().map(String::from).collect()
    }

    #[test]
    fn test_render_gold_and_pred() {
        let codec = LabelCodec::new().unwrap();
        let toks = tokens("水带长度");
        let gold = parse_bio_line("B-obj I-obj B-prop I-prop").unwrap();
        let pred = parse_bio_line("B-obj I-obj O O").unwrap();

        let rendered =
            codec.render_seq_labels(&toks, Some(&gold), Some(&pred), RenderStyle::Brackets);
        assert_eq!(rendered.label.as_deref(), Some("[水带/obj][长度/prop]"));
        assert_eq!(rendered.pred.as_deref(), Some("[水带/obj]长度"));
        assert_eq!(rendered.seq, "水带长度");
    }

    #[test]
    fn test_render_markdown_and_brackets_escaped() {
        let codec = LabelCodec::new().unwrap();
        let toks = vec!["[CLS]", "5", "##m"];
        let tags = parse_bio_line("O B-Rprop I-Rprop").unwrap();

        let rendered = codec.render_seq_labels(&toks, Some(&tags), None, RenderStyle::Markdown);
        assert_eq!(rendered.label.as_deref(), Some("<CLS> `5m/Rprop`"));
        assert_eq!(rendered.pred, None);
        assert_eq!(rendered.seq, "<CLS>5m");
    }

    #[test]
    fn test_render_label_lines() {
        let codec = LabelCodec::new().unwrap();
        let toks = tokens("水带长度");
        let iit = vec![Interval::new(0, 2, "obj"), Interval::new(2, 4, "prop")];
        assert_eq!(codec.render_label_lines(&toks, &iit), "水带 obj\n长度 prop");
    }
}
