//! # Label Codec
//!
//! Conversions between the four label representations:
//!
//! - `IIT`: `[(start, end, tag), ...]` intervals over token indices
//! - `BIO`: `["O", ..., "B-obj", "I-obj", ...]`, one tag per token
//! - `WT`: `[(word, tag), ...]` text spans (the nltk-style form)
//! - `SLabel`: `"[不直度/obj]和[失圆度/obj]的[允许偏差/prop]…[8mm/Rprop]"`
//!
//! Sequences are character-tokenized: every index counts `char`s, never bytes.
//! A "full" label partitions the whole sequence, with explicit `O` spans.

use regex::Regex;

use crate::error::{Result, RuleCheckError};
use crate::label::bio::BioTag;
use crate::label::interval::{Iit, Interval, OUTSIDE_TAG, WordTag};
use crate::label::warning::{Checked, ShapeWarning};

/// `[word/tag]`, non-greedy. Words may span lines.
const SLABEL_PATTERN: &str = r"(?s)\[.+?/[A-Za-z]+?\]";

/// Converter between label representations.
///
/// Holds the compiled slabel pattern; every operation is pure, so one codec
/// can be shared freely across threads.
#[derive(Debug, Clone)]
pub struct LabelCodec {
    re_slabel: Regex,
}

impl LabelCodec {
    /// Constructs a new `LabelCodec`.
    ///
    /// # Errors
    ///
    /// Returns `RuleCheckError::RegexError` if the slabel pattern fails to
    /// compile (should never happen with the static pattern).
    pub fn new() -> Result<Self> {
        Ok(Self {
            re_slabel: Regex::new(SLABEL_PATTERN)?,
        })
    }

    /// Converts intervals to one BIO tag per token.
    ///
    /// Ends past `seq_len` are clamped. `O` intervals and intervals left empty
    /// produce no tags; later intervals overwrite earlier ones.
    pub fn iit_to_bio(&self, iit: &[Interval], seq_len: usize) -> Checked<Vec<BioTag>> {
        let mut warnings = Vec::new();
        let mut bio = vec![BioTag::Outside; seq_len];

        for interval in iit.iter().filter(|iv| !iv.is_outside()) {
            let clamped = clamp_interval(interval, seq_len, &mut warnings);
            if clamped.is_empty() {
                warnings.push(ShapeWarning::EmptyInterval {
                    interval: interval.clone(),
                });
                continue;
            }

            bio[clamped.start] = BioTag::begin(&clamped.tag);
            for tag in &mut bio[clamped.start + 1..clamped.end] {
                *tag = BioTag::inside(&clamped.tag);
            }
        }

        Checked::new(bio, warnings)
    }

    /// Converts BIO tags back to intervals.
    ///
    /// When the sequence length is known and differs from the tag count, the
    /// tag stream is truncated to the sequence (never padded). An `I-` tag
    /// that does not continue an open entity of its type opens a new one.
    pub fn bio_to_iit(&self, bio: &[BioTag], seq_len: Option<usize>) -> Checked<Iit> {
        let mut warnings = Vec::new();
        let mut labels = bio;
        if let Some(seq_len) = seq_len {
            if bio.len() != seq_len {
                warnings.push(ShapeWarning::LengthMismatch {
                    labels: bio.len(),
                    seq: seq_len,
                });
                labels = &bio[..bio.len().min(seq_len)];
            }
        }

        let mut iit = Vec::new();
        let mut open: Option<Interval> = None;

        for (i, tag) in labels.iter().enumerate() {
            match tag {
                BioTag::Begin(t) => {
                    iit.extend(open.take());
                    open = Some(Interval::new(i, i + 1, t.as_str()));
                }
                BioTag::Inside(t) => match open.as_mut() {
                    Some(current) if current.tag == *t => current.end = i + 1,
                    _ => {
                        warnings.push(ShapeWarning::OrphanInside {
                            index: i,
                            tag: t.clone(),
                        });
                        iit.extend(open.take());
                        open = Some(Interval::new(i, i + 1, t.as_str()));
                    }
                },
                BioTag::Outside => iit.extend(open.take()),
            }
        }
        iit.extend(open);

        Checked::new(iit, warnings)
    }

    /// Inserts `O` intervals into every gap so the label partitions
    /// `[0, seq_len)` exactly.
    ///
    /// Input order does not matter. Ends past `seq_len` are clamped and an
    /// interval starting inside its predecessor is trimmed to start at the
    /// predecessor's end (dropped if nothing is left).
    pub fn label_to_full(&self, iit: &[Interval], seq_len: usize) -> Checked<Iit> {
        let mut warnings = Vec::new();
        let full = fill_gaps(iit, seq_len, &mut warnings);
        Checked::new(full, warnings)
    }

    /// Converts intervals to word-tag pairs over `seq`.
    ///
    /// # Errors
    ///
    /// Returns `RuleCheckError::OverlappingIntervals` if two intervals cover
    /// the same token.
    pub fn iit_to_wt(
        &self,
        iit: &[Interval],
        seq: &str,
        to_full: bool,
    ) -> Result<Checked<Vec<WordTag>>> {
        let chars: Vec<char> = seq.chars().collect();
        let mut sorted = iit.to_vec();
        sorted.sort_by_key(|iv| iv.start);

        if let Some(pair) = sorted.windows(2).find(|w| w[1].start < w[0].end) {
            return Err(RuleCheckError::OverlappingIntervals {
                previous: pair[0].clone(),
                next: pair[1].clone(),
            });
        }

        let mut warnings = Vec::new();
        let labels = if to_full {
            fill_gaps(&sorted, chars.len(), &mut warnings)
        } else {
            sorted
                .iter()
                .filter_map(|iv| {
                    let clamped = clamp_interval(iv, chars.len(), &mut warnings);
                    non_empty(clamped, iv, &mut warnings)
                })
                .collect()
        };

        let wt = labels
            .into_iter()
            .map(|iv| WordTag::new(chars[iv.start..iv.end].iter().collect::<String>(), iv.tag))
            .collect();

        Ok(Checked::new(wt, warnings))
    }

    /// Rebuilds intervals and the sequence from word-tag pairs.
    ///
    /// Unless `to_full` is set, `O` entries are dropped from the result.
    ///
    /// # Errors
    ///
    /// Returns `RuleCheckError::ReconstructionMismatch` if `expected_seq` is
    /// given and differs from the concatenated words.
    pub fn wt_to_iit(
        &self,
        wt: &[WordTag],
        expected_seq: Option<&str>,
        to_full: bool,
    ) -> Result<(Iit, String)> {
        let seq: String = wt.iter().map(|entry| entry.word.as_str()).collect();
        if let Some(expected) = expected_seq {
            if expected != seq {
                return Err(RuleCheckError::ReconstructionMismatch {
                    expected: expected.to_string(),
                    found: seq,
                });
            }
        }

        let mut iit = Vec::with_capacity(wt.len());
        let mut offset = 0;
        for entry in wt {
            let end = offset + entry.word.chars().count();
            if to_full || !entry.is_outside() {
                iit.push(Interval::new(offset, end, entry.tag.as_str()));
            }
            offset = end;
        }

        Ok((iit, seq))
    }

    /// Wraps every tagged span of `seq` as `[text/tag]`.
    ///
    /// # Errors
    ///
    /// Returns `RuleCheckError::OverlappingIntervals` for overlapping input.
    pub fn iit_to_slabel(&self, iit: &[Interval], seq: &str) -> Result<Checked<String>> {
        Ok(self
            .iit_to_wt(iit, seq, true)?
            .map(|wt| self.wt_to_slabel(&wt)))
    }

    pub fn wt_to_slabel(&self, wt: &[WordTag]) -> String {
        let mut slabel = String::new();
        for entry in wt {
            if entry.is_outside() {
                slabel.push_str(&entry.word);
            } else {
                slabel.push('[');
                slabel.push_str(&entry.word);
                slabel.push('/');
                slabel.push_str(&entry.tag);
                slabel.push(']');
            }
        }
        slabel
    }

    /// Splits slabel markup into word-tag pairs.
    ///
    /// Text outside the markup becomes `O` entries when `to_full` is set.
    ///
    /// # Errors
    ///
    /// Returns `RuleCheckError::InvalidSLabelFormat` if a bracket survives
    /// outside a well-formed `[word/tag]` match or inside a word.
    pub fn slabel_to_wt(&self, slabel: &str, to_full: bool) -> Result<Vec<WordTag>> {
        let mut wt = Vec::new();
        let mut last = 0;

        for m in self.re_slabel.find_iter(slabel) {
            let prefix = &slabel[last..m.start()];
            ensure_no_brackets(slabel, last, prefix)?;
            if to_full && !prefix.is_empty() {
                wt.push(WordTag::new(prefix, OUTSIDE_TAG));
            }

            // The pattern guarantees a '/' between the brackets.
            let inner = &slabel[m.start() + 1..m.end() - 1];
            let (word, tag) = inner.rsplit_once('/').unwrap_or((inner, ""));
            ensure_no_brackets(slabel, m.start() + 1, word)?;
            wt.push(WordTag::new(word, tag));

            last = m.end();
        }

        let suffix = &slabel[last..];
        ensure_no_brackets(slabel, last, suffix)?;
        if to_full && !suffix.is_empty() {
            wt.push(WordTag::new(suffix, OUTSIDE_TAG));
        }

        Ok(wt)
    }

    /// Parses slabel markup into intervals and the plain sequence.
    pub fn slabel_to_iit(&self, slabel: &str, to_full: bool) -> Result<(Iit, String)> {
        let wt = self.slabel_to_wt(slabel, true)?;
        self.wt_to_iit(&wt, None, to_full)
    }
}

fn fill_gaps(iit: &[Interval], seq_len: usize, warnings: &mut Vec<ShapeWarning>) -> Iit {
    let mut sorted = iit.to_vec();
    sorted.sort_by_key(|iv| iv.start);

    let mut full = Vec::with_capacity(sorted.len() * 2 + 1);
    let mut cursor = 0;
    for interval in &sorted {
        let clamped = clamp_interval(interval, seq_len, warnings);
        let Some(mut current) = non_empty(clamped, interval, warnings) else {
            continue;
        };
        if current.start < cursor {
            warnings.push(ShapeWarning::OverlapTrimmed {
                interval: interval.clone(),
                previous_end: cursor,
            });
            if current.end <= cursor {
                continue;
            }
            current.start = cursor;
        }
        if current.start > cursor {
            full.push(Interval::outside(cursor, current.start));
        }
        cursor = current.end;
        full.push(current);
    }
    if cursor < seq_len {
        full.push(Interval::outside(cursor, seq_len));
    }
    full
}

/// Drops an interval that covers no token, recording the original.
fn non_empty(
    clamped: Interval,
    original: &Interval,
    warnings: &mut Vec<ShapeWarning>,
) -> Option<Interval> {
    if clamped.is_empty() {
        warnings.push(ShapeWarning::EmptyInterval {
            interval: original.clone(),
        });
        return None;
    }
    Some(clamped)
}

/// Clamps the end to `seq_len` and never lets the start pass the end.
fn clamp_interval(
    interval: &Interval,
    seq_len: usize,
    warnings: &mut Vec<ShapeWarning>,
) -> Interval {
    let end = interval.end.min(seq_len);
    if end < interval.end {
        warnings.push(ShapeWarning::IntervalClamped {
            interval: interval.clone(),
            seq_len,
        });
    }
    Interval::new(interval.start.min(end), end, interval.tag.as_str())
}

fn ensure_no_brackets(slabel: &str, byte_offset: usize, part: &str) -> Result<()> {
    match part.find(['[', ']']) {
        Some(pos) => Err(RuleCheckError::InvalidSLabelFormat {
            position: slabel[..byte_offset + pos].chars().count(),
            reason: format!("unbalanced bracket in {part:?}"),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::bio::parse_bio_line;

    fn codec() -> LabelCodec {
        LabelCodec::new().unwrap()
    }

    fn iv(start: usize, end: usize, tag: &str) -> Interval {
        Interval::new(start, end, tag)
    }

    #[test]
    fn test_iit_to_bio_basic() {
        let bio = codec()
            .iit_to_bio(&[iv(1, 3, "prop"), iv(4, 5, "cmp")], 6)
            .into_strict()
            .unwrap();
        assert_eq!(bio, parse_bio_line("O B-prop I-prop O B-cmp O").unwrap());
    }

    #[test]
    fn test_iit_to_bio_clamps_with_warning() {
        let checked = codec().iit_to_bio(&[iv(2, 9, "Rprop")], 4);
        assert_eq!(
            checked.value,
            parse_bio_line("O O B-Rprop I-Rprop").unwrap()
        );
        assert_eq!(
            checked.warnings,
            vec![ShapeWarning::IntervalClamped {
                interval: iv(2, 9, "Rprop"),
                seq_len: 4
            }]
        );
    }

    #[test]
    fn test_iit_to_bio_skips_empty_and_outside() {
        let checked = codec().iit_to_bio(
            &[iv(0, 2, "O"), iv(2, 2, "prop"), iv(7, 9, "cmp")],
            3,
        );
        assert_eq!(checked.value, vec![BioTag::Outside; 3]);
        assert_eq!(checked.warnings.len(), 3);
    }

    #[test]
    fn test_bio_to_iit_basic() {
        let bio = parse_bio_line("O B-obj I-obj B-prop O B-cmp I-cmp").unwrap();
        let iit = codec().bio_to_iit(&bio, Some(7)).into_strict().unwrap();
        assert_eq!(iit, vec![iv(1, 3, "obj"), iv(3, 4, "prop"), iv(5, 7, "cmp")]);
    }

    #[test]
    fn test_bio_to_iit_promotes_orphan_inside() {
        let bio = parse_bio_line("I-prop I-prop O I-cmp B-obj I-prop").unwrap();
        let checked = codec().bio_to_iit(&bio, None);
        assert_eq!(
            checked.value,
            vec![iv(0, 2, "prop"), iv(3, 4, "cmp"), iv(4, 5, "obj"), iv(5, 6, "prop")]
        );
        assert_eq!(checked.warnings.len(), 3);
    }

    #[test]
    fn test_bio_to_iit_truncates_longer_labels() {
        let bio = parse_bio_line("B-prop I-prop I-prop I-prop").unwrap();
        let checked = codec().bio_to_iit(&bio, Some(2));
        assert_eq!(checked.value, vec![iv(0, 2, "prop")]);
        assert_eq!(
            checked.warnings,
            vec![ShapeWarning::LengthMismatch { labels: 4, seq: 2 }]
        );
    }

    #[test]
    fn test_bio_to_iit_shorter_labels_are_not_padded() {
        let bio = parse_bio_line("B-prop").unwrap();
        let checked = codec().bio_to_iit(&bio, Some(3));
        assert_eq!(checked.value, vec![iv(0, 1, "prop")]);
        assert!(!checked.is_clean());
    }

    #[test]
    fn test_label_to_full() {
        let full = codec()
            .label_to_full(&[iv(4, 6, "cmp"), iv(1, 3, "prop")], 8)
            .into_strict()
            .unwrap();
        assert_eq!(
            full,
            vec![
                iv(0, 1, "O"),
                iv(1, 3, "prop"),
                iv(3, 4, "O"),
                iv(4, 6, "cmp"),
                iv(6, 8, "O"),
            ]
        );
    }

    #[test]
    fn test_label_to_full_empty_label() {
        let full = codec().label_to_full(&[], 3).into_value();
        assert_eq!(full, vec![iv(0, 3, "O")]);
        assert!(codec().label_to_full(&[], 0).into_value().is_empty());
    }

    #[test]
    fn test_label_to_full_trims_overlap() {
        let checked = codec().label_to_full(
            &[iv(0, 3, "prop"), iv(2, 5, "cmp"), iv(1, 2, "obj")],
            5,
        );
        assert_eq!(checked.value, vec![iv(0, 3, "prop"), iv(3, 5, "cmp")]);
        assert_eq!(checked.warnings.len(), 2);
    }

    #[test]
    fn test_iit_to_wt_full() {
        let wt = codec()
            .iit_to_wt(&[iv(3, 5, "prop"), iv(0, 2, "obj")], "水带的长度", true)
            .unwrap()
            .into_value();
        assert_eq!(
            wt,
            vec![
                WordTag::new("水带", "obj"),
                WordTag::new("的", "O"),
                WordTag::new("长度", "prop"),
            ]
        );
    }

    #[test]
    fn test_iit_to_wt_rejects_overlap() {
        let err = codec()
            .iit_to_wt(&[iv(0, 3, "obj"), iv(2, 4, "prop")], "水带的长度", false)
            .unwrap_err();
        assert!(matches!(err, RuleCheckError::OverlappingIntervals { .. }));
    }

    #[test]
    fn test_wt_to_iit_offsets() {
        let wt = vec![
            WordTag::new("水带", "obj"),
            WordTag::new("的", "O"),
            WordTag::new("长度", "prop"),
        ];
        let (iit, seq) = codec().wt_to_iit(&wt, None, false).unwrap();
        assert_eq!(seq, "水带的长度");
        assert_eq!(iit, vec![iv(0, 2, "obj"), iv(3, 5, "prop")]);

        let (full, _) = codec().wt_to_iit(&wt, Some("水带的长度"), true).unwrap();
        assert_eq!(full.len(), 3);
    }

    #[test]
    fn test_wt_to_iit_mismatch_is_fatal() {
        let wt = vec![WordTag::new("水带", "obj")];
        let err = codec().wt_to_iit(&wt, Some("水管"), false).unwrap_err();
        assert!(matches!(err, RuleCheckError::ReconstructionMismatch { .. }));
    }

    #[test]
    fn test_iit_to_slabel() {
        let seq = "不直度和失圆度的允许偏差不应大于8mm";
        let iit = vec![
            iv(0, 3, "obj"),
            iv(4, 7, "obj"),
            iv(8, 12, "prop"),
            iv(12, 16, "cmp"),
            iv(16, 19, "Rprop"),
        ];
        let slabel = codec().iit_to_slabel(&iit, seq).unwrap().into_value();
        assert_eq!(
            slabel,
            "[不直度/obj]和[失圆度/obj]的[允许偏差/prop][不应大于/cmp][8mm/Rprop]"
        );

        let (back, back_seq) = codec().slabel_to_iit(&slabel, false).unwrap();
        assert_eq!(back, iit);
        assert_eq!(back_seq, seq);
    }

    #[test]
    fn test_slabel_to_wt_keeps_slash_in_word() {
        let wt = codec().slabel_to_wt("单位[m/s/Rprop]为准", true).unwrap();
        assert_eq!(
            wt,
            vec![
                WordTag::new("单位", "O"),
                WordTag::new("m/s", "Rprop"),
                WordTag::new("为准", "O"),
            ]
        );
        let partial = codec().slabel_to_wt("单位[m/s/Rprop]为准", false).unwrap();
        assert_eq!(partial, vec![WordTag::new("m/s", "Rprop")]);
    }

    #[test]
    fn test_slabel_rejects_nested_brackets() {
        let err = codec().slabel_to_wt("[a[b/prop]/obj]", true).unwrap_err();
        assert!(matches!(
            err,
            RuleCheckError::InvalidSLabelFormat { position: 2, .. }
        ));
    }

    #[test]
    fn test_slabel_rejects_stray_bracket() {
        let err = codec().slabel_to_iit("[贯穿孔口/obj]的]防火", false).unwrap_err();
        assert!(matches!(
            err,
            RuleCheckError::InvalidSLabelFormat { position: 11, .. }
        ));

        assert!(codec().slabel_to_iit("[未闭合/prop", false).is_err());
    }

    #[test]
    fn test_slabel_without_markup() {
        let (iit, seq) = codec().slabel_to_iit("纯文本", true).unwrap();
        assert_eq!(seq, "纯文本");
        assert_eq!(iit, vec![iv(0, 3, "O")]);
    }

    #[test]
    fn test_slabel_word_spanning_lines() {
        let seq = "压力\n值5MPa";
        let iit = vec![iv(0, 4, "prop"), iv(4, 8, "Rprop")];
        let slabel = codec().iit_to_slabel(&iit, seq).unwrap().into_strict().unwrap();
        assert_eq!(slabel, "[压力\n值/prop][5MPa/Rprop]");

        let (back, back_seq) = codec().slabel_to_iit(&slabel, false).unwrap();
        assert_eq!(back, iit);
        assert_eq!(back_seq, seq);
    }

    #[test]
    fn test_empty_interval_is_not_rendered() {
        let iit = vec![iv(1, 1, "prop"), iv(2, 6, "Rprop")];
        let checked = codec().iit_to_slabel(&iit, "压力5MPa").unwrap();
        assert_eq!(checked.value, "压力[5MPa/Rprop]");
        assert_eq!(
            checked.warnings,
            vec![ShapeWarning::EmptyInterval {
                interval: iv(1, 1, "prop")
            }]
        );
        assert!(codec().slabel_to_iit(&checked.value, false).is_ok());

        let wt = codec()
            .iit_to_wt(&iit, "压力5MPa", false)
            .unwrap()
            .into_value();
        assert_eq!(wt, vec![WordTag::new("5MPa", "Rprop")]);
    }
}
