use crate::label::bio::BioTag;
use crate::label::warning::{Checked, ShapeWarning};

/// A token sequence with one BIO tag per token.
pub type SeqLabel = (Vec<String>, Vec<BioTag>);

/// Prepares a tagged token sequence for training.
///
/// Whitespace tokens are removed; a `B-` on a removed token moves to the next
/// token when that token continues the same entity type. Leading and
/// trailing `O` tokens are stripped and a leading `I-` becomes `B-`.
/// Tokens and tags of different lengths are truncated to the shorter.
pub fn clean_seq_label<S: AsRef<str>>(tokens: &[S], labels: &[BioTag]) -> Checked<SeqLabel> {
    let mut warnings = Vec::new();
    if tokens.len() != labels.len() {
        warnings.push(ShapeWarning::LengthMismatch {
            labels: labels.len(),
            seq: tokens.len(),
        });
    }

    let mut pairs: Vec<Option<(String, BioTag)>> = tokens
        .iter()
        .zip(labels)
        .map(|(token, tag)| Some((token.as_ref().to_string(), tag.clone())))
        .collect();

    for i in 0..pairs.len() {
        let Some((token, tag)) = pairs[i].clone() else {
            continue;
        };
        if !token.trim().is_empty() {
            continue;
        }
        if let BioTag::Begin(kind) = &tag {
            if let Some(Some((_, next))) = pairs.get_mut(i + 1) {
                if next.entity_tag() == Some(kind.as_str()) {
                    *next = tag.clone();
                }
            }
        }
        pairs[i] = None;
    }

    let mut kept: Vec<(String, BioTag)> = pairs.into_iter().flatten().collect();
    let first = kept
        .iter()
        .position(|(_, tag)| !tag.is_outside())
        .unwrap_or(kept.len());
    let last = kept
        .iter()
        .rposition(|(_, tag)| !tag.is_outside())
        .map_or(first, |i| i + 1);
    kept.truncate(last);
    kept.drain(..first);

    let (tokens, mut labels): SeqLabel = kept.into_iter().unzip();
    if let Some(head) = labels.first_mut() {
        *head = head.clone().promote();
    }

    Checked::new((tokens, labels), warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::bio::parse_bio_line;

    fn chars(s: &str) -> Vec<String> {
        s.chars().map(String::from).collect()
    }

    #[test]
    fn test_strips_outside_edges() {
        let labels = parse_bio_line("O B-prop I-prop O").unwrap();
        let (tokens, labels) = clean_seq_label(&chars("的长度。"), &labels)
            .into_strict()
            .unwrap();
        assert_eq!(tokens, chars("长度"));
        assert_eq!(labels, parse_bio_line("B-prop I-prop").unwrap());
    }

    #[test]
    fn test_space_hands_begin_forward() {
        let labels = parse_bio_line("B-obj B-prop I-prop I-prop").unwrap();
        let (tokens, labels) = clean_seq_label(&chars("a 长度"), &labels).into_value();
        assert_eq!(tokens, chars("a长度"));
        assert_eq!(labels, parse_bio_line("B-obj B-prop I-prop").unwrap());
    }

    #[test]
    fn test_leading_inside_promoted() {
        let labels = parse_bio_line("O I-prop B-Rprop").unwrap();
        let (_, labels) = clean_seq_label(&chars(" 度值"), &labels).into_value();
        assert_eq!(labels, parse_bio_line("B-prop B-Rprop").unwrap());
    }

    #[test]
    fn test_all_outside_is_empty() {
        let (tokens, labels) =
            clean_seq_label(&chars("没有"), &[BioTag::Outside, BioTag::Outside]).into_value();
        assert!(tokens.is_empty());
        assert!(labels.is_empty());
    }

    #[test]
    fn test_length_mismatch_warns() {
        let checked = clean_seq_label(&chars("长度"), &parse_bio_line("B-prop").unwrap());
        assert_eq!(checked.warnings.len(), 1);
        assert_eq!(checked.value.0, chars("长"));
    }
}
