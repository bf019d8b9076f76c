//! Translation engine interface and the default lexicon engine
//!
//! The service never translates text itself; it hands each input to an
//! [`Engine`] together with the per-request [`ResponseOptions`].

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::TranslationModel;

static SENTENCE_BREAK: OnceLock<Regex> = OnceLock::new();
static WORD: OnceLock<Regex> = OnceLock::new();
static WORD_OR_TAG: OnceLock<Regex> = OnceLock::new();

fn sentence_break() -> &'static Regex {
    SENTENCE_BREAK.get_or_init(|| Regex::new(r"[.!?]+(\s+)").expect("valid sentence regex"))
}

fn word() -> &'static Regex {
    WORD.get_or_init(|| Regex::new(r"\w+(?:['’-]\w+)*").expect("valid word regex"))
}

fn word_or_tag() -> &'static Regex {
    WORD_OR_TAG
        .get_or_init(|| Regex::new(r"<[^>]*>|\w+(?:['’-]\w+)*").expect("valid word regex"))
}

/// Per-request switches for the optional parts of a [`Response`]
///
/// Everything is off by default; the C surface never turns anything on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseOptions {
    /// Treat `<...>` tags as markup and carry them through untranslated
    pub html: bool,
    /// Produce one confidence score per target word
    pub quality_scores: bool,
    /// Produce word alignments between source and target
    pub alignment: bool,
    /// Produce source/target byte ranges for every sentence
    pub sentence_mappings: bool,
}

/// Half-open byte range into a response text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    pub begin: usize,
    pub end: usize,
}

impl From<Range<usize>> for ByteRange {
    fn from(range: Range<usize>) -> Self {
        Self {
            begin: range.start,
            end: range.end,
        }
    }
}

/// A single aligned word pair; word indices are relative to the sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentPoint {
    pub sentence: usize,
    pub source: usize,
    pub target: usize,
}

/// Location of one sentence in the source and target texts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceMapping {
    pub source: ByteRange,
    pub target: ByteRange,
}

/// Result of translating one input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_scores: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignments: Option<Vec<AlignmentPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentence_mappings: Option<Vec<SentenceMapping>>,
}

impl Response {
    /// A response with no annotations
    pub fn plain(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            quality_scores: None,
            alignments: None,
            sentence_mappings: None,
        }
    }
}

/// The translation computation behind a service
pub trait Engine: Send + Sync {
    /// Translate a single input with `model`
    fn translate(
        &self,
        model: &TranslationModel,
        source: &str,
        options: ResponseOptions,
    ) -> Result<Response>;
}

/// Word-by-word engine driven by the model's translation table
///
/// Unknown words are passed through unchanged; whitespace and punctuation
/// are copied verbatim.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexiconEngine;

impl LexiconEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Engine for LexiconEngine {
    fn translate(
        &self,
        model: &TranslationModel,
        source: &str,
        options: ResponseOptions,
    ) -> Result<Response> {
        let tokens = if options.html { word_or_tag() } else { word() };
        let lexicon = model.lexicon();

        let mut target = String::with_capacity(source.len());
        let mut scores = Vec::new();
        let mut alignments = Vec::new();
        let mut mappings = Vec::new();

        for (index, segment) in split_sentences(source).into_iter().enumerate() {
            let sentence = &source[segment.text.clone()];
            let target_begin = target.len();
            let mut last = 0;
            let mut word_index = 0;

            for found in tokens.find_iter(sentence) {
                target.push_str(&sentence[last..found.start()]);
                last = found.end();

                let token = found.as_str();
                if token.starts_with('<') {
                    target.push_str(token);
                    continue;
                }

                match lexicon.lookup(token) {
                    Some(translation) => {
                        target.push_str(&match_case(token, translation));
                        scores.push(1.0);
                    }
                    None => {
                        target.push_str(token);
                        scores.push(0.0);
                    }
                }
                alignments.push(AlignmentPoint {
                    sentence: index,
                    source: word_index,
                    target: word_index,
                });
                word_index += 1;
            }
            target.push_str(&sentence[last..]);

            mappings.push(SentenceMapping {
                source: segment.text.clone().into(),
                target: (target_begin..target.len()).into(),
            });
            target.push_str(&source[segment.gap]);
        }

        Ok(Response {
            source: source.to_string(),
            target,
            quality_scores: options.quality_scores.then_some(scores),
            alignments: options.alignment.then_some(alignments),
            sentence_mappings: options.sentence_mappings.then_some(mappings),
        })
    }
}

struct Segment {
    text: Range<usize>,
    gap: Range<usize>,
}

/// Split `text` into sentences and the whitespace that follows each one
fn split_sentences(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut start = 0;

    for captures in sentence_break().captures_iter(text) {
        let Some(gap) = captures.get(1) else { continue };
        segments.push(Segment {
            text: start..gap.start(),
            gap: gap.range(),
        });
        start = gap.end();
    }

    if start < text.len() {
        segments.push(Segment {
            text: start..text.len(),
            gap: text.len()..text.len(),
        });
    }

    segments
}

/// Carry a leading capital from `source` over to `translation`
fn match_case(source: &str, translation: &str) -> String {
    let source_upper = source.chars().next().is_some_and(char::is_uppercase);
    let mut chars = translation.chars();

    match chars.next() {
        Some(first) if source_upper && first.is_lowercase() => {
            first.to_uppercase().chain(chars).collect()
        }
        _ => translation.to_string(),
    }
}
