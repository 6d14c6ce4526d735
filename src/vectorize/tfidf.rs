//! TF-IDF / count vectorizer over word and character n-grams.
//!
//! One implementation covers both the `tfidf` and `count` pipeline kinds:
//! the `count` kind is the same vectorizer with IDF weighting switched
//! off. N-gram range, document-frequency pruning, binary weighting,
//! analyzer choice and stop words are shared configuration knobs.

use std::collections::BTreeMap;

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{FormcastError, Result};
use crate::vectorize::sparse::SparseVector;
use crate::vectorize::stop_words::english_stop_words;

/// Token analyzer choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerKind {
    /// Lowercase word tokens, word n-grams joined with a space.
    Word,
    /// Lowercase character n-grams anchored within word boundaries.
    CharWb,
}

/// Sparse n-gram vectorizer with smooth IDF weighting.
///
/// The vocabulary is built once during [`fit_transform`](Self::fit_transform)
/// and frozen; transforming unseen text never errors and never grows the
/// vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    ngram_range: (usize, usize),
    min_df: usize,
    binary: bool,
    analyzer: AnalyzerKind,
    #[serde(default)]
    stop_words: Vec<String>,
    #[serde(default)]
    english_stop_words: bool,
    use_idf: bool,
    /// Token -> column index, assigned in first-seen document order.
    vocabulary: BTreeMap<String, usize>,
    /// Per-column IDF weight (all 1.0 when `use_idf` is off).
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Create an unfitted vectorizer.
    ///
    /// # Errors
    ///
    /// Returns an error if `ngram_range.0` is 0 or the range is inverted.
    pub fn new(
        ngram_range: (usize, usize),
        min_df: usize,
        binary: bool,
        analyzer: AnalyzerKind,
        use_idf: bool,
    ) -> Result<Self> {
        let (min_n, max_n) = ngram_range;
        if min_n == 0 {
            return Err(FormcastError::vectorize("min ngram length must be >= 1"));
        }
        if max_n < min_n {
            return Err(FormcastError::vectorize(format!(
                "max ngram length ({max_n}) must be >= min ngram length ({min_n})"
            )));
        }
        Ok(Self {
            ngram_range,
            min_df,
            binary,
            analyzer,
            stop_words: Vec::new(),
            english_stop_words: false,
            use_idf,
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
        })
    }

    /// Use an explicit stop word set (word analyzer only).
    pub fn with_stop_words(mut self, words: Vec<String>) -> Self {
        self.stop_words = words;
        self
    }

    /// Use the built-in English stop word list (word analyzer only).
    pub fn with_english_stop_words(mut self) -> Self {
        self.english_stop_words = true;
        self
    }

    /// Number of columns in the frozen vocabulary.
    pub fn vocab_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// IDF weight for a token, if it survived pruning.
    pub fn idf_weight(&self, token: &str) -> Option<f64> {
        self.vocabulary.get(token).map(|&idx| self.idf[idx])
    }

    /// Column index for a token, if present.
    pub fn column(&self, token: &str) -> Option<usize> {
        self.vocabulary.get(token).copied()
    }

    /// Check persisted vocabulary and IDF state for internal consistency.
    ///
    /// # Errors
    ///
    /// A mismatched IDF length or an out-of-range column index means the
    /// serialized state was corrupted.
    pub fn validate(&self) -> Result<()> {
        let size = self.vocabulary.len();
        if self.idf.len() != size {
            return Err(FormcastError::vectorize(format!(
                "{} idf weights for {size} vocabulary columns",
                self.idf.len()
            )));
        }
        for (token, &idx) in &self.vocabulary {
            if idx >= size {
                return Err(FormcastError::vectorize(format!(
                    "vocabulary index {idx} for token {token:?} is out of range"
                )));
            }
        }
        Ok(())
    }

    fn is_stop_word(&self, token: &str) -> bool {
        if self.stop_words.iter().any(|w| w == token) {
            return true;
        }
        self.english_stop_words && english_stop_words().contains(token)
    }

    /// Produce the n-gram token stream for a piece of text.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        match self.analyzer {
            AnalyzerKind::Word => self.word_ngrams(&lower),
            AnalyzerKind::CharWb => self.char_wb_ngrams(&lower),
        }
    }

    fn word_ngrams(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text
            .unicode_words()
            .filter(|w| !self.is_stop_word(w))
            .collect();

        let (min_n, max_n) = self.ngram_range;
        let mut tokens = Vec::new();
        for n in min_n..=max_n {
            if n > words.len() {
                break;
            }
            for window in words.windows(n) {
                tokens.push(window.join(" "));
            }
        }
        tokens
    }

    /// Character n-grams anchored inside word boundaries: each word is
    /// padded with one space on either side, every configured length is
    /// generated per word, and a word shorter than the n-gram length is
    /// emitted once as the whole padded token.
    fn char_wb_ngrams(&self, text: &str) -> Vec<String> {
        let (min_n, max_n) = self.ngram_range;
        let mut tokens = Vec::new();
        for word in text.split_whitespace() {
            let padded: Vec<char> = std::iter::once(' ')
                .chain(word.chars())
                .chain(std::iter::once(' '))
                .collect();
            let w_len = padded.len();
            for n in min_n..=max_n {
                let mut offset = 0;
                tokens.push(padded[0..n.min(w_len)].iter().collect());
                while offset + n < w_len {
                    offset += 1;
                    tokens.push(padded[offset..offset + n].iter().collect());
                }
                // Word shorter than n: the whole padded token was already
                // emitted and longer n would repeat it.
                if offset == 0 {
                    break;
                }
            }
        }
        tokens
    }

    /// Build the vocabulary and IDF table from a corpus and return the
    /// corpus vectors.
    ///
    /// A candidate token is retained only if it appears in at least
    /// `min_df` distinct documents; columns are assigned in first-seen
    /// document order. IDF is the smoothed `ln((1+N)/(1+df)) + 1`.
    pub fn fit_transform(&mut self, corpus: &[String]) -> Vec<SparseVector> {
        let n_docs = corpus.len();
        let analyzed: Vec<Vec<String>> = corpus.iter().map(|d| self.analyze(d)).collect();

        let mut df: AHashMap<String, usize> = AHashMap::new();
        let mut first_seen: Vec<String> = Vec::new();
        for tokens in &analyzed {
            let mut in_doc: AHashSet<&str> = AHashSet::new();
            for token in tokens {
                if in_doc.insert(token) {
                    let count = df.entry(token.clone()).or_insert(0);
                    if *count == 0 {
                        first_seen.push(token.clone());
                    }
                    *count += 1;
                }
            }
        }

        self.vocabulary.clear();
        let mut next_index = 0;
        for token in first_seen {
            if df[&token] >= self.min_df {
                self.vocabulary.insert(token, next_index);
                next_index += 1;
            }
        }

        self.idf = vec![1.0; next_index];
        if self.use_idf {
            for (token, &idx) in &self.vocabulary {
                let d = df[token] as f64;
                self.idf[idx] = ((1.0 + n_docs as f64) / (1.0 + d)).ln() + 1.0;
            }
        }

        analyzed.iter().map(|t| self.vectorize(t)).collect()
    }

    /// Vectorize one document against the frozen vocabulary.
    ///
    /// Unknown tokens contribute nothing; an all-unknown document yields
    /// an empty vector, which is not an error.
    pub fn transform(&self, text: &str) -> SparseVector {
        self.vectorize(&self.analyze(text))
    }

    fn vectorize(&self, tokens: &[String]) -> SparseVector {
        let mut counts: AHashMap<usize, f64> = AHashMap::new();
        for token in tokens {
            if let Some(&idx) = self.vocabulary.get(token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut vector = SparseVector::new(self.vocab_size());
        for (idx, count) in counts {
            let tf = if self.binary { 1.0 } else { count };
            vector.set(idx, tf * self.idf[idx]);
        }
        vector
    }
}
