//! Word Frequency Analyzer
//!
//! Ranks title words for the word cloud in two passes so that one prolific
//! source cannot flood the cloud with its own vocabulary:
//!
//! 1. [`candidate_words`]: each source nominates its own top words.
//! 2. [`global_ranking`]: the nominated words are counted across every title
//!    regardless of source, and ranked by that global count.
//!
//! All counting keeps first-seen order, so equal counts tie-break the same
//! way on every run.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use newscloud_core::{CoreError, CoreResult, FeedItem, RankedWord, WordFrequencyEntry};

/// Common words excluded from every cloud
pub const BASELINE_STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "was", "are", "be", "has", "have", "had", "do", "does", "did", "will",
    "would", "could", "should", "may", "might", "can", "this", "that", "these", "those", "it",
    "its", "they", "their", "them", "he", "she", "his", "her", "who", "what", "when", "where",
    "why", "how", "which", "all", "each", "every", "both", "few", "more", "most", "other",
    "some", "such", "no", "not", "only", "own", "same", "so", "than", "too", "very", "just",
    "said", "says", "after", "also", "been", "about", "over", "into", "through", "during",
    "before", "between", "under", "again", "further", "then", "once", "here", "there", "make",
    "gets", "made", "being",
];

/// Configuration for the analyzer and the font-size mapping
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Shortest token that counts as a word
    pub min_word_len: usize,
    /// Total candidate slots shared out between sources
    pub candidate_budget: usize,
    /// Most words returned by the global ranking
    pub max_ranked: usize,
    /// Font size of the least frequent ranked word
    pub min_font_size: f64,
    /// Font size of the most frequent ranked word
    pub max_font_size: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_word_len: 4,
            candidate_budget: 800,
            max_ranked: 600,
            min_font_size: 14.0,
            max_font_size: 48.0,
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.min_word_len == 0 {
            return Err(CoreError::invalid_value("min_word_len", "must be at least 1"));
        }
        if self.candidate_budget == 0 || self.max_ranked == 0 {
            return Err(CoreError::invalid_value(
                "candidate_budget/max_ranked",
                "must be at least 1",
            ));
        }
        if !(self.min_font_size.is_finite() && self.max_font_size.is_finite())
            || self.min_font_size <= 0.0
            || self.min_font_size > self.max_font_size
        {
            return Err(CoreError::invalid_value(
                "font size range",
                format!(
                    "{}..{} is not a positive ascending range",
                    self.min_font_size, self.max_font_size
                ),
            ));
        }
        Ok(())
    }
}

/// Case-folded set of words excluded from analysis
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// The built-in list only
    pub fn baseline() -> Self {
        Self::with_custom(std::iter::empty::<&str>())
    }

    /// The built-in list plus operator-supplied words
    pub fn with_custom<I, S>(custom: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = BASELINE_STOP_WORDS
            .iter()
            .map(|w| w.to_string())
            .chain(
                custom
                    .into_iter()
                    .map(|w| w.as_ref().trim().to_lowercase())
                    .filter(|w| !w.is_empty()),
            )
            .collect();
        Self { words }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Split a title into lowercase ASCII-alphabetic words of at least `min_len`.
///
/// A word is a whole run of `[a-z0-9_]` made only of letters, so tokens glued
/// to digits (`covid19`) are skipped rather than cut.
pub fn tokenize(title: &str, min_len: usize) -> Vec<String> {
    title
        .to_lowercase()
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|run| run.len() >= min_len && run.bytes().all(|b| b.is_ascii_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Word counts that remember first-seen order
#[derive(Debug, Default)]
struct WordCounter {
    index: HashMap<String, usize>,
    counts: Vec<(String, usize)>,
}

impl WordCounter {
    fn add(&mut self, word: String) {
        match self.index.get(&word) {
            Some(&idx) => self.counts[idx].1 += 1,
            None => {
                self.index.insert(word.clone(), self.counts.len());
                self.counts.push((word, 1));
            }
        }
    }

    /// Highest count first; equal counts keep first-seen order
    fn into_ranked(mut self) -> Vec<(String, usize)> {
        self.counts.sort_by(|a, b| b.1.cmp(&a.1));
        self.counts
    }
}

/// Per-source pass: the union of every source's top words.
///
/// Each source may nominate `ceil(candidate_budget / source_count)` words.
/// The result keeps first-nominated order and holds no duplicates.
pub fn candidate_words(
    items: &[FeedItem],
    stop_words: &StopWords,
    config: &AnalyzerConfig,
) -> Vec<String> {
    let mut source_index: HashMap<&str, usize> = HashMap::new();
    let mut per_source: Vec<WordCounter> = Vec::new();

    for item in items {
        let idx = *source_index.entry(item.source.as_str()).or_insert_with(|| {
            per_source.push(WordCounter::default());
            per_source.len() - 1
        });

        for word in tokenize(&item.title, config.min_word_len) {
            if !stop_words.contains(&word) {
                per_source[idx].add(word);
            }
        }
    }

    if per_source.is_empty() {
        return Vec::new();
    }

    let words_per_source = config.candidate_budget.div_ceil(per_source.len());
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for counter in per_source {
        for (word, _) in counter.into_ranked().into_iter().take(words_per_source) {
            if seen.insert(word.clone()) {
                candidates.push(word);
            }
        }
    }

    debug!(
        "Collected {} unique candidate words from {} sources",
        candidates.len(),
        source_index.len()
    );
    candidates
}

/// Global pass: count only `candidates` across every title, highest first.
///
/// Candidates that never occur are omitted. At most `max_ranked` entries.
pub fn global_ranking(
    items: &[FeedItem],
    candidates: &[String],
    config: &AnalyzerConfig,
) -> Vec<WordFrequencyEntry> {
    let candidate_set: HashSet<&str> = candidates.iter().map(String::as_str).collect();
    let mut counter = WordCounter::default();

    for item in items {
        for word in tokenize(&item.title, config.min_word_len) {
            if candidate_set.contains(word.as_str()) {
                counter.add(word);
            }
        }
    }

    counter
        .into_ranked()
        .into_iter()
        .take(config.max_ranked)
        .map(|(word, count)| WordFrequencyEntry { word, count })
        .collect()
}

/// Both passes over one item set
pub fn analyze(
    items: &[FeedItem],
    stop_words: &StopWords,
    config: &AnalyzerConfig,
) -> Vec<WordFrequencyEntry> {
    let candidates = candidate_words(items, stop_words, config);
    global_ranking(items, &candidates, config)
}

/// Linear map from count to font size; equal counts get the minimum size
pub fn font_size_for(
    count: usize,
    min_count: usize,
    max_count: usize,
    config: &AnalyzerConfig,
) -> f64 {
    let span = max_count.saturating_sub(min_count).max(1) as f64;
    let normalized = count.saturating_sub(min_count) as f64 / span;
    config.min_font_size + normalized * (config.max_font_size - config.min_font_size)
}

/// Attach font sizes to a ranking, keeping its order
pub fn assign_font_sizes(
    entries: &[WordFrequencyEntry],
    config: &AnalyzerConfig,
) -> Vec<RankedWord> {
    let Some(max_count) = entries.iter().map(|e| e.count).max() else {
        return Vec::new();
    };
    let min_count = entries.iter().map(|e| e.count).min().unwrap_or(max_count);

    entries
        .iter()
        .map(|e| RankedWord {
            word: e.word.clone(),
            count: e.count,
            font_size: font_size_for(e.count, min_count, max_count, config),
        })
        .collect()
}
