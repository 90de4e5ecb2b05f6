//! TF-IDF text vectorization
//!
//! Turns listing feature strings into L2-normalized TF-IDF rows so that
//! cosine similarity between two documents reduces to a dot product.
//! Tokens are lowercased, must be at least two characters, and English stop
//! words are removed. IDF is smoothed: `ln((1 + n) / (1 + df)) + 1`.
//!
//! State lives only for one fit; nothing is persisted between requests.

use ndarray::Array2;
use std::collections::{BTreeMap, HashSet};

/// Common English stop words removed before vectorization
const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "cannot", "could", "did", "do", "does", "doing", "down", "during", "each",
    "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "him", "his", "how", "if", "in", "into", "is", "it", "its", "itself", "just", "me", "more",
    "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or",
    "other", "our", "ours", "out", "over", "own", "same", "she", "should", "so", "some", "such",
    "than", "that", "the", "their", "theirs", "them", "then", "there", "these", "they", "this",
    "those", "through", "to", "too", "under", "until", "up", "very", "was", "we", "were", "what",
    "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would", "you",
    "your", "yours",
];

/// TF-IDF vectorizer over whitespace/punctuation-delimited tokens
pub struct TfidfVectorizer {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
    stop_words: HashSet<&'static str>,
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self {
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
            stop_words: ENGLISH_STOP_WORDS.iter().copied().collect(),
        }
    }

    /// Learn the vocabulary and IDF weights from `documents` and return the
    /// L2-normalized TF-IDF matrix (`documents.len()` × vocabulary size).
    ///
    /// Documents with no usable tokens become zero rows; an entirely empty
    /// corpus yields a zero-width matrix.
    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> Array2<f64> {
        let tokenized: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| self.tokenize(doc.as_ref()))
            .collect();

        // Vocabulary in sorted term order, document frequency per term
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for tokens in &tokenized {
            let unique: HashSet<&String> = tokens.iter().collect();
            for term in unique {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
        }

        self.vocabulary = document_frequency
            .keys()
            .enumerate()
            .map(|(index, term)| (term.clone(), index))
            .collect();

        let n_docs = documents.len();
        self.idf = document_frequency
            .values()
            .map(|&df| ((1.0 + n_docs as f64) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let vocab_size = self.vocabulary.len();
        let mut matrix = Array2::<f64>::zeros((n_docs, vocab_size));

        for (doc_index, tokens) in tokenized.iter().enumerate() {
            for token in tokens {
                if let Some(&term_index) = self.vocabulary.get(token) {
                    matrix[[doc_index, term_index]] += 1.0;
                }
            }

            let mut row = matrix.row_mut(doc_index);
            for (term_index, value) in row.iter_mut().enumerate() {
                *value *= self.idf[term_index];
            }
            let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                row.mapv_inplace(|v| v / norm);
            }
        }

        matrix
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| token.chars().count() >= 2)
            .filter(|token| !self.stop_words.contains(token))
            .map(|token| token.to_string())
            .collect()
    }
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Average cosine similarity of each candidate row against all learning rows
///
/// Both matrices must come from the same fit (rows already L2-normalized),
/// so cosine similarity is a plain dot product.
pub fn mean_similarity(
    learning: ndarray::ArrayView2<'_, f64>,
    candidates: ndarray::ArrayView2<'_, f64>,
) -> Vec<f64> {
    let n_learning = learning.nrows();
    if n_learning == 0 {
        return vec![0.0; candidates.nrows()];
    }

    candidates
        .rows()
        .into_iter()
        .map(|candidate| {
            let total: f64 = learning
                .rows()
                .into_iter()
                .map(|learned| learned.dot(&candidate))
                .sum();
            total / n_learning as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_documents_have_similarity_one() {
        let docs = vec!["bmw bmw 320 diesel automatic", "bmw bmw 320 diesel automatic"];
        let mut vectorizer = TfidfVectorizer::new();
        let matrix = vectorizer.fit_transform(&docs);

        let a = matrix.row(0);
        let b = matrix.row(1);
        assert!((a.dot(&b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_documents_have_similarity_zero() {
        let docs = vec!["toyota corolla petrol", "bmw 320 diesel"];
        let mut vectorizer = TfidfVectorizer::new();
        let matrix = vectorizer.fit_transform(&docs);

        assert!((matrix.row(0).dot(&matrix.row(1))).abs() < 1e-9);
    }

    #[test]
    fn test_shared_terms_score_between() {
        let docs = vec![
            "audi a4 diesel sedan",
            "audi a6 diesel sedan",
            "fiat panda petrol hatchback",
        ];
        let mut vectorizer = TfidfVectorizer::new();
        let matrix = vectorizer.fit_transform(&docs);

        let same_brand = matrix.row(0).dot(&matrix.row(1));
        let cross_brand = matrix.row(0).dot(&matrix.row(2));
        assert!(same_brand > 0.0 && same_brand < 1.0);
        assert!((cross_brand).abs() < 1e-9);
    }

    #[test]
    fn test_stop_words_and_short_tokens_removed() {
        let docs = vec!["the a of and x suv"];
        let mut vectorizer = TfidfVectorizer::new();
        vectorizer.fit_transform(&docs);
        assert_eq!(vectorizer.vocabulary_size(), 1);
    }

    #[test]
    fn test_empty_corpus() {
        let docs: Vec<String> = vec![String::new(), String::new()];
        let mut vectorizer = TfidfVectorizer::new();
        let matrix = vectorizer.fit_transform(&docs);
        assert_eq!(matrix.nrows(), 2);
        assert_eq!(matrix.ncols(), 0);
    }

    #[test]
    fn test_mean_similarity_averages_over_learning_rows() {
        let docs = vec![
            "vw golf petrol",
            "vw polo petrol",
            "vw golf petrol hatchback",
        ];
        let mut vectorizer = TfidfVectorizer::new();
        let matrix = vectorizer.fit_transform(&docs);

        let (learning, candidates) = matrix.view().split_at(ndarray::Axis(0), 2);
        let sims = mean_similarity(learning, candidates);
        assert_eq!(sims.len(), 1);

        let expected =
            (matrix.row(0).dot(&matrix.row(2)) + matrix.row(1).dot(&matrix.row(2))) / 2.0;
        assert!((sims[0] - expected).abs() < 1e-9);
    }
}
