//! Word corpus, candidate selection and guess validation

use crate::error::WordError;
use rand::seq::index;
use rand::Rng;
use shared::WORD_CHOICES;

/// Index of the variant shown to the drawing authority (English)
const LABEL_VARIANT: usize = 1;

/// One concept spelled in several languages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEntry {
    variants: Vec<String>,
}

impl WordEntry {
    pub fn new(variants: Vec<String>) -> Self {
        Self { variants }
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    /// Display label, falling back to the first non-empty variant
    pub fn label(&self) -> &str {
        self.variants
            .get(LABEL_VARIANT)
            .filter(|v| !v.is_empty())
            .or_else(|| self.variants.iter().find(|v| !v.is_empty()))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// True if `guess` equals any variant, ignoring case
    ///
    /// No trimming or fuzzy matching: `"house "` does not match `"House"`.
    /// Missing (empty) variants never match.
    pub fn matches(&self, guess: &str) -> bool {
        let guess = guess.to_lowercase();
        self.variants
            .iter()
            .filter(|variant| !variant.is_empty())
            .any(|variant| variant.to_lowercase() == guess)
    }
}

/// The full corpus loaded at startup
#[derive(Debug, Clone, Default)]
pub struct WordList {
    words: Vec<WordEntry>,
}

impl WordList {
    pub fn new(words: Vec<WordEntry>) -> Self {
        Self { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Draws three distinct entries uniformly at random, without replacement
    pub fn select_candidates<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<Vec<WordEntry>, WordError> {
        if self.words.len() < WORD_CHOICES {
            return Err(WordError::CorpusTooSmall {
                available: self.words.len(),
                required: WORD_CHOICES,
            });
        }

        Ok(index::sample(rng, self.words.len(), WORD_CHOICES)
            .into_iter()
            .map(|i| self.words[i].clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn entry(variants: &[&str]) -> WordEntry {
        WordEntry::new(variants.iter().map(|v| v.to_string()).collect())
    }

    fn corpus(size: usize) -> WordList {
        WordList::new(
            (0..size)
                .map(|i| entry(&[format!("Wort{}", i).as_str(), format!("word{}", i).as_str()]))
                .collect(),
        )
    }

    #[test]
    fn test_matches_any_variant_case_insensitively() {
        let word = entry(&["Haus", "House", "Будинок"]);

        assert!(word.matches("hOUSE"));
        assert!(word.matches("haus"));
        assert!(word.matches("будинок"));
        assert!(!word.matches("house "));
        assert!(!word.matches("hous"));
    }

    #[test]
    fn test_empty_variant_never_matches() {
        let word = entry(&["Haus", "House", ""]);
        assert!(!word.matches(""));
    }

    #[test]
    fn test_label() {
        assert_eq!(entry(&["Haus", "House"]).label(), "House");
        assert_eq!(entry(&["Haus", ""]).label(), "Haus");
        assert_eq!(entry(&[]).label(), "");
    }

    #[test]
    fn test_select_three_distinct() {
        let words = corpus(5);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let picks = words.select_candidates(&mut rng).unwrap();
            assert_eq!(picks.len(), 3);
            let labels: HashSet<&str> = picks.iter().map(|w| w.label()).collect();
            assert_eq!(labels.len(), 3);
        }
    }

    #[test]
    fn test_select_from_exactly_three() {
        let words = corpus(3);
        let mut rng = StdRng::seed_from_u64(1);

        let picks = words.select_candidates(&mut rng).unwrap();
        let labels: HashSet<&str> = picks.iter().map(|w| w.label()).collect();
        assert_eq!(labels, ["word0", "word1", "word2"].into_iter().collect());
    }

    #[test]
    fn test_select_covers_whole_corpus() {
        let words = corpus(6);
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = HashSet::new();

        for _ in 0..500 {
            for word in words.select_candidates(&mut rng).unwrap() {
                seen.insert(word.label().to_string());
            }
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn test_corpus_too_small() {
        let words = corpus(2);
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(
            words.select_candidates(&mut rng),
            Err(WordError::CorpusTooSmall {
                available: 2,
                required: 3,
            })
        );
    }
}
