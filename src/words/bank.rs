use super::difficulty::Difficulty;
use crate::assets::embedded_file;
use crate::error::Result;
use serde::{Deserialize, Serialize};

const WORDS_FILE: &str = "words.json";

/// A prompt word. Immutable once loaded from a word source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCandidate {
    pub id: String,
    pub text: String,
    pub syllable_count: u32,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub category: Option<String>,
}

/// A named list of words, as stored in the embedded data directory.
#[derive(Debug, Clone, Deserialize)]
pub struct WordBank {
    pub name: String,
    pub words: Vec<WordCandidate>,
}

impl WordBank {
    /// The word list compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_json(embedded_file(WORDS_FILE)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn count_for(&self, difficulty: Difficulty) -> usize {
        self.words
            .iter()
            .filter(|w| w.difficulty == difficulty)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_bank_covers_every_difficulty() {
        let bank = WordBank::embedded().unwrap();
        assert_eq!(bank.name, "freestyle");
        assert!(!bank.is_empty());
        for d in Difficulty::ALL {
            assert!(bank.count_for(d) > 0, "no words for {d}");
        }
        assert!(bank.words.iter().all(|w| w.syllable_count >= 1));
    }

    #[test]
    fn bank_deserialization() {
        let json = br#"
        {
            "name": "test",
            "words": [
                {"id": "a", "text": "flow", "syllable_count": 1, "difficulty": 1},
                {"id": "b", "text": "legacy", "syllable_count": 3, "difficulty": 2, "category": "noun"}
            ]
        }
        "#;
        let bank = WordBank::from_json(json).unwrap();
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.words[0].category, None);
        assert_eq!(bank.words[1].difficulty, Difficulty::Medium);
    }

    #[test]
    fn rejects_bad_difficulty_in_data() {
        let json = br#"{"name": "x", "words": [{"id": "a", "text": "x", "syllable_count": 1, "difficulty": 9}]}"#;
        assert!(WordBank::from_json(json).is_err());
    }
}
