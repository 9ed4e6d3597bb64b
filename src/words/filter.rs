use super::{bank::WordCandidate, difficulty::Difficulty};

/// Simple query over a word list. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordFilter {
    pub difficulty: Option<Difficulty>,
    pub category: Option<String>,
    pub min_syllables: Option<u32>,
    pub max_syllables: Option<u32>,
}

impl WordFilter {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty: Some(difficulty),
            ..Self::default()
        }
    }

    pub fn matches(&self, word: &WordCandidate) -> bool {
        self.difficulty.map_or(true, |d| word.difficulty == d)
            && self.category.as_deref().map_or(true, |c| {
                word.category
                    .as_deref()
                    .is_some_and(|wc| wc.eq_ignore_ascii_case(c))
            })
            && self.min_syllables.map_or(true, |m| word.syllable_count >= m)
            && self.max_syllables.map_or(true, |m| word.syllable_count <= m)
    }

    pub fn apply<'a>(&self, words: &'a [WordCandidate]) -> Vec<&'a WordCandidate> {
        words.iter().filter(|w| self.matches(w)).collect()
    }
}
