use crate::words::{Difficulty, WordCandidate};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::collections::VecDeque;

/// How many recently shown words are held back from selection.
pub const DEFAULT_MAX_RECENT: usize = 20;

/// Snapshot of generator bookkeeping, for diagnostics and the summary screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorStats {
    pub total_words: usize,
    pub available_for_difficulty: usize,
    pub used_words: usize,
    pub current_difficulty: Difficulty,
}

/// Hands out prompt words one at a time for the active difficulty while
/// keeping recently shown words out of rotation.
///
/// `recently_used` never exceeds `max_recent` entries. A recent word is only
/// returned again once every word at the active difficulty is recent, at which
/// point the window is cleared and selection retried once.
#[derive(Debug, Clone)]
pub struct WordGenerator {
    pool: Vec<WordCandidate>,
    difficulty: Difficulty,
    recently_used: VecDeque<String>,
    max_recent: usize,
    rng: StdRng,
}

impl WordGenerator {
    pub fn new(pool: Vec<WordCandidate>) -> Self {
        Self::with_rng(pool, StdRng::from_entropy())
    }

    /// Reproducible selection order, for tests and replays.
    pub fn with_seed(pool: Vec<WordCandidate>, seed: u64) -> Self {
        Self::with_rng(pool, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(pool: Vec<WordCandidate>, rng: StdRng) -> Self {
        Self {
            pool,
            difficulty: Difficulty::default(),
            recently_used: VecDeque::with_capacity(DEFAULT_MAX_RECENT + 1),
            max_recent: DEFAULT_MAX_RECENT,
            rng,
        }
    }

    pub fn with_max_recent(mut self, max_recent: usize) -> Self {
        self.max_recent = max_recent;
        self.trim_recent();
        self
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn pool(&self) -> &[WordCandidate] {
        &self.pool
    }

    pub fn recently_used(&self) -> impl Iterator<Item = &str> {
        self.recently_used.iter().map(String::as_str)
    }

    /// Switches the active level. Clears the recency window so words held back
    /// at another level are not suppressed here.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.recently_used.clear();
    }

    /// Clears the recency window, keeping difficulty and pool.
    pub fn reset(&mut self) {
        self.recently_used.clear();
    }

    /// Indices into `pool` eligible for the next draw.
    fn available(&self) -> Vec<usize> {
        self.pool
            .iter()
            .enumerate()
            .filter(|(_, w)| w.difficulty == self.difficulty)
            .filter(|(_, w)| !self.recently_used.contains(&w.text))
            .map(|(i, _)| i)
            .collect()
    }

    fn trim_recent(&mut self) {
        while self.recently_used.len() > self.max_recent {
            self.recently_used.pop_front();
        }
    }

    /// A random word at the active difficulty, or `None` when the pool has no
    /// words at that level.
    pub fn random_word(&mut self) -> Option<WordCandidate> {
        let mut available = self.available();

        if available.is_empty() {
            self.recently_used.clear();
            available = self.available();
        }

        let &idx = available.choose(&mut self.rng)?;
        let selected = self.pool[idx].clone();

        self.recently_used.push_back(selected.text.clone());
        self.trim_recent();

        Some(selected)
    }

    /// Up to `count` words; stops short only when the active level is empty.
    pub fn random_words(&mut self, count: usize) -> Vec<WordCandidate> {
        (0..count).map_while(|_| self.random_word()).collect()
    }

    pub fn stats(&self) -> GeneratorStats {
        GeneratorStats {
            total_words: self.pool.len(),
            available_for_difficulty: self
                .pool
                .iter()
                .filter(|w| w.difficulty == self.difficulty)
                .count(),
            used_words: self.recently_used.len(),
            current_difficulty: self.difficulty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn word(text: &str, difficulty: Difficulty) -> WordCandidate {
        WordCandidate {
            id: format!("id-{text}"),
            text: text.to_string(),
            syllable_count: 1,
            difficulty,
            category: None,
        }
    }

    fn pool_of(n: usize, difficulty: Difficulty) -> Vec<WordCandidate> {
        (0..n).map(|i| word(&format!("word{i}"), difficulty)).collect()
    }

    #[test]
    fn only_returns_words_at_active_difficulty() {
        let mut pool = pool_of(5, Difficulty::Medium);
        pool.extend(pool_of(5, Difficulty::Hard).into_iter().map(|mut w| {
            w.text = format!("hard-{}", w.text);
            w
        }));
        let mut generator = WordGenerator::with_seed(pool, 7);

        for _ in 0..50 {
            assert_eq!(generator.random_word().unwrap().difficulty, Difficulty::Medium);
        }
        generator.set_difficulty(Difficulty::Hard);
        for _ in 0..50 {
            assert_eq!(generator.random_word().unwrap().difficulty, Difficulty::Hard);
        }
    }

    #[test]
    fn no_repeat_within_recency_window() {
        let mut generator = WordGenerator::with_seed(pool_of(25, Difficulty::Medium), 42);
        let drawn: Vec<String> = (0..500)
            .map(|_| generator.random_word().unwrap().text)
            .collect();

        for (i, w) in drawn.iter().enumerate() {
            let window_start = i.saturating_sub(DEFAULT_MAX_RECENT);
            assert!(
                !drawn[window_start..i].contains(w),
                "{w} repeated within {DEFAULT_MAX_RECENT} draws at {i}"
            );
        }
    }

    #[test]
    fn pool_of_exactly_window_plus_one_never_wraps() {
        let mut generator = WordGenerator::with_seed(pool_of(21, Difficulty::Medium), 3);
        for _ in 0..200 {
            generator.random_word().unwrap();
            assert!(generator.stats().used_words <= DEFAULT_MAX_RECENT);
        }
    }

    #[test]
    fn small_pool_wraps_after_exhaustion() {
        let mut generator = WordGenerator::with_seed(pool_of(3, Difficulty::Medium), 1);
        let first: HashSet<String> = (0..3)
            .map(|_| generator.random_word().unwrap().text)
            .collect();
        assert_eq!(first.len(), 3, "first three draws must be distinct");

        // the fourth draw clears recency and may repeat
        let fourth = generator.random_word().unwrap();
        assert!(first.contains(&fourth.text));
        assert_eq!(generator.stats().used_words, 1);
    }

    #[test]
    fn empty_level_returns_none() {
        let mut generator = WordGenerator::with_seed(pool_of(4, Difficulty::Easy), 1);
        // default difficulty is Medium
        assert!(generator.random_word().is_none());
        assert!(generator.random_words(3).is_empty());
        generator.set_difficulty(Difficulty::Easy);
        assert!(generator.random_word().is_some());
    }

    #[test]
    fn empty_pool_returns_none() {
        let mut generator = WordGenerator::new(Vec::new());
        assert!(generator.random_word().is_none());
    }

    #[test]
    fn difficulty_switch_clears_history() {
        let mut pool = vec![word("legacy", Difficulty::Medium), word("melody", Difficulty::Medium)];
        pool.push(word("metamorphosis", Difficulty::Hard));
        let mut generator = WordGenerator::with_seed(pool, 11);

        let medium = generator.random_word().unwrap();
        generator.set_difficulty(Difficulty::Hard);
        assert_eq!(generator.recently_used().count(), 0);
        assert_eq!(generator.random_word().unwrap().text, "metamorphosis");

        generator.set_difficulty(Difficulty::Medium);
        assert_eq!(generator.recently_used().count(), 0);
        // the word used earlier at Medium is eligible again
        let mut seen = HashSet::new();
        for _ in 0..40 {
            seen.insert(generator.random_word().unwrap().text);
            generator.reset();
        }
        assert!(seen.contains(&medium.text));
    }

    #[test]
    fn reset_keeps_difficulty() {
        let mut generator = WordGenerator::with_seed(pool_of(5, Difficulty::Hard), 5);
        generator.set_difficulty(Difficulty::Hard);
        generator.random_words(3);
        assert_eq!(generator.stats().used_words, 3);
        generator.reset();
        assert_eq!(generator.stats().used_words, 0);
        assert_eq!(generator.difficulty(), Difficulty::Hard);
    }

    #[test]
    fn random_words_fills_request() {
        let mut generator = WordGenerator::with_seed(pool_of(3, Difficulty::Medium), 9);
        assert_eq!(generator.random_words(10).len(), 10);
    }

    #[test]
    fn smaller_window_is_respected() {
        let mut generator =
            WordGenerator::with_seed(pool_of(10, Difficulty::Medium), 2).with_max_recent(3);
        generator.random_words(8);
        assert_eq!(generator.stats().used_words, 3);
    }

    #[test]
    fn stats_reflect_pool() {
        let mut pool = pool_of(4, Difficulty::Medium);
        pool.push(word("extra", Difficulty::Easy));
        let generator = WordGenerator::new(pool);
        let stats = generator.stats();
        assert_eq!(stats.total_words, 5);
        assert_eq!(stats.available_for_difficulty, 4);
        assert_eq!(stats.used_words, 0);
        assert_eq!(stats.current_difficulty, Difficulty::Medium);
    }
}
