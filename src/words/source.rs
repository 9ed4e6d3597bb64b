use super::{
    bank::{WordBank, WordCandidate},
    difficulty::Difficulty,
    filter::WordFilter,
    utils::{count_syllables, difficulty_from_syllables, is_valid_word},
};
use crate::error::{Error, Result};
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// Where practice words come from.
pub trait WordSource {
    /// Up to `count` randomly chosen words at `difficulty`.
    fn fetch_words(&self, difficulty: Difficulty, count: usize) -> Result<Vec<WordCandidate>>;
}

fn pick_random(words: &[WordCandidate], difficulty: Difficulty, count: usize) -> Vec<WordCandidate> {
    let matching = WordFilter::for_difficulty(difficulty).apply(words);
    matching
        .choose_multiple(&mut rand::thread_rng(), count)
        .map(|w| (*w).clone())
        .collect()
}

/// The word list compiled into the binary.
#[derive(Debug, Clone)]
pub struct EmbeddedWords {
    bank: WordBank,
}

impl EmbeddedWords {
    pub fn new() -> Result<Self> {
        Ok(Self {
            bank: WordBank::embedded()?,
        })
    }

    pub fn bank(&self) -> &WordBank {
        &self.bank
    }
}

impl WordSource for EmbeddedWords {
    fn fetch_words(&self, difficulty: Difficulty, count: usize) -> Result<Vec<WordCandidate>> {
        Ok(pick_random(&self.bank.words, difficulty, count))
    }
}

#[derive(Debug, Deserialize)]
struct CsvWord {
    text: String,
    syllables: Option<u32>,
    difficulty: Option<u8>,
    category: Option<String>,
}

/// Words loaded from a user CSV file with a `text,syllables,difficulty,category`
/// header. Only `text` is required; syllables are counted and difficulty derived
/// when missing. Rows that are not plain words are skipped.
#[derive(Debug, Clone)]
pub struct CsvWordSource {
    words: Vec<WordCandidate>,
}

impl CsvWordSource {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut words = Vec::new();

        for (row, record) in rdr.deserialize::<CsvWord>().enumerate() {
            let record = record?;
            if !is_valid_word(&record.text) {
                log::warn!("skipping word list row {}: {:?} is not a plain word", row + 1, record.text);
                continue;
            }
            let syllable_count = record
                .syllables
                .filter(|s| *s > 0)
                .unwrap_or_else(|| count_syllables(&record.text));
            let difficulty = match record.difficulty {
                Some(level) => Difficulty::try_from(level)?,
                None => difficulty_from_syllables(syllable_count),
            };
            words.push(WordCandidate {
                id: format!("csv-{}", row + 1),
                text: record.text.to_lowercase(),
                syllable_count,
                difficulty,
                category: record.category.filter(|c| !c.is_empty()),
            });
        }

        log::debug!("loaded {} words from csv", words.len());
        Ok(Self { words })
    }

    pub fn words(&self) -> &[WordCandidate] {
        &self.words
    }
}

impl WordSource for CsvWordSource {
    fn fetch_words(&self, difficulty: Difficulty, count: usize) -> Result<Vec<WordCandidate>> {
        Ok(pick_random(&self.words, difficulty, count))
    }
}

/// Fetches `count_per_level` words for every difficulty and concatenates them, so
/// a session can switch difficulty without refetching. A failed fetch for one
/// level contributes nothing; the generator then reports "no word" for it.
pub fn load_pool(source: &dyn WordSource, count_per_level: usize) -> Vec<WordCandidate> {
    Difficulty::ALL
        .iter()
        .flat_map(|&d| match source.fetch_words(d, count_per_level) {
            Ok(words) => words,
            Err(e) => {
                log::warn!("failed to fetch {d} words: {e}");
                Vec::new()
            }
        })
        .collect()
}

/// Like [`load_pool`], but a pool with no words at all is a setup failure.
pub fn require_pool(source: &dyn WordSource, count_per_level: usize) -> Result<Vec<WordCandidate>> {
    let pool = load_pool(source, count_per_level);
    if pool.is_empty() {
        return Err(Error::EmptyWordPool);
    }
    Ok(pool)
}
