use super::difficulty::Difficulty;
use regex::Regex;
use std::sync::OnceLock;

fn silent_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:[^laeiouy]es?|ed|[^laeiouy]e)$").expect("valid regex"))
}

fn vowel_group() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[aeiouy]{1,2}").expect("valid regex"))
}

/// Rough English syllable count. Never less than 1.
pub fn count_syllables(word: &str) -> u32 {
    let word = word.trim().to_lowercase();
    if word.chars().count() <= 3 {
        return 1;
    }

    let stripped = silent_suffix().replace(&word, "");
    let stripped = stripped.strip_prefix('y').unwrap_or(&stripped);

    (vowel_group().find_iter(stripped).count() as u32).max(1)
}

pub fn difficulty_from_syllables(syllables: u32) -> Difficulty {
    match syllables {
        0..=2 => Difficulty::Easy,
        3 => Difficulty::Medium,
        _ => Difficulty::Hard,
    }
}

/// At least two characters, ASCII letters only.
pub fn is_valid_word(word: &str) -> bool {
    word.len() >= 2 && word.chars().all(|c| c.is_ascii_alphabetic())
}

pub fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
