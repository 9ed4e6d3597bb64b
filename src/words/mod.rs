pub mod bank;
pub mod difficulty;
pub mod filter;
pub mod source;
pub mod utils;

// Re-export the main types for convenience
pub use bank::{WordBank, WordCandidate};
pub use difficulty::Difficulty;
pub use filter::WordFilter;
pub use source::{load_pool, require_pool, CsvWordSource, EmbeddedWords, WordSource};
