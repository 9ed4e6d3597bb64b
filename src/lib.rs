// Library surface for the binary and for headless/integration tests.
pub mod app_dirs;
mod assets;
pub mod beats;
pub mod clock;
pub mod config;
pub mod error;
pub mod history;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod timing;
pub mod util;
pub mod word_generator;
pub mod words;

pub use error::{Error, Result};
