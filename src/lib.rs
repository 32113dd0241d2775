//! Speed-reading core: document ingestion, tokenizing, bionic transforms,
//! playback scheduling and paragraph windowing, plus the terminal front-end
//! that drives them.

pub mod cli;
pub mod config;
pub mod ebook;
pub mod errors;
pub mod fetch;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod parser;
pub mod playback;
pub mod settings;
pub mod tokenizer;
pub mod transform;
pub mod ui;
pub mod window;
