use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "lectern",
    version,
    about = "A terminal speed reader for EPUB, text, markdown and web articles.",
    long_about = None
)]
pub struct Cli {
    /// Read the system clipboard instead of SOURCE
    #[clap(short, long, conflicts_with = "SOURCE")]
    pub paste: bool,

    /// Print the normalized document and exit
    #[clap(short, long)]
    pub dump: bool,

    /// Print the word count and exit
    #[clap(short, long, conflicts_with = "dump")]
    pub tokens: bool,

    /// Print the document with bionic emphasis and exit
    #[clap(short, long, conflicts_with_all = ["dump", "tokens"])]
    pub bionic: bool,

    /// Use the continuous-scroll reader
    #[clap(short, long, conflicts_with = "rsvp")]
    pub scroll: bool,

    /// Use the word-flash reader
    #[clap(long)]
    pub rsvp: bool,

    /// Use a specific configuration file
    #[clap(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Enable debug output
    #[clap(long)]
    pub debug: bool,

    /// File path (.epub, .txt, .md, .html) or http(s) URL
    #[clap(name = "SOURCE")]
    pub source: Option<String>,
}
