use lectern::{
    cli::Cli,
    config::{CONFIG_FILENAME, Config},
    ingest::{Ingestor, create_content, normalize},
    logging::{self, LogLevel},
    models::{
        ContentSource, DocumentKind, NormalizedDocument, ReadingContent, SourceDocument, SourceKind,
    },
    playback::{CommandSpeech, FlashScheduler, ScrollScheduler, SilentSpeech, Speech},
    settings::{ReadingMode, Settings},
    tokenizer::{TokenStream, TokenizeEvent, TokenizerConfig, spawn_tokenize, tokenize},
    ui::{
        self, FlashReader, ScrollReader,
        board::Board,
        style::{TextStyler, to_ansi},
    },
    window::{paragraphs_for, split_paragraphs},
};

use arboard::Clipboard;
use clap::Parser;
use eyre::{Result, WrapErr, bail};
use std::{fs, path::Path, path::PathBuf};

/// Widest line `--bionic` prints.
const MAX_PRINT_WIDTH: usize = 100;

/// What a SOURCE argument turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Source(SourceKind),
    Html,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(LogLevel::from_verbosity(cli.verbose, cli.debug));

    let config = match &cli.config {
        Some(path) => Config::load_from(path.clone())?,
        None => Config::new().unwrap_or_else(|err| {
            log::warn!("Could not load configuration: {err}. Starting with default settings");
            Config::with_settings(Settings::default(), PathBuf::from(CONFIG_FILENAME))
        }),
    };
    log::debug!("configuration: {}", config.filepath().display());
    let settings = config.settings.clamped();

    let (document, source) = load_document(cli.source.as_deref(), cli.paste)?;

    if cli.dump {
        println!("{}\n\n{}", document.title, document.content);
        return Ok(());
    }
    if cli.bionic {
        print_bionic(&document, &settings);
        return Ok(());
    }

    let tokens = tokenize_document(&document.content, settings.tokenizer_config());
    if cli.tokens {
        println!("{} words", tokens.len());
        return Ok(());
    }

    let content = create_content(document, source, tokens);
    let scroll = cli.scroll || (!cli.rsvp && settings.reading_mode == ReadingMode::Scroll);
    run_reader(content, &settings, scroll)
}

fn classify(source: &str) -> Option<Input> {
    if source.starts_with("http://") || source.starts_with("https://") {
        return Some(Input::Source(SourceKind::Url));
    }
    let extension = Path::new(source)
        .extension()?
        .to_string_lossy()
        .to_ascii_lowercase();
    match extension.as_str() {
        "epub" => Some(Input::Source(SourceKind::EpubFile)),
        "txt" => Some(Input::Source(SourceKind::TxtFile)),
        "md" | "markdown" => Some(Input::Source(SourceKind::MdFile)),
        "html" | "htm" | "xhtml" => Some(Input::Html),
        _ => None,
    }
}

fn load_document(source: Option<&str>, paste: bool) -> Result<(NormalizedDocument, ContentSource)> {
    let ingestor = Ingestor::default();
    if paste {
        let text = Clipboard::new()?.get_text()?;
        let document = ingestor.ingest(SourceKind::Paste, text.as_bytes(), None)?;
        return Ok((document, ContentSource::Paste));
    }

    let Some(source) = source else {
        bail!("No SOURCE given. Pass a file or URL, or --paste to read the clipboard.");
    };
    let Some(input) = classify(source) else {
        bail!("Unsupported source {source:?}: expected .epub, .txt, .md, .html or an http(s) URL");
    };

    let document = match input {
        Input::Source(SourceKind::Url) => {
            ingestor.ingest(SourceKind::Url, source.as_bytes(), Some(source))?
        }
        Input::Source(kind) => {
            let bytes = fs::read(source).wrap_err_with(|| format!("Could not read {source}"))?;
            ingestor.ingest(kind, &bytes, Some(source))?
        }
        Input::Html => {
            let bytes = fs::read(source).wrap_err_with(|| format!("Could not read {source}"))?;
            normalize(&SourceDocument::new(DocumentKind::Html, bytes).with_name(source))?
        }
    };
    let origin = match input {
        Input::Source(kind) => ContentSource::from(kind),
        Input::Html => ContentSource::Paste,
    };
    Ok((document, origin))
}

/// Tokenize on a worker thread, logging progress for long texts.
fn tokenize_document(content: &str, config: TokenizerConfig) -> TokenStream {
    let large = content.len() > config.large_threshold;
    for event in spawn_tokenize(content.to_string(), config) {
        match event {
            TokenizeEvent::Progress(percent) if large => log::info!("preparing text: {percent}%"),
            TokenizeEvent::Progress(_) => {}
            TokenizeEvent::Done(tokens) => return tokens,
        }
    }
    log::warn!("tokenizer worker stopped early; tokenizing inline");
    tokenize(content, config, |_| {})
}

fn print_bionic(document: &NormalizedDocument, settings: &Settings) {
    let styler = TextStyler::for_text(settings);
    let width = crossterm::terminal::size()
        .map(|(columns, _)| columns as usize)
        .unwrap_or(80)
        .min(MAX_PRINT_WIDTH);

    println!("{}\n", document.title);
    for paragraph in split_paragraphs(&document.content) {
        for line in styler.paragraph_lines(&paragraph, width) {
            println!("{}", to_ansi(&line));
        }
        println!();
    }
}

fn run_reader(content: ReadingContent, settings: &Settings, scroll: bool) -> Result<()> {
    let voice = settings.voice();
    let speech: Box<dyn Speech> = match voice {
        Some(_) => Box::new(CommandSpeech::new(settings.tts_engine())),
        None => Box::new(SilentSpeech),
    };
    log::info!(
        "reading \"{}\" ({} words) in {} mode",
        content.title,
        content.word_count,
        if scroll { "scroll" } else { "flash" }
    );

    let mut terminal = ui::enter()?;
    let result = if scroll {
        let paragraphs = paragraphs_for(
            content.content.as_deref(),
            &content.words,
            settings.words_per_chunk,
        );
        let text = content
            .content
            .clone()
            .unwrap_or_else(|| content.words.join(" "));
        let scheduler = ScrollScheduler::new(text, speech)
            .with_speed(settings.scroll_speed)
            .with_voice(voice);
        let board = Board::new(paragraphs)
            .with_virtualization(settings.virtualization())
            .with_styler(TextStyler::for_text(settings));
        ScrollReader::new(content.title, scheduler, board).run(&mut terminal)
    } else {
        let scheduler = FlashScheduler::new(TokenStream::from(content.words), speech)
            .with_wpm(settings.wpm)
            .with_group_size(settings.group_size())
            .with_voice(voice);
        FlashReader::new(content.title, scheduler, TextStyler::for_flash(settings))
            .run(&mut terminal)
    };
    ui::leave(&mut terminal)?;
    result
}
