//! Los Libros Reader
//!
//! Renders one chapter page the way the reader loads it: stored highlights
//! injected and `#page` sized for the configured scroll-axis mode.
//!
//! Usage: `libros-reader <chapter.html> <book-file-name> <page>`

use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use libros_reader::highlights::{inject_highlights, prepare_document, HighlightConfig, HighlightStore, SqliteHighlightStore};
use libros_reader::{BookContext, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "libros_reader=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [chapter_path, book_file, page] = args.as_slice() else {
        bail!("usage: libros-reader <chapter.html> <book-file-name> <page>");
    };
    let page: i64 = page
        .parse()
        .with_context(|| format!("page must be a number, got {}", page))?;

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    let html = tokio::fs::read_to_string(chapter_path)
        .await
        .with_context(|| format!("reading {}", chapter_path))?;

    let store = SqliteHighlightStore::connect(&config.database.url)
        .await
        .context("opening highlight store")?;
    tracing::info!("Highlight store at {}", config.database.url);

    let book = BookContext::from_file_name(book_file);
    let records = store.all_by_book(&book.book_id, Some(page)).await?;

    let result = inject_highlights(&html, &records, &HighlightConfig::default());
    let document = prepare_document(&result.html, config.reader.scroll_direction)?;

    tracing::info!(
        book_id = %book.book_id,
        page,
        injected = result.injected_count,
        skipped = result.skipped.len(),
        mode = %config.reader.scroll_direction,
        "Chapter rendered"
    );

    println!("{}", document);
    Ok(())
}
