//! Command-line harness for the bookstore catalog.
//!
//! ```bash
//! bookstore init catalog.db
//! bookstore search catalog.db king
//! bookstore search catalog.db pearson --title-only --physical true
//! bookstore add-book catalog.db "Romeo and Juliet" --author 2 --publisher 2
//! ```

use anyhow::{bail, Context, Result};
use bookstore_core::search::search;
use bookstore_core::{BookDraft, BookQuery, Catalog};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "\
usage:
  bookstore init <path>
      Create a catalog file, run migrations, and load the sample data.

  bookstore search <path> <query> [--title-only] [--format-type <id|name>] [--physical <true|false>]
      Search the catalog and print ranked hits as JSON.

  bookstore add-book <path> <title> --author <id> --publisher <id>
      Validate and insert a book.";

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("init") => cmd_init(&args[1..]),
        Some("search") => cmd_search(&args[1..]),
        Some("add-book") => cmd_add_book(&args[1..]),
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }
}

fn cmd_init(args: &[String]) -> Result<()> {
    let [path] = args else {
        bail!("usage: bookstore init <path>");
    };

    let catalog = Catalog::open(path).context("opening catalog")?;
    if catalog.book_count()? > 0 {
        bail!("catalog at {path} is not empty; refusing to reseed");
    }
    catalog.seed().context("seeding catalog")?;

    println!(
        "initialized {path}: {} books, {} authors, {} publishers",
        catalog.book_count()?,
        catalog.authors()?.len(),
        catalog.publishers()?.len(),
    );
    Ok(())
}

fn cmd_search(args: &[String]) -> Result<()> {
    let (Some(path), Some(text)) = (args.first(), args.get(1)) else {
        bail!("usage: bookstore search <path> <query> [options]");
    };

    let catalog = Catalog::open_read_only(path).context("opening catalog")?;
    let mut query = BookQuery::new(text.as_str());

    let mut rest = args[2..].iter();
    while let Some(flag) = rest.next() {
        match flag.as_str() {
            "--title-only" => query = query.title_only(),
            "--format-type" => {
                let value = rest
                    .next()
                    .context("--format-type requires an id or name")?;
                let format_type_id = match value.parse::<i64>() {
                    Ok(id) => id,
                    Err(_) => catalog
                        .format_type_by_name(value)?
                        .with_context(|| format!("unknown format type: {value}"))?
                        .id,
                };
                query = query.with_format_type(format_type_id);
            }
            "--physical" => {
                let value = rest.next().context("--physical requires true or false")?;
                let physical = value
                    .parse::<bool>()
                    .with_context(|| format!("invalid --physical value: {value}"))?;
                query = query.with_physical(physical);
            }
            other => bail!("unknown option: {other}"),
        }
    }

    let hits = search(&catalog, &query).context("search failed")?;
    println!("{}", serde_json::to_string_pretty(&hits)?);
    Ok(())
}

fn cmd_add_book(args: &[String]) -> Result<()> {
    let (Some(path), Some(title)) = (args.first(), args.get(1)) else {
        bail!("usage: bookstore add-book <path> <title> --author <id> --publisher <id>");
    };

    let mut draft = BookDraft {
        title: title.clone(),
        ..Default::default()
    };

    let mut rest = args[2..].iter();
    while let Some(flag) = rest.next() {
        match flag.as_str() {
            "--author" => {
                let value = rest.next().context("--author requires an id")?;
                draft.author_id = Some(value.parse().context("invalid author id")?);
            }
            "--publisher" => {
                let value = rest.next().context("--publisher requires an id")?;
                draft.publisher_id = Some(value.parse().context("invalid publisher id")?);
            }
            other => bail!("unknown option: {other}"),
        }
    }

    let catalog = Catalog::open(path).context("opening catalog")?;
    let id = catalog.add_book(&draft)?;
    let book = catalog
        .book(id)?
        .context("inserted book missing on readback")?;
    println!("{}", serde_json::to_string_pretty(&book)?);
    Ok(())
}
