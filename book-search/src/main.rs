use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use book_search::{AppError, Dependencies, Settings};
use book_search_ingest::{convert_location, HttpSource, Schema, SourceLocation};

#[derive(Parser)]
#[command(name = "book-search")]
#[command(about = "Convert, seed and query the book search backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert delimited book data into a bulk-indexing payload
    Convert {
        /// URL or file path of the input (default: BOOKS_CSV_URL)
        #[arg(long)]
        source: Option<String>,

        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Index named in each action line; pass "" to omit it (default: BOOKS_INDEX)
        #[arg(long)]
        index: Option<String>,

        /// Field delimiter
        #[arg(long, default_value = ";")]
        delimiter: char,

        /// The input has no header row
        #[arg(long)]
        no_header: bool,

        /// Keep the first data row instead of skipping it
        #[arg(long)]
        keep_first_data_row: bool,
    },
    /// Create the index and load the book data into it
    Seed {
        /// URL or file path of the input (default: BOOKS_CSV_URL)
        #[arg(long)]
        source: Option<String>,
    },
    /// Count the books published in a year
    Count {
        #[arg(long)]
        year: i32,
    },
    /// List the authors with the longest publishing span within a year range
    MostPublished {
        #[arg(long)]
        from: i32,

        #[arg(long)]
        to: i32,
    },
    /// Check that the backend version is supported
    CheckVersion,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    if std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false) {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn delimiter_byte(delimiter: char) -> Result<u8, AppError> {
    match u8::try_from(delimiter) {
        Ok(byte) if byte.is_ascii() && byte != b'\n' && byte != b'\r' && byte != b'"' => Ok(byte),
        _ => Err(AppError::config(format!(
            "Delimiter must be a single ASCII character other than a quote or newline, got {:?}",
            delimiter
        ))),
    }
}

async fn run_convert(
    settings: Settings,
    source: Option<String>,
    output: Option<PathBuf>,
    index: Option<String>,
    schema: Schema,
) -> Result<()> {
    let location = SourceLocation::parse(&source.unwrap_or(settings.books_csv_url));
    let index = index.unwrap_or(settings.books_index);
    let timeout = settings.http_timeout;

    let summary = tokio::task::spawn_blocking(move || -> Result<_, AppError> {
        let http = HttpSource::new(Some(timeout))?;
        let sink: Box<dyn Write> = match &output {
            Some(path) => Box::new(File::create(path)?),
            None => Box::new(io::stdout()),
        };
        Ok(convert_location(
            &location,
            &http,
            BufWriter::new(sink),
            &schema,
            Some(&index),
        )?)
    })
    .await
    .context("Conversion task failed")??;

    info!(
        emitted = summary.emitted,
        skipped = summary.skipped,
        "Conversion finished"
    );
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_env()?;

    match cli.command {
        Commands::Convert {
            source,
            output,
            index,
            delimiter,
            no_header,
            keep_first_data_row,
        } => {
            let schema = Schema::books()
                .with_delimiter(delimiter_byte(delimiter)?)
                .with_header(!no_header)
                .with_skip_first_data_row(!keep_first_data_row);
            run_convert(settings, source, output, index, schema).await?;
        }
        Commands::Seed { source } => {
            let location = SourceLocation::parse(source.as_deref().unwrap_or(&settings.books_csv_url));
            let deps = Dependencies::new(settings)?;
            deps.verify().await?;

            let summary = deps
                .seed_loader()
                .seed(location, Schema::books())
                .await?;
            println!(
                "converted={} skipped={} indexed={} failed={}",
                summary.converted, summary.skipped, summary.indexed, summary.failed
            );
        }
        Commands::Count { year } => {
            let deps = Dependencies::new(settings)?;
            let published = deps
                .searcher()
                .await?
                .books_published_in_year(year)
                .await?;
            println!("{}", published);
        }
        Commands::MostPublished { from, to } => {
            let deps = Dependencies::new(settings)?;
            let authors = deps
                .searcher()
                .await?
                .most_published_authors(from, to)
                .await?;
            for author in authors {
                println!("{}", serde_json::to_string(&author)?);
            }
        }
        Commands::CheckVersion => {
            let deps = Dependencies::new(settings)?;
            let searcher = deps.searcher().await?;
            println!("{}", searcher.backend_version());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("Command failed: {}", e);
        eprintln!("Error: {}", e);

        for cause in e.chain().skip(1) {
            eprintln!("  Caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
