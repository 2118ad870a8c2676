// src/main.rs
mod extractors;
mod fetch;
mod pipeline;
mod records;
mod storage;
mod utils;

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use extractors::{ExtractorConfig, OpenAiExtractor};
use fetch::{PageRenderer, WebTableSource};
use pipeline::{Pipeline, PipelineConfig};
use records::find_by_domain;
use storage::{RunMetadata, StorageManager};
use utils::AppError;

const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Command Line Interface for the bank rate extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Rate page URLs to process
    urls: Vec<String>,

    /// File with one URL per line (blank lines and `#` comments are ignored)
    #[arg(long)]
    url_file: Option<PathBuf>,

    /// Maximum characters of table text sent per inference call
    #[arg(long, default_value_t = pipeline::DEFAULT_CHUNK_SIZE)]
    chunk_size: NonZeroUsize,

    /// Pages fetched concurrently
    #[arg(long, default_value_t = pipeline::DEFAULT_MAX_WORKERS)]
    max_workers: usize,

    /// Segments of one page extracted concurrently
    #[arg(long, default_value_t = 1)]
    extract_concurrency: usize,

    /// Upper bound on fetching one page, in seconds
    #[arg(long, default_value_t = pipeline::DEFAULT_FETCH_TIMEOUT_SECS)]
    fetch_timeout_secs: u64,

    /// How long the headless fallback waits for a table, in seconds
    #[arg(long, default_value_t = fetch::render::DEFAULT_RENDER_WAIT_SECS)]
    render_wait_secs: u64,

    /// Disable the headless browser fallback
    #[arg(long)]
    no_render: bool,

    /// Inference model
    #[arg(long, default_value = extractors::llm::DEFAULT_MODEL)]
    model: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, default_value = extractors::llm::DEFAULT_API_BASE)]
    api_base: String,

    /// Output directory for results
    #[arg(short, long, default_value = "./output")]
    output_dir: String,

    /// Print the record for this domain (www. prefix optional)
    #[arg(short, long)]
    domain: Option<String>,

    /// Number of records to print as JSON
    #[arg(long, default_value_t = 10)]
    print: usize,

    /// Debug mode - save the serialized tables of every page
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting processing for args: {:?}", args);

    let urls = collect_urls(&args)?;
    if urls.is_empty() {
        return Err(AppError::Config("No URLs given; pass them as arguments or via --url-file".to_string()));
    }

    let api_key = std::env::var(API_KEY_VAR)
        .map_err(|_| AppError::Config(format!("{} is not set", API_KEY_VAR)))?;

    // 3. Initialize storage
    let storage = StorageManager::new(&args.output_dir)?;

    // 4. Wire the collaborators
    let mut extractor_config = ExtractorConfig::new(api_key);
    extractor_config.model = args.model.clone();
    extractor_config.api_base = args.api_base.clone();
    let extractor = OpenAiExtractor::new(extractor_config)?;

    let source = WebTableSource::new(build_renderer(&args))?;

    let config = PipelineConfig {
        max_workers: args.max_workers,
        extract_concurrency: args.extract_concurrency,
        fetch_timeout: Duration::from_secs(args.fetch_timeout_secs),
    };
    let pipeline = Pipeline::new(Box::new(source), Box::new(extractor), config);

    // 5. Run
    let output = pipeline.run(&urls, args.chunk_size).await;

    for failed in &output.unsuccessful {
        tracing::warn!("Unsuccessful URL {}: {}", failed.url, failed.reason);
    }

    // 6. Save results
    storage.save_output(&output)?;
    storage.save_run_metadata(&RunMetadata {
        model: &args.model,
        chunk_size: args.chunk_size.get(),
        urls_requested: urls.len(),
        urls_contributing: output.contributing_urls.len(),
        urls_unsuccessful: output.unsuccessful.len(),
        institutions: output.records.len(),
    })?;
    if args.debug {
        let written = storage.save_tables(&output.tables)?;
        tracing::info!("Saved serialized tables for {} page(s)", written.len());
    }

    // 7. Report
    for record in output.records.iter().take(args.print) {
        println!("{}", to_pretty_json(record)?);
        println!("\n{}\n", "-".repeat(40));
    }

    if let Some(domain) = &args.domain {
        match find_by_domain(&output.records, domain) {
            Some(record) => println!("{}", to_pretty_json(record)?),
            None => println!("No record found for domain: {}", domain),
        }
    }

    tracing::info!(
        "Processing finished. Institutions: {}, Unsuccessful URLs: {}",
        output.records.len(),
        output.unsuccessful.len()
    );

    if output.records.is_empty() && !output.unsuccessful.is_empty() {
        return Err(AppError::Processing(format!(
            "No data extracted from any of {} URL(s)",
            output.unsuccessful.len()
        )));
    }

    Ok(())
}

fn collect_urls(args: &Args) -> Result<Vec<String>, AppError> {
    let mut urls = args.urls.clone();
    if let Some(path) = &args.url_file {
        let contents = std::fs::read_to_string(path)?;
        urls.extend(parse_url_list(&contents));
        tracing::debug!("Read URLs from {}", path.display());
    }
    Ok(urls)
}

fn parse_url_list(contents: &str) -> impl Iterator<Item = String> + '_ {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
}

#[cfg(feature = "headless")]
fn build_renderer(args: &Args) -> Option<Box<dyn PageRenderer>> {
    if args.no_render {
        return None;
    }
    Some(Box::new(fetch::ChromeRenderer::new(Duration::from_secs(args.render_wait_secs))))
}

#[cfg(not(feature = "headless"))]
fn build_renderer(args: &Args) -> Option<Box<dyn PageRenderer>> {
    if !args.no_render {
        tracing::debug!(
            "Built without the `headless` feature; render wait of {}s unused",
            args.render_wait_secs
        );
    }
    None
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|e| AppError::Processing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_list_skips_comments_and_blanks() {
        let contents = "# credit unions\nhttps://www.dcu.org/bank/savings.html\n\n  https://verveacu.com/personal/  \n#https://skip.me\n";
        let urls: Vec<String> = parse_url_list(contents).collect();
        assert_eq!(urls, vec!["https://www.dcu.org/bank/savings.html", "https://verveacu.com/personal/"]);
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["rate_extractor", "https://www.simplicity.coop/rates"]).unwrap();
        assert_eq!(args.urls, vec!["https://www.simplicity.coop/rates"]);
        assert_eq!(args.chunk_size.get(), 500);
        assert_eq!(args.max_workers, 10);
        assert_eq!(args.model, "gpt-4o-mini-2024-07-18");
        assert!(!args.no_render);
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let result = Args::try_parse_from(["rate_extractor", "--chunk-size", "0", "https://a.example"]);
        assert!(result.is_err());
    }
}
