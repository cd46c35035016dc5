use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use pubharvest::config::{load_config, HarvestConfig};
use pubharvest::models::{ArticleRecord, CitationSource};
use pubharvest::output::save_report;
use pubharvest::utils::{NoopProgress, ProgressObserver};
use pubharvest::Harvester;

/// Search PubMed for journal articles, enrich them with abstracts and citation
/// counts, and export the keyword-matching subset as JSON.
#[derive(Parser, Debug)]
#[command(name = "pubharvest")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Harvest, enrich, and filter journal articles from PubMed", long_about = None)]
struct Cli {
    /// Journal title to search
    #[arg(long)]
    journal: Option<String>,

    /// Start year for the search range
    #[arg(long)]
    from_year: Option<String>,

    /// End year for the search range
    #[arg(long)]
    to_year: Option<String>,

    /// Maximum articles to fetch, -1 for all
    #[arg(long)]
    max_articles: Option<i64>,

    /// Output JSON file path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Keyword to filter on (repeatable; replaces the default list)
    #[arg(long = "keyword")]
    keywords: Vec<String>,

    /// Include all article types (reviews, editorials, letters, comments)
    #[arg(long)]
    include_all_types: bool,

    /// Skip the citation enrichment stage
    #[arg(long)]
    skip_citations: bool,

    /// Configuration file path (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging (-v debug, -vv trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default = if quiet {
        "pubharvest=error"
    } else {
        match verbose {
            0 => "pubharvest=info",
            1 => "pubharvest=debug",
            _ => "pubharvest=trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Progress observer backed by an indicatif bar.
#[derive(Default)]
struct BarProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressObserver for BarProgress {
    fn begin(&self, task: &str, total: u64) {
        let bar = ProgressBar::new(total);
        let style = ProgressStyle::with_template("{msg:25} {bar:40.cyan/blue} {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_message(task.to_string());
        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    fn advance(&self, delta: u64) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                bar.inc(delta);
            }
        }
    }

    fn finish(&self) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }
}

fn apply_overrides(config: &mut HarvestConfig, cli: &Cli) {
    if let Some(journal) = &cli.journal {
        config.journal = journal.clone();
    }
    if let Some(from_year) = &cli.from_year {
        config.from_year = from_year.clone();
    }
    if let Some(to_year) = &cli.to_year {
        config.to_year = to_year.clone();
    }
    if let Some(max_articles) = cli.max_articles {
        config.max_articles = max_articles;
    }
    if let Some(output) = &cli.output {
        config.output = output.clone();
    }
    if !cli.keywords.is_empty() {
        config.keywords = cli.keywords.clone();
    }
    if cli.include_all_types {
        config.research_only = false;
    }
    if cli.skip_citations {
        config.fetch_citations = false;
    }
}

fn print_summary(record: &ArticleRecord) {
    const MAX_ABSTRACT_LEN: usize = 150;

    println!("- Title: {}", record.title);
    if record.abstract_text.is_empty() {
        println!("  Abstract: N/A");
    } else {
        let mut snippet: String = record.abstract_text.chars().take(MAX_ABSTRACT_LEN).collect();
        if record.abstract_text.chars().count() > MAX_ABSTRACT_LEN {
            snippet.push_str("...");
        }
        println!("  Abstract: {}", snippet);
    }
    println!("  PMID: {}", record.pmid);
    println!("  DOI: {}", record.doi);
    println!("  URL: {}", record.url);
    println!("  Date: {}", record.pub_date);
    if record.citation_source != CitationSource::None {
        println!(
            "  Citations: {} ({})",
            record.citation_count, record.citation_source
        );
    }
    if record.authors.is_empty() {
        println!("  Authors: N/A");
    } else {
        println!("  Authors: {}", record.authors.join(", "));
    }
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => HarvestConfig::default(),
    };
    apply_overrides(&mut config, &cli);

    if !cli.quiet {
        println!(
            "Searching PubMed for articles from '{}' between {} and {}...",
            config.journal, config.from_year, config.to_year
        );
        if config.research_only {
            println!("Filtering for research articles only (excluding reviews, editorials, letters, and comments).");
        }
        if config.max_articles == -1 {
            println!("No maximum limit specified; will fetch all results until none remain.");
        } else {
            println!("Will fetch up to {} articles.", config.max_articles);
        }
    }

    let output_path = config.output.clone();
    let harvester = Harvester::new(config)?;

    let report = if cli.quiet {
        harvester.run(&NoopProgress).await
    } else {
        harvester.run(&BarProgress::default()).await
    };

    if !cli.quiet {
        println!(
            "\nFound {} of {} articles containing at least one keyword:\n",
            report.num_relevant_articles, report.num_total_articles
        );
        for record in report.relevant_articles.iter().take(5) {
            print_summary(record);
        }
    }

    save_report(&output_path, &report)?;
    if !cli.quiet {
        println!("Results saved to {}", output_path.display());
    }

    Ok(())
}
