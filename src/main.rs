use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use coldopen::io::{
    load_factors, read_batch_input, write_batch_output, BatchRecord, DEFAULT_STYLE,
};
use coldopen::{
    run_outreach, AnthropicClient, AnthropicConfig, ContentFetcher, HttpFetcher, LlmClient,
    PersonalizationFactor, RunInput, SearchProvider, SerperClient, SerperConfig,
};

#[derive(Parser)]
#[command(name = "coldopen")]
#[command(author, version, about = "Cold outreach opener generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a personalized opener for a single person
    Run {
        /// Target person's first name
        #[arg(long)]
        first_name: String,

        /// Target person's last name
        #[arg(long)]
        last_name: String,

        /// Extra search keywords (company, field, ...)
        #[arg(long, default_value = "")]
        keywords: String,

        /// JSON file with personalization factors (built-in set if omitted)
        #[arg(long)]
        factors: Option<PathBuf>,

        /// Style preferences for the drafted opener
        #[arg(long)]
        style: Option<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Generate openers for every person in a CSV file
    Batch {
        /// Input CSV with first_name,last_name,keywords columns
        #[arg(short, long, default_value = "input.csv")]
        input: PathBuf,

        /// Output CSV file
        #[arg(short, long, default_value = "output.csv")]
        output: PathBuf,

        /// JSON file with personalization factors (built-in set if omitted)
        #[arg(long)]
        factors: Option<PathBuf>,

        /// Style preferences for the drafted opener
        #[arg(long)]
        style: Option<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            first_name,
            last_name,
            keywords,
            factors,
            style,
            verbose,
        } => {
            setup_logging(verbose);
            run_single(first_name, last_name, keywords, factors, style).await
        }
        Commands::Batch {
            input,
            output,
            factors,
            style,
            verbose,
        } => {
            setup_logging(verbose);
            run_batch(input, output, factors, style).await
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

struct Collaborators {
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn ContentFetcher>,
    llm: Arc<dyn LlmClient>,
}

fn build_collaborators() -> Result<Collaborators> {
    let search = Arc::new(SerperClient::new(SerperConfig::from_env()?));
    let fetcher = Arc::new(HttpFetcher::new()?);
    let llm = Arc::new(AnthropicClient::new(AnthropicConfig::from_env()?));
    Ok(Collaborators {
        search,
        fetcher,
        llm,
    })
}

fn build_input(
    first_name: String,
    last_name: String,
    keywords: String,
    factors: Vec<PersonalizationFactor>,
    style: Option<String>,
) -> RunInput {
    RunInput {
        first_name,
        last_name,
        keywords,
        personalization_factors: factors,
        style: style.unwrap_or_else(|| DEFAULT_STYLE.to_string()),
    }
}

async fn run_single(
    first_name: String,
    last_name: String,
    keywords: String,
    factors: Option<PathBuf>,
    style: Option<String>,
) -> Result<()> {
    let factors = load_factors(factors.as_deref())?;
    let input = build_input(first_name, last_name, keywords, factors, style);

    println!(
        "Generating personalized cold outreach opener for {} {}...",
        input.first_name, input.last_name
    );

    let collaborators = build_collaborators()?;
    let ctx = run_outreach(
        input,
        collaborators.search,
        collaborators.fetcher,
        collaborators.llm,
    )
    .await
    .context("pipeline run failed")?;

    println!("\n--- PERSONALIZATION INSIGHTS ---");
    if ctx.personalization.is_empty() {
        println!("No personalization factors were actionable.");
    } else {
        for (name, entry) in &ctx.personalization {
            println!("\n* {}:", name.to_uppercase());
            println!("  Details: {}", entry.details);
            println!("  Action: {}", entry.action);
        }
    }

    println!("\n--- GENERATED OPENING MESSAGE ---");
    println!("{}", ctx.output.opening_message.unwrap_or_default());

    Ok(())
}

async fn run_batch(
    input: PathBuf,
    output: PathBuf,
    factors: Option<PathBuf>,
    style: Option<String>,
) -> Result<()> {
    let factors = load_factors(factors.as_deref())?;
    let factor_names: Vec<String> = factors.iter().map(|f| f.name.clone()).collect();

    let rows = read_batch_input(&input)?;
    if rows.is_empty() {
        anyhow::bail!(
            "no rows found in {:?}; CSV needs first_name,last_name,keywords columns",
            input
        );
    }

    let collaborators = build_collaborators()?;
    let total = rows.len();
    let mut records = Vec::with_capacity(total);

    for (i, row) in rows.iter().enumerate() {
        info!(
            "processing {}/{}: {} {}",
            i + 1,
            total,
            row.first_name,
            row.last_name
        );

        let run_input = build_input(
            row.first_name.clone(),
            row.last_name.clone(),
            row.keywords.clone(),
            factors.clone(),
            style.clone(),
        );

        // One failed person must not abort the batch; record the error
        // marker and keep going.
        match run_outreach(
            run_input,
            Arc::clone(&collaborators.search),
            Arc::clone(&collaborators.fetcher),
            Arc::clone(&collaborators.llm),
        )
        .await
        {
            Ok(ctx) => {
                info!(
                    "generated opener: {}",
                    ctx.output.opening_message.as_deref().unwrap_or_default()
                );
                records.push(BatchRecord::from_context(&ctx));
            }
            Err(e) => {
                warn!("failed for {} {}: {}", row.first_name, row.last_name, e);
                records.push(BatchRecord::from_failure(row, &e.to_string()));
            }
        }
    }

    write_batch_output(&output, &factor_names, &records)?;
    info!("processing complete, results written to {:?}", output);

    Ok(())
}
