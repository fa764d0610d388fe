//! Vaccination Data Collector CLI
//!
//! Produces observations from sample data or the OWID dump and feeds them to
//! the GraphQL API, a CSV file, or nowhere (dry run).

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, ValueEnum};
use reqwest::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vax_collector::sample::DEFAULT_DAYS;
use vax_collector::sink::DEFAULT_BATCH_SIZE;
use vax_collector::{write_csv, GraphQlSink, OwidDataset, SampleGenerator, OWID_URL};
use vax_domain::Observation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Source {
    /// Generated series for the four default countries
    Sample,
    /// Our World in Data dump, falling back to sample data
    Owid,
}

#[derive(Parser, Debug)]
#[command(name = "vax-collector")]
#[command(about = "Collect vaccination observations and load them into the comparison API")]
struct Args {
    /// Data source
    #[arg(short, long, value_enum, default_value = "owid")]
    source: Source,

    /// GraphQL endpoint
    #[arg(long, default_value = "http://localhost:8080/graphql")]
    api_url: String,

    /// OWID dump location
    #[arg(long, default_value = OWID_URL)]
    owid_url: String,

    /// Observations per GraphQL request
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Days of sample data
    #[arg(long, default_value_t = DEFAULT_DAYS)]
    days: u32,

    /// Gaussian noise on sample counts, in percent
    #[arg(long, default_value_t = 0.0)]
    jitter_pct: f64,

    /// Seed for the sample noise
    #[arg(long)]
    seed: Option<u64>,

    /// Write a CSV file instead of posting to the API
    #[arg(long)]
    csv_out: Option<PathBuf>,

    /// Dry run (don't write anywhere)
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("vax_collector=info".parse()?))
        .init();

    let args = Args::parse();
    let client = Client::new();

    info!(source = ?args.source, "Starting collection");

    let observations = match args.source {
        Source::Sample => sample(&args)?,
        Source::Owid => match owid(&client, &args.owid_url).await {
            Ok(rows) if !rows.is_empty() => rows,
            Ok(_) => {
                warn!("OWID dataset produced no observations, using sample data");
                sample(&args)?
            }
            Err(err) => {
                warn!(error = %err, "OWID collection failed, using sample data");
                sample(&args)?
            }
        },
    };

    info!(rows = observations.len(), "Collected observations");

    if args.dry_run {
        info!("Dry run, nothing written");
        return Ok(());
    }

    if let Some(path) = args.csv_out.as_deref() {
        write_csv(path, &observations)?;
        return Ok(());
    }

    let sink = GraphQlSink::new(client, &args.api_url, args.batch_size);
    let written = sink.send(&observations).await?;
    info!(written, api = %args.api_url, "Collection complete");

    Ok(())
}

fn sample(args: &Args) -> vax_collector::Result<Vec<Observation>> {
    let mut generator = SampleGenerator::new(args.days).with_jitter(args.jitter_pct)?;
    if let Some(seed) = args.seed {
        generator = generator.with_seed(seed);
    }
    generator.generate(Utc::now().date_naive())
}

async fn owid(client: &Client, url: &str) -> vax_collector::Result<Vec<Observation>> {
    OwidDataset::fetch(client, url).await?.observations()
}
