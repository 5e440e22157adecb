use agentstock::common_scraper::{run_scraper_with_options, DiscoveryMode, ScrapingOptions};
use agentstock::fetch::HttpFetcher;
use agentstock::huizemark_scraper::BASE_URL;
use agentstock::models::AgentIdentity;
use agentstock::output;
use agentstock::tui::ScraperTUI;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Agentstock - Huizemark agent listing catalog builder")]
struct Args {
    /// Portal identifier of the agent
    #[clap(long, env = "HUIZEMARK_AGENT_ID", default_value = "75570")]
    agent_id: String,

    /// URL slug of the agent's profile page
    #[clap(long, env = "HUIZEMARK_AGENT_SLUG", default_value = "blessing-nsibande")]
    agent_slug: String,

    /// Display name used for ownership matching (defaults to the slug words)
    #[clap(long)]
    agent_name: Option<String>,

    #[clap(long, default_value = BASE_URL)]
    base_url: String,

    /// Start page of the results listing (defaults to the agent's results page)
    #[clap(long)]
    results_url: Option<String>,

    /// Path to the JSON catalog
    #[clap(short, long, default_value = "data/listings.json")]
    output: PathBuf,

    /// Path to the JSON rejection log
    #[clap(long, default_value = "data/debug_skipped.json")]
    debug_output: PathBuf,

    /// Also export the catalog as CSV
    #[clap(long)]
    csv: Option<PathBuf>,

    /// Maximum number of results pages to follow
    #[clap(short, long, default_value = "20")]
    max_pages: usize,

    /// Maximum number of detail pages to fetch (if not set, fetch all candidates)
    #[clap(short = 'i', long)]
    max_items: Option<usize>,

    /// Which index pages to discover listings from
    #[clap(long, value_enum, default_value = "both")]
    discovery: DiscoveryMode,

    /// Pause between index page requests, in milliseconds
    #[clap(long, default_value = "800")]
    list_delay_ms: u64,

    /// Pause between detail page requests, in milliseconds
    #[clap(long, default_value = "500")]
    detail_delay_ms: u64,

    /// Per-request timeout, in seconds
    #[clap(long, default_value = "30")]
    timeout_secs: u64,

    /// Keep a timestamped copy of an existing catalog before overwriting it
    #[clap(long)]
    backup: bool,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,

    /// Disable the live console view
    #[clap(long)]
    no_tui: bool,
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    println!("Agentstock - Huizemark Agent Listing Catalog");
    println!("============================================");

    // Unwritable output locations abort before any request is made.
    output::ensure_parent_dir(&args.output)?;
    output::ensure_parent_dir(&args.debug_output)?;

    let mut agent = AgentIdentity::new(&args.agent_id, &args.agent_slug);
    if let Some(name) = &args.agent_name {
        agent = agent.with_name(name);
    }

    let options = ScrapingOptions {
        agent,
        base_url: args.base_url.clone(),
        results_url: args.results_url.clone(),
        discovery: args.discovery,
        max_pages: args.max_pages,
        max_items: args.max_items,
        list_delay: Duration::from_millis(args.list_delay_ms),
        detail_delay: Duration::from_millis(args.detail_delay_ms),
    };

    let fetcher = HttpFetcher::new(Duration::from_secs(args.timeout_secs))?;
    let mut tui = if args.no_tui { None } else { Some(ScraperTUI::new()) };

    let result = run_scraper_with_options(&fetcher, &options, tui.as_mut())?;

    if let Some(tui) = tui.as_mut() {
        tui.show_final_summary(result.listings.len())?;
    }

    if args.backup {
        output::backup_existing(&args.output)?;
    }
    output::save_listings_to_json(&result.listings, &args.output)?;
    output::save_rejections_to_json(&result.rejections, &args.debug_output)?;
    if let Some(csv_path) = &args.csv {
        output::save_listings_to_csv(&result.listings, csv_path)?;
    }

    let counts = result.rejection_counts();
    info!("rejections by reason: {:?}", counts);

    println!("\n=== Summary ===");
    println!("Candidate URLs: {}", result.candidates.len());
    println!("Listings saved: {}", result.listings.len());
    println!("Rejected: {}", result.rejections.len());
    for (reason, count) in &counts {
        println!("  {}: {}", reason, count);
    }
    println!("Saved to: {}", args.output.display());
    println!("Rejection log: {}", args.debug_output.display());

    Ok(())
}
