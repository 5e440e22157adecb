use crate::fetch::Fetcher;
use crate::huizemark_scraper::{self, HuizemarkPortal, BASE_URL};
use crate::models::{AgentIdentity, Listing, RejectReason, Rejection};
use crate::tui::ScraperTUI;
use crate::utils::dedupe_preserving_order;
use crate::validator::ItemValidator;
use anyhow::Result;
use clap::ValueEnum;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Which index pages are used to discover detail pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DiscoveryMode {
    /// The agent's profile page only.
    Profile,
    /// The agent's paginated results listing only.
    Results,
    /// Both, profile links ordered first.
    Both,
}

impl DiscoveryMode {
    fn uses_profile(&self) -> bool {
        matches!(self, DiscoveryMode::Profile | DiscoveryMode::Both)
    }

    fn uses_results(&self) -> bool {
        matches!(self, DiscoveryMode::Results | DiscoveryMode::Both)
    }
}

#[derive(Debug, Clone)]
pub struct ScrapingOptions {
    pub agent: AgentIdentity,
    pub base_url: String,
    /// Overrides the agent's results-listing start page.
    pub results_url: Option<String>,
    pub discovery: DiscoveryMode,
    /// Cap on results-listing pages followed.
    pub max_pages: usize,
    /// Cap on detail pages fetched.
    pub max_items: Option<usize>,
    /// Pause after each index page request.
    pub list_delay: Duration,
    /// Pause after each detail page request.
    pub detail_delay: Duration,
}

impl Default for ScrapingOptions {
    fn default() -> Self {
        Self {
            agent: AgentIdentity::new("75570", "blessing-nsibande"),
            base_url: BASE_URL.to_string(),
            results_url: None,
            discovery: DiscoveryMode::Both,
            max_pages: 20,
            max_items: None,
            list_delay: Duration::from_millis(800),
            detail_delay: Duration::from_millis(500),
        }
    }
}

pub struct ScrapingResult {
    /// Merged, de-duplicated detail URLs in processing order.
    pub candidates: Vec<String>,
    /// Final catalog: unique by URL, most expensive first.
    pub listings: Vec<Listing>,
    pub rejections: Vec<Rejection>,
}

impl ScrapingResult {
    pub fn rejection_counts(&self) -> BTreeMap<RejectReason, usize> {
        let mut counts = BTreeMap::new();
        for rejection in &self.rejections {
            *counts.entry(rejection.reason).or_insert(0) += 1;
        }
        counts
    }
}

/// Console write failures are logged and otherwise ignored.
fn console(result: io::Result<()>) {
    if let Err(e) = result {
        warn!("console update failed: {}", e);
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}

/// Discovers the agent's listings, validates every detail page and returns
/// the sorted catalog together with the rejection log.
pub fn run_scraper_with_options<F: Fetcher>(
    fetcher: &F,
    options: &ScrapingOptions,
    mut tui: Option<&mut ScraperTUI>,
) -> Result<ScrapingResult> {
    let portal = HuizemarkPortal::new(&options.base_url, options.agent.clone());
    info!(
        "crawling stock of agent {} ({}) with {:?} discovery",
        portal.agent().id,
        portal.agent().name,
        options.discovery
    );

    let profile_urls = if options.discovery.uses_profile() {
        collect_from_profile(fetcher, &portal, tui.as_deref_mut())
    } else {
        Vec::new()
    };

    let results_urls = if options.discovery.uses_results() {
        let start = options
            .results_url
            .as_deref()
            .map(|url| portal.normalize_results_url(url))
            .unwrap_or_else(|| portal.results_url());
        collect_from_results(fetcher, &start, options, tui.as_deref_mut())
    } else {
        Vec::new()
    };

    let mut candidates = merge_candidates(profile_urls, results_urls);
    if let Some(max) = options.max_items {
        if candidates.len() > max {
            info!("limiting {} candidates to {}", candidates.len(), max);
            candidates.truncate(max);
        }
    }
    info!("total candidate URLs (merged): {}", candidates.len());

    if let Some(tui) = tui.as_mut() {
        console(tui.show_candidates(candidates.len()));
    }

    let validator = ItemValidator::new(portal.agent());
    let mut listings = Vec::new();
    let mut rejections = Vec::new();

    for (i, url) in candidates.iter().enumerate() {
        debug!("detail {}/{} GET {}", i + 1, candidates.len(), url);
        if let Some(tui) = tui.as_mut() {
            console(tui.start_listing(url));
        }

        let outcome = match fetcher.fetch(url) {
            Ok(html) if html.trim().is_empty() => {
                warn!("empty body -> {}", url);
                Err(Rejection::new(url, RejectReason::DetailFetchFailed))
            }
            Ok(html) => validator.validate_html(url, &html),
            Err(e) => {
                warn!("fetch failed: {:#} -> {}", e, url);
                Err(Rejection::new(url, RejectReason::DetailFetchFailed))
            }
        };

        if let Some(tui) = tui.as_mut() {
            console(tui.finish_listing(outcome.as_ref()));
        }
        match outcome {
            Ok(listing) => listings.push(listing),
            Err(rejection) => rejections.push(rejection),
        }

        pause(options.detail_delay);
    }

    let listings = finalize_listings(listings);
    info!(
        "accepted {} listings, rejected {} candidates",
        listings.len(),
        rejections.len()
    );

    Ok(ScrapingResult {
        candidates,
        listings,
        rejections,
    })
}

fn collect_from_profile<F: Fetcher>(
    fetcher: &F,
    portal: &HuizemarkPortal,
    mut tui: Option<&mut ScraperTUI>,
) -> Vec<String> {
    let url = portal.profile_url();
    info!("collecting from profile: {}", url);
    if let Some(tui) = tui.as_mut() {
        console(tui.start_gathering("profile page", 1));
    }

    let urls = match fetcher.fetch(&url) {
        Ok(html) => huizemark_scraper::parse_profile_for_detail_urls(&html, &url),
        Err(e) => {
            warn!("profile fetch failed: {:#}", e);
            Vec::new()
        }
    };
    info!("profile page: {} detail URLs", urls.len());

    if let Some(tui) = tui.as_mut() {
        console(tui.finish_gathering("profile page", urls.len()));
    }
    urls
}

fn collect_from_results<F: Fetcher>(
    fetcher: &F,
    start_url: &str,
    options: &ScrapingOptions,
    mut tui: Option<&mut ScraperTUI>,
) -> Vec<String> {
    info!("collecting from results: {}", start_url);
    if let Some(tui) = tui.as_mut() {
        console(tui.start_gathering("results pages", options.max_pages));
    }

    let mut collected: Vec<String> = Vec::new();
    let mut visited = HashSet::new();
    let mut next = Some(start_url.to_string());
    let mut pages = 0;

    while let Some(url) = next.take() {
        if pages >= options.max_pages {
            info!("page cap of {} reached, stopping pagination", options.max_pages);
            break;
        }
        if !visited.insert(url.clone()) {
            warn!("next link points back to {}, stopping pagination", url);
            break;
        }
        pages += 1;

        let html = match fetcher.fetch(&url) {
            Ok(html) => html,
            Err(e) => {
                warn!("results page {} fetch failed: {:#}", pages, e);
                break;
            }
        };

        let urls = huizemark_scraper::parse_results_for_detail_urls(&html, &url);
        info!("results page {}: {} detail URLs", pages, urls.len());
        for detail in urls {
            if !collected.contains(&detail) {
                collected.push(detail);
            }
        }

        if let Some(tui) = tui.as_mut() {
            console(tui.update_gathering_progress("results pages", pages, options.max_pages, collected.len()));
        }

        next = huizemark_scraper::find_next_link(&html, &url);
        if next.is_some() {
            pause(options.list_delay);
        }
    }

    if let Some(tui) = tui.as_mut() {
        console(tui.finish_gathering("results pages", collected.len()));
    }
    collected
}

/// Profile URLs first, then results URLs, each URL once.
pub fn merge_candidates(profile_urls: Vec<String>, results_urls: Vec<String>) -> Vec<String> {
    dedupe_preserving_order(profile_urls.into_iter().chain(results_urls))
}

/// One listing per URL (first wins), sorted by price then title, both
/// descending.
pub fn finalize_listings(listings: Vec<Listing>) -> Vec<Listing> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Listing> = listings
        .into_iter()
        .filter(|listing| seen.insert(listing.url.clone()))
        .collect();
    unique.sort_by(|a, b| b.price.cmp(&a.price).then_with(|| b.title.cmp(&a.title)));
    unique
}
