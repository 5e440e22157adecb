// tests/crawl_e2e.rs
use std::io::{self, Write};
use std::time::Duration;

use agentstock::common_scraper::{run_scraper_with_options, DiscoveryMode, ScrapingOptions};
use agentstock::fetch::StaticFetcher;
use agentstock::models::{AgentIdentity, RejectReason};
use agentstock::tui::ScraperTUI;

const BASE: &str = "https://www.huizemark.com";
const PROFILE: &str = "https://www.huizemark.com/agents/blessing-nsibande/75570/";
const RESULTS: &str = "https://www.huizemark.com/results/agent/75570/";
const RESULTS_PAGE_2: &str = "https://www.huizemark.com/results/agent/75570/?page=2";

const HOUSE: &str =
    "https://www.huizemark.com/results/residential/for-sale/johannesburg/sandton-central/house/12345678/";
const FLAT: &str = "https://www.huizemark.com/results/residential/to-let/durban/berea/flat/22334455/";
const LAND: &str =
    "https://www.huizemark.com/results/residential/for-sale/pretoria/hazeldean/vacant-land/33445566/";
const FOREIGN: &str =
    "https://www.huizemark.com/results/residential/for-sale/cape-town/sea-point/apartment/44556677/";

fn options(discovery: DiscoveryMode) -> ScrapingOptions {
    ScrapingOptions {
        agent: AgentIdentity::new("75570", "blessing-nsibande"),
        base_url: BASE.to_string(),
        results_url: None,
        discovery,
        max_pages: 20,
        max_items: None,
        list_delay: Duration::ZERO,
        detail_delay: Duration::ZERO,
    }
}

fn index_page(links: &[&str], next: Option<&str>) -> String {
    let anchors: String = links
        .iter()
        .map(|url| format!(r#"<div class="card"><a href="{}">View</a></div>"#, url))
        .collect();
    let pager = next
        .map(|href| format!(r#"<a rel="next" href="{}">Next</a>"#, href))
        .unwrap_or_default();
    format!("<html><body>{}{}</body></html>", anchors, pager)
}

fn detail_page(agent_href: &str, title: &str, price: &str, facts: &str, reference: &str) -> String {
    format!(
        r#"<html><head><title>{title} | Huizemark</title></head><body>
            <h1>{title}</h1>
            <div class="price">{price}</div>
            <ul class="features">{facts}</ul>
            <p>Web Ref: {reference}</p>
            <div class="agent"><a href="{agent_href}">Contact agent</a></div>
        </body></html>"#
    )
}

const OWN_AGENT: &str = "/agents/blessing-nsibande/75570/";
const OTHER_AGENT: &str = "/agents/someone-else/11111/";

fn portal_fixture() -> StaticFetcher {
    StaticFetcher::new()
        .with_page(RESULTS, &index_page(&[HOUSE, FLAT], Some("?page=2")))
        .with_page(RESULTS_PAGE_2, &index_page(&[LAND, FOREIGN], None))
        .with_page(
            HOUSE,
            &detail_page(OWN_AGENT, "3 Bedroom House in Sandton Central", "R 2 450 000", "<li>Bedrooms: 3</li>", "RL10001"),
        )
        .with_page(
            FLAT,
            &detail_page(OWN_AGENT, "2 Bedroom Flat to Rent in Berea", "R 7 500", "<li>Bedrooms: 2</li>", "RL10002"),
        )
        .with_page(
            LAND,
            &detail_page(OWN_AGENT, "Vacant Land in Hazeldean", "R 850 000", "<li>Erf size: 1200 m²</li>", "RL10003"),
        )
        .with_page(
            FOREIGN,
            &detail_page(OTHER_AGENT, "1 Bedroom Apartment in Sea Point", "R 3 100 000", "<li>Bedrooms: 1</li>", "RL10004"),
        )
}

#[test]
fn two_index_pages_four_details_three_accepted() {
    let fetcher = portal_fixture();
    let result = run_scraper_with_options(&fetcher, &options(DiscoveryMode::Results), None).unwrap();

    assert_eq!(result.candidates, vec![HOUSE, FLAT, LAND, FOREIGN]);
    assert_eq!(result.listings.len(), 3);
    assert_eq!(result.rejections.len(), 1);
    assert_eq!(result.rejections[0].url, FOREIGN);
    assert_eq!(result.rejections[0].reason, RejectReason::NotOwnedByAgent);

    let urls: Vec<_> = result.listings.iter().map(|l| l.url.as_str()).collect();
    assert_eq!(urls, vec![HOUSE, LAND, FLAT]);

    let house = &result.listings[0];
    assert_eq!(house.reference, "RL10001");
    assert_eq!(house.price, 2_450_000);
    assert_eq!(house.beds, 3);
    assert_eq!(house.area, "Sandton Central");
    assert_eq!(house.title, "3 Bedroom House in Sandton Central");

    let land = &result.listings[1];
    assert_eq!(land.beds, 0);
    assert_eq!(land.area, "Hazeldean");
}

#[test]
fn unreachable_detail_page_is_recorded_not_fatal() {
    let fetcher = StaticFetcher::new()
        .with_page(RESULTS, &index_page(&[HOUSE, FLAT], None))
        .with_page(
            HOUSE,
            &detail_page(OWN_AGENT, "3 Bedroom House", "R 2 450 000", "<li>Bedrooms: 3</li>", "RL10001"),
        );
    let result = run_scraper_with_options(&fetcher, &options(DiscoveryMode::Results), None).unwrap();

    assert_eq!(result.listings.len(), 1);
    assert_eq!(result.rejections.len(), 1);
    assert_eq!(result.rejections[0].url, FLAT);
    assert_eq!(result.rejections[0].reason, RejectReason::DetailFetchFailed);
    assert_eq!(result.rejection_counts().get(&RejectReason::DetailFetchFailed), Some(&1));
}

#[test]
fn page_cap_limits_pagination() {
    let mut opts = options(DiscoveryMode::Results);
    opts.max_pages = 1;
    let result = run_scraper_with_options(&portal_fixture(), &opts, None).unwrap();
    assert_eq!(result.candidates, vec![HOUSE, FLAT]);
}

#[test]
fn next_link_back_to_visited_page_ends_pagination() {
    let fetcher = StaticFetcher::new()
        .with_page(RESULTS, &index_page(&[HOUSE], Some("?page=2")))
        .with_page(RESULTS_PAGE_2, &index_page(&[FLAT], Some(RESULTS)));
    let result = run_scraper_with_options(&fetcher, &options(DiscoveryMode::Results), None).unwrap();

    assert_eq!(result.candidates, vec![HOUSE, FLAT]);
    assert!(result.listings.is_empty());
    assert!(result
        .rejections
        .iter()
        .all(|r| r.reason == RejectReason::DetailFetchFailed));
}

#[test]
fn profile_links_come_first_and_duplicates_merge() {
    let fetcher = portal_fixture().with_page(PROFILE, &index_page(&[LAND, HOUSE], None));
    let result = run_scraper_with_options(&fetcher, &options(DiscoveryMode::Both), None).unwrap();

    assert_eq!(result.candidates, vec![LAND, HOUSE, FLAT, FOREIGN]);
    assert_eq!(result.listings.len(), 3);
    assert_eq!(result.rejections.len(), 1);
}

#[test]
fn missing_profile_page_still_crawls_results() {
    let result = run_scraper_with_options(&portal_fixture(), &options(DiscoveryMode::Both), None).unwrap();
    assert_eq!(result.candidates.len(), 4);
    assert_eq!(result.listings.len(), 3);
}

#[test]
fn max_items_caps_detail_fetches() {
    let mut opts = options(DiscoveryMode::Results);
    opts.max_items = Some(2);
    let result = run_scraper_with_options(&portal_fixture(), &opts, None).unwrap();

    assert_eq!(result.candidates, vec![HOUSE, FLAT]);
    assert_eq!(result.listings.len(), 2);
    assert!(result.rejections.is_empty());
}

#[test]
fn profile_url_given_as_results_start_is_normalized() {
    let mut opts = options(DiscoveryMode::Results);
    opts.results_url = Some(PROFILE.to_string());
    let result = run_scraper_with_options(&portal_fixture(), &opts, None).unwrap();
    assert_eq!(result.candidates.len(), 4);
}

#[test]
fn empty_detail_body_counts_as_fetch_failure() {
    let fetcher = StaticFetcher::new()
        .with_page(RESULTS, &index_page(&[HOUSE], None))
        .with_page(HOUSE, "  \n ");
    let result = run_scraper_with_options(&fetcher, &options(DiscoveryMode::Results), None).unwrap();

    assert!(result.listings.is_empty());
    assert_eq!(result.rejections.len(), 1);
    assert_eq!(result.rejections[0].reason, RejectReason::DetailFetchFailed);
}

/// A console whose every write fails, like a closed pipe.
struct ClosedPipe;

impl Write for ClosedPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }
}

#[test]
fn console_failures_do_not_stop_the_crawl() {
    let mut tui = ScraperTUI::with_writer(ClosedPipe);
    let result =
        run_scraper_with_options(&portal_fixture(), &options(DiscoveryMode::Both), Some(&mut tui)).unwrap();

    assert_eq!(result.listings.len(), 3);
    assert_eq!(result.rejections.len(), 1);
}
