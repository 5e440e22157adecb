use crate::models::{AgentIdentity, Listing, RejectReason, Rejection};
use crate::ownership::OwnershipVerifier;
use crate::page::DetailPage;
use crate::parser;
use tracing::debug;

/// Turns one fetched detail page into a complete listing or a rejection.
///
/// Checks run in a fixed order: ownership, area, title, price, beds, ref.
/// The first unresolved field rejects the page and nothing is padded.
pub struct ItemValidator {
    ownership: OwnershipVerifier,
}

impl ItemValidator {
    pub fn new(agent: &AgentIdentity) -> Self {
        Self {
            ownership: OwnershipVerifier::new(agent),
        }
    }

    pub fn validate_html(&self, url: &str, html: &str) -> Result<Listing, Rejection> {
        let page = DetailPage::parse(url, html);
        self.validate(&page)
    }

    pub fn validate(&self, page: &DetailPage) -> Result<Listing, Rejection> {
        let reject = |reason: RejectReason| {
            debug!("rejecting {}: {}", page.url, reason);
            Rejection::new(&page.url, reason)
        };

        if !self.ownership.verify(page) {
            return Err(reject(RejectReason::NotOwnedByAgent));
        }

        let area = parser::extract_area(page).ok_or_else(|| reject(RejectReason::MissingArea))?;
        let title = parser::extract_title(page).ok_or_else(|| reject(RejectReason::MissingTitle))?;
        let price = parser::extract_price(page).ok_or_else(|| reject(RejectReason::MissingPrice))?;
        let beds = parser::extract_beds(page).ok_or_else(|| {
            reject(RejectReason::MissingBedsRequiredForResidential)
                .with_property_type(page.property_type().unwrap_or("unknown"))
        })?;
        let reference = parser::extract_ref(page).ok_or_else(|| reject(RejectReason::MissingRef))?;

        Ok(Listing {
            reference,
            title,
            url: page.url.clone(),
            price,
            beds,
            area,
        })
    }
}
