// ABOUTME: Router/intent classifier: picks the persistence behavior for a normalized record.
// ABOUTME: A non-empty partner key selects the upsert-keyed PartnerProfile; otherwise the append-only ScrapedRecord.

use crate::pipeline::ScrapeRequest;
use crate::record::{PartnerProfile, ScrapedRecord};

/// The persisted payload a request resolved to, exactly one per request.
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    /// Append-only scrape record tagged with the requesting owner.
    Scrape(ScrapedRecord),
    /// Partner profile upserted on its external key.
    Partner(PartnerProfile),
}

/// Classify the request intent and shape the persisted payload.
///
/// Evaluated once per request, after normalization, side-effect free. The
/// partner path joins paragraphs with a newline into `scraped_text` and
/// copies the optional chatbot fields through, defaulting to null.
pub fn route(record: ScrapedRecord, req: &ScrapeRequest) -> Routed {
    let partner_key = req
        .partner_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty());

    match partner_key {
        Some(key) => Routed::Partner(PartnerProfile {
            external_key: key.to_string(),
            display_name: req.display_name.clone(),
            logo_url: req.logo_url.clone(),
            scraped_text: record.paragraphs.join("\n"),
            owner_id: record.owner_id,
        }),
        None => Routed::Scrape(record),
    }
}
