// ABOUTME: Normalizer/Validator: maps raw extraction payloads into the canonical ScrapedRecord shape.
// ABOUTME: Enforces the null-vs-empty-sequence invariants and the PDF field mapping.

use crate::error::PipelineError;
use crate::extract::Extraction;
use crate::record::{Image, Link, MetaFields, ScrapedRecord, SourceKind};

/// Map an extraction payload into the canonical record.
///
/// Pure over well-formed input. The only failure mode is a structurally
/// absent required field (a link with no href, an image with no src), which
/// signals a validation failure naming the offending field and index; that
/// indicates an extractor contract bug, not caller input.
pub fn normalize(
    extraction: Extraction,
    owner_id: &str,
) -> Result<ScrapedRecord, PipelineError> {
    match extraction {
        Extraction::Page(raw) => {
            let mut links = Vec::with_capacity(raw.links.len());
            for (i, link) in raw.links.into_iter().enumerate() {
                let href = link.href.ok_or_else(|| {
                    PipelineError::validation(
                        "Normalize",
                        Some(anyhow::anyhow!("links[{}].href is missing", i)),
                    )
                })?;
                links.push(Link {
                    href,
                    text: link.text,
                });
            }

            let mut images = Vec::with_capacity(raw.images.len());
            for (i, image) in raw.images.into_iter().enumerate() {
                let src = image.src.ok_or_else(|| {
                    PipelineError::validation(
                        "Normalize",
                        Some(anyhow::anyhow!("images[{}].src is missing", i)),
                    )
                })?;
                images.push(Image {
                    src,
                    alt: image.alt,
                });
            }

            Ok(ScrapedRecord {
                title: raw.title,
                meta: raw.meta,
                headings: raw.headings,
                paragraphs: raw.paragraphs,
                links,
                images,
                owner_id: owner_id.to_string(),
                source_kind: SourceKind::Website,
            })
        }
        Extraction::PdfText { filename, text } => Ok(ScrapedRecord {
            title: filename,
            meta: MetaFields::default(),
            headings: Vec::new(),
            paragraphs: vec![text],
            links: Vec::new(),
            images: Vec::new(),
            owner_id: owner_id.to_string(),
            source_kind: SourceKind::Pdf,
        }),
    }
}
