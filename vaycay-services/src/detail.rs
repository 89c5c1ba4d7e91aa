//! On-demand place details.
//!
//! Details are always fetched fresh. A failed fetch never hides what the
//! summary already knows: [`EnrichedPlace`] falls back field by field.

use std::sync::Arc;

use vaycay_core::{DetailError, DetailField, PlaceDetail, PlaceSummary, PlacesProvider, Review};

/// A summary paired with whatever the detail fetch produced.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedPlace {
    /// The summary the user selected.
    pub summary: PlaceSummary,
    /// Fetched detail, absent when the fetch failed.
    pub detail: Option<PlaceDetail>,
    /// Why the fetch failed, if it did.
    pub failure: Option<DetailError>,
}

impl EnrichedPlace {
    /// Detail name, else the summary name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.detail
            .as_ref()
            .and_then(|d| d.name.as_deref())
            .unwrap_or(&self.summary.name)
    }

    /// Detail rating, else the summary rating.
    #[must_use]
    pub fn rating(&self) -> Option<f64> {
        self.detail
            .as_ref()
            .and_then(|d| d.rating)
            .or(self.summary.rating)
    }

    /// Detail rating count, else the summary rating count.
    #[must_use]
    pub fn rating_count(&self) -> Option<u32> {
        self.detail
            .as_ref()
            .and_then(|d| d.rating_count)
            .or(self.summary.rating_count)
    }

    /// Detail vicinity, else the summary vicinity.
    #[must_use]
    pub fn vicinity(&self) -> Option<&str> {
        self.detail
            .as_ref()
            .and_then(|d| d.vicinity.as_deref())
            .or(self.summary.vicinity.as_deref())
    }

    /// Photo references from the detail, else the summary's primary photo.
    #[must_use]
    pub fn photo_refs(&self) -> Vec<&str> {
        match &self.detail {
            Some(detail) if !detail.photo_refs.is_empty() => {
                detail.photo_refs.iter().map(String::as_str).collect()
            }
            _ => self.summary.primary_photo_ref.iter().map(String::as_str).collect(),
        }
    }

    /// Reviews, empty when the fetch failed.
    #[must_use]
    pub fn reviews(&self) -> &[Review] {
        self.detail
            .as_ref()
            .map(|d| d.reviews.as_slice())
            .unwrap_or_default()
    }
}

/// Fetches consolidated details for one place at a time.
#[derive(Clone)]
pub struct DetailEnricher {
    places: Arc<dyn PlacesProvider>,
}

impl std::fmt::Debug for DetailEnricher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailEnricher").finish_non_exhaustive()
    }
}

impl DetailEnricher {
    /// Create an enricher over `places`.
    pub fn new(places: Arc<dyn PlacesProvider>) -> Self {
        Self { places }
    }

    /// Fetch every detail field for `place_id` in one request.
    ///
    /// # Errors
    ///
    /// Returns [`DetailError::EmptyPlaceId`] for a blank id and
    /// [`DetailError::Upstream`] when the provider fails.
    pub async fn fetch_detail(&self, place_id: &str) -> Result<PlaceDetail, DetailError> {
        let place_id = place_id.trim();
        if place_id.is_empty() {
            return Err(DetailError::EmptyPlaceId);
        }
        let detail = self
            .places
            .place_details(place_id, &DetailField::ALL)
            .await?;
        log::debug!(
            "fetched details for {place_id}: {} photos, {} reviews",
            detail.photo_refs.len(),
            detail.reviews.len()
        );
        Ok(detail)
    }

    /// Fetch details for `summary` without ever failing.
    pub async fn enrich(&self, summary: &PlaceSummary) -> EnrichedPlace {
        match self.fetch_detail(&summary.id).await {
            Ok(detail) => EnrichedPlace {
                summary: summary.clone(),
                detail: Some(detail),
                failure: None,
            },
            Err(err) => {
                log::warn!("showing summary only for {}: {err}", summary.id);
                EnrichedPlace {
                    summary: summary.clone(),
                    detail: None,
                    failure: Some(err),
                }
            }
        }
    }
}
