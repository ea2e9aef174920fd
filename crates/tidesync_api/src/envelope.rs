//! Parsed JSON:API response envelopes.

use crate::ERROR_STALE_STAMP_PREFIX;
use serde::{Deserialize, Deserializer, Serialize};

/// A parsed JSON:API document.
///
/// Collection endpoints return an array under `data`; single-resource
/// endpoints return one object, which deserializes here as a one-element
/// vector. Error documents carry entries under `errors` instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    /// Primary data.
    #[serde(default, deserialize_with = "one_or_many")]
    pub data: Vec<T>,
    /// Document meta, including pagination counters.
    #[serde(default)]
    pub meta: Meta,
    /// Payload-level errors.
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

impl<T> Envelope<T> {
    /// Creates an envelope holding only primary data.
    pub fn of(data: Vec<T>) -> Self {
        Self {
            data,
            meta: Meta::default(),
            errors: Vec::new(),
        }
    }

    /// Sets the total-pages pagination counter.
    pub fn with_total_pages(mut self, total_pages: u32) -> Self {
        self.meta.pagination = Some(Pagination {
            total_pages,
            ..Pagination::default()
        });
        self
    }

    /// Appends a payload error.
    pub fn with_error(mut self, error: ApiErrorDetail) -> Self {
        self.errors.push(error);
        self
    }

    /// Returns true if the payload carries error entries.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Total pages available for the query, when the server reported them.
    pub fn total_pages(&self) -> Option<u32> {
        self.meta.pagination.as_ref().map(|p| p.total_pages)
    }

    /// The first (or only) primary resource.
    pub fn single(&self) -> Option<&T> {
        self.data.first()
    }

    /// Consumes the envelope, returning its primary data.
    pub fn into_data(self) -> Vec<T> {
        self.data
    }
}

impl<T> Default for Envelope<T> {
    fn default() -> Self {
        Self::of(Vec::new())
    }
}

/// Document meta.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    /// Pagination counters, present on paged collection responses.
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Pagination counters under `meta.pagination`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    /// Current page number.
    #[serde(default)]
    pub page: u32,
    /// Items per page.
    #[serde(default)]
    pub per_page: u32,
    /// Total pages available for the query.
    #[serde(default)]
    pub total_pages: u32,
    /// Total items across all pages.
    #[serde(default)]
    pub total_count: u32,
}

/// One entry from a JSON:API `errors` array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    /// Machine-readable error code, when the server provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Human-readable detail message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ApiErrorDetail {
    /// Creates an error entry from a detail message.
    pub fn detail(detail: impl Into<String>) -> Self {
        Self {
            code: None,
            detail: Some(detail.into()),
        }
    }

    /// Returns true if this entry reports a rejected concurrency stamp.
    pub fn is_stale_stamp(&self) -> bool {
        self.detail
            .as_deref()
            .is_some_and(|d| d.starts_with(ERROR_STALE_STAMP_PREFIX))
    }
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(item)) => vec![item],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Item {
        id: String,
    }

    #[test]
    fn collection_document() {
        let envelope: Envelope<Item> = serde_json::from_str(
            r#"{
                "data": [{"id": "a"}, {"id": "b"}],
                "meta": {"pagination": {"page": 1, "per_page": 25, "total_pages": 3, "total_count": 70}}
            }"#,
        )
        .unwrap();

        assert_eq!(envelope.data.len(), 2);
        assert_eq!(envelope.total_pages(), Some(3));
        assert!(!envelope.has_errors());
    }

    #[test]
    fn single_resource_document() {
        let envelope: Envelope<Item> =
            serde_json::from_str(r#"{"data": {"id": "a"}}"#).unwrap();
        assert_eq!(envelope.single().map(|i| i.id.as_str()), Some("a"));
        assert_eq!(envelope.total_pages(), None);
    }

    #[test]
    fn null_and_missing_data() {
        let envelope: Envelope<Item> = serde_json::from_str(r#"{"data": null}"#).unwrap();
        assert!(envelope.data.is_empty());

        let envelope: Envelope<Item> =
            serde_json::from_str(r#"{"errors": [{"code": "403", "detail": "forbidden"}]}"#)
                .unwrap();
        assert!(envelope.has_errors());
        assert_eq!(envelope.errors[0].detail.as_deref(), Some("forbidden"));
    }

    #[test]
    fn stale_stamp_detection() {
        let rejected = ApiErrorDetail::detail(format!(
            "{} (2024-03-01T00:00:00Z)",
            ERROR_STALE_STAMP_PREFIX
        ));
        assert!(rejected.is_stale_stamp());

        assert!(!ApiErrorDetail::detail("Name can't be blank").is_stale_stamp());
        assert!(!ApiErrorDetail::default().is_stale_stamp());
    }
}
