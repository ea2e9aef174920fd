//! Page-level response handling and aggregation.

use crate::envelope::{ApiErrorDetail, Envelope};
use serde::Deserialize;
use std::fmt::Display;

/// The outcome of one HTTP exchange against the remote API.
///
/// Transport failures are carried as a response variant rather than an
/// error, so a multi-page fetch can report every page, success or failure,
/// without one bad page failing the whole operation.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    status: Option<u16>,
    body: Option<Envelope<T>>,
    error_body: Option<String>,
}

impl<T> ApiResponse<T> {
    /// A completed exchange with a parsed body.
    pub fn success(status: u16, body: Envelope<T>) -> Self {
        Self {
            status: Some(status),
            body: Some(body),
            error_body: None,
        }
    }

    /// A completed 2xx exchange without a usable body.
    pub fn empty(status: u16) -> Self {
        Self {
            status: Some(status),
            body: None,
            error_body: None,
        }
    }

    /// A completed non-2xx exchange carrying the raw error body.
    pub fn error(status: u16, error_body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: None,
            error_body: Some(error_body.into()),
        }
    }

    /// An exchange that never completed.
    pub fn transport(error: impl Display) -> Self {
        Self {
            status: None,
            body: None,
            error_body: Some(error.to_string()),
        }
    }

    /// HTTP status code, if the exchange completed.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// The parsed body, if any.
    pub fn body(&self) -> Option<&Envelope<T>> {
        self.body.as_ref()
    }

    /// Raw error body, or the transport error text.
    pub fn error_body(&self) -> Option<&str> {
        self.error_body.as_deref()
    }

    /// True for a completed 2xx exchange.
    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(s) if (200..300).contains(&s))
    }

    /// True for transport failures, non-2xx statuses, and payload errors.
    pub fn has_errors(&self) -> bool {
        !self.is_success() || self.body.as_ref().is_some_and(Envelope::has_errors)
    }

    /// Payload errors, read from the body or parsed out of the raw error
    /// body. An unparseable error body yields no entries.
    pub fn api_errors(&self) -> Vec<ApiErrorDetail> {
        if let Some(body) = &self.body {
            if body.has_errors() {
                return body.errors.clone();
            }
        }

        #[derive(Deserialize)]
        struct ErrorDocument {
            #[serde(default)]
            errors: Vec<ApiErrorDetail>,
        }

        self.error_body
            .as_deref()
            .and_then(|raw| serde_json::from_str::<ErrorDocument>(raw).ok())
            .map(|doc| doc.errors)
            .unwrap_or_default()
    }

    /// Runs `block` with the parsed body only on a plain success with no
    /// payload errors, consuming the response. A successful response without
    /// a body is left unhandled and passes through, as does any error, for
    /// [`ResponseChain::on_error`].
    pub fn on_success<F: FnOnce(&Envelope<T>)>(self, block: F) -> Option<Self> {
        if self.is_success() && !self.body.as_ref().is_some_and(Envelope::has_errors) {
            if let Some(body) = &self.body {
                block(body);
                return None;
            }
        }
        Some(self)
    }

    /// Like [`ApiResponse::on_success`] but also consumes a successful
    /// response without a body.
    pub fn on_success_allow_empty<F: FnOnce(Option<&Envelope<T>>)>(self, block: F) -> Option<Self> {
        if self.is_success() && !self.body.as_ref().is_some_and(Envelope::has_errors) {
            block(self.body.as_ref());
            return None;
        }
        Some(self)
    }
}

/// Continuation of an [`ApiResponse`] chain after
/// [`ApiResponse::on_success`].
pub trait ResponseChain<T> {
    /// Invokes `block` for anything that was not consumed as a plain
    /// success. `block` returns whether it handled the error; an unhandled
    /// error is escalated as a fatal observability event carrying the status
    /// code and raw error body, never silently dropped.
    fn on_error<F: FnOnce(&ApiResponse<T>) -> bool>(self, block: F) -> Option<ApiResponse<T>>;
}

impl<T> ResponseChain<T> for Option<ApiResponse<T>> {
    fn on_error<F: FnOnce(&ApiResponse<T>) -> bool>(self, block: F) -> Option<ApiResponse<T>> {
        let response = self?;
        if response.has_errors() || response.body.is_none() {
            let handled = block(&response);
            if !handled {
                tracing::error!(
                    status = response.status,
                    body = response.error_body.as_deref(),
                    "unhandled API error response"
                );
            }
            return None;
        }
        Some(response)
    }
}

/// Returns true if any page response in the set has errors.
pub fn has_page_errors<T>(responses: &[ApiResponse<T>]) -> bool {
    responses.iter().any(ApiResponse::has_errors)
}

/// Concatenates the item lists of the successful responses. Failed pages
/// contribute nothing; the page set is treated as order-independent.
pub fn aggregate_pages<T>(responses: Vec<ApiResponse<T>>) -> Vec<T> {
    responses
        .into_iter()
        .filter(ApiResponse::is_success)
        .filter_map(|response| response.body.map(Envelope::into_data))
        .flatten()
        .collect()
}
