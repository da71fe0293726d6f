use crate::application::services::FeedbackError;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::error::Error;

/// Body of a feedback submission. Anything else the client sends is ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct FeedbackPayload {
    #[serde(default)]
    comment: Option<String>,
    rating: i64,
}

impl FeedbackPayload {
    pub(crate) fn rating(&self) -> i64 {
        self.rating
    }

    pub(crate) fn into_comment(self) -> Option<String> {
        self.comment
    }
}

#[derive(Debug)]
pub(crate) struct RetrieveQuery {
    rating: Option<String>,
}

impl RetrieveQuery {
    /// Keeps the first value of each recognised key; repeats are ignored.
    pub(crate) fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let rating = pairs
            .into_iter()
            .find(|(key, _)| key == "rating")
            .map(|(_, value)| value);

        Self { rating }
    }

    pub(crate) fn rating(&self) -> Option<&str> {
        self.rating.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub reason: String,
}

impl IntoResponse for FeedbackError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let reason = self.to_string();

        if status.is_server_error() {
            match self.source() {
                Some(source) => {
                    tracing::error!(%status, %reason, error = %source, "Request failed")
                }
                None => tracing::error!(%status, %reason, "Request failed"),
            }
        } else {
            tracing::warn!(%status, %reason, "Request rejected");
        }

        let body = ErrorBody {
            status_code: status.as_u16(),
            reason,
        };
        (status, Json(body)).into_response()
    }
}
