use crate::domain::entities::{Feedback, NewFeedback};
use crate::domain::repositories::{FeedbackProvider, StorageError};
use crate::domain::value_objects::{Rating, SortOrder};
use crate::interface::payloads::FeedbackPayload;
use crate::util::now;
use axum::http::StatusCode;
use std::sync::Arc;
use thiserror::Error;
use typed_builder::TypedBuilder;

pub const RECENT_FEEDBACK_LIMIT: u32 = 15;
pub const MAX_COMMENT_LENGTH: usize = 255;
pub const HEADER_USER_ID: &str = "Ubi-UserId";

/// Failures of the feedback operations. `Display` is the reason sent to
/// the caller; storage and decoding details stay in `source`.
#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("Missing Header '{}'", HEADER_USER_ID)]
    MissingUserId,

    #[error("User {user_id} has already submitted feedback for session {session_id}")]
    AlreadySubmitted { user_id: String, session_id: String },

    #[error("Failed to decode user {user_id} feedback for session {session_id}")]
    MalformedBody {
        user_id: String,
        session_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("User {user_id} submitted rating {rating} is not within the allowed range of 1-5 for session {session_id}")]
    RatingOutOfRange {
        user_id: String,
        session_id: String,
        rating: i64,
    },

    #[error("User {user_id} submitted a comment longer than 255 characters for session {session_id}")]
    CommentTooLong { user_id: String, session_id: String },

    #[error("Failed to check if user {user_id} has previously submitted feedback for session {session_id}")]
    ExistenceCheck {
        user_id: String,
        session_id: String,
        #[source]
        source: StorageError,
    },

    #[error("Failed to insert user {user_id} feedback for session {session_id}")]
    Insert {
        user_id: String,
        session_id: String,
        #[source]
        source: StorageError,
    },

    #[error("Failed to retrieve feedback for session {session_id}")]
    Retrieve {
        session_id: String,
        #[source]
        source: StorageError,
    },
}

impl FeedbackError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FeedbackError::MissingUserId
            | FeedbackError::MalformedBody { .. }
            | FeedbackError::RatingOutOfRange { .. }
            | FeedbackError::CommentTooLong { .. } => StatusCode::BAD_REQUEST,
            FeedbackError::AlreadySubmitted { .. } => StatusCode::CONFLICT,
            FeedbackError::ExistenceCheck { .. }
            | FeedbackError::Insert { .. }
            | FeedbackError::Retrieve { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Clone, TypedBuilder)]
pub struct FeedbackService {
    provider: Arc<dyn FeedbackProvider>,
}

impl FeedbackService {
    /// Stores the first feedback a user gives for a session.
    ///
    /// The body is only decoded once the user is known not to have submitted
    /// yet, so a repeated submission is reported as a conflict whatever its
    /// body holds.
    pub async fn submit_feedback(
        &self,
        session_id: &str,
        user_id: Option<&str>,
        body: &[u8],
    ) -> Result<(), FeedbackError> {
        let user_id = user_id
            .map(str::trim)
            .filter(|user_id| !user_id.is_empty())
            .ok_or(FeedbackError::MissingUserId)?;

        let exists = self
            .provider
            .exists(user_id, session_id)
            .await
            .map_err(|source| FeedbackError::ExistenceCheck {
                user_id: user_id.to_string(),
                session_id: session_id.to_string(),
                source,
            })?;
        if exists {
            return Err(already_submitted(user_id, session_id));
        }

        let payload: FeedbackPayload =
            serde_json::from_slice(body).map_err(|source| FeedbackError::MalformedBody {
                user_id: user_id.to_string(),
                session_id: session_id.to_string(),
                source,
            })?;

        let rating =
            Rating::try_from(payload.rating()).map_err(|e| FeedbackError::RatingOutOfRange {
                user_id: user_id.to_string(),
                session_id: session_id.to_string(),
                rating: e.0,
            })?;

        let comment = payload.into_comment();
        if comment
            .as_deref()
            .is_some_and(|comment| comment.chars().count() > MAX_COMMENT_LENGTH)
        {
            return Err(FeedbackError::CommentTooLong {
                user_id: user_id.to_string(),
                session_id: session_id.to_string(),
            });
        }

        let feedback = NewFeedback::builder()
            .user_id(user_id)
            .session_id(session_id)
            .comment(comment)
            .rating(rating)
            .date(now())
            .build();

        match self.provider.insert(feedback).await {
            Ok(()) => {
                tracing::info!(user_id, session_id, %rating, "Stored feedback");
                Ok(())
            }
            Err(StorageError::Duplicate { .. }) => Err(already_submitted(user_id, session_id)),
            Err(source) => Err(FeedbackError::Insert {
                user_id: user_id.to_string(),
                session_id: session_id.to_string(),
                source,
            }),
        }
    }

    /// Returns the most recent feedback of a session, newest first.
    ///
    /// A non-empty `rating` restricts the result to that rating; a value that
    /// no stored rating can equal yields an empty list.
    pub async fn retrieve_feedback(
        &self,
        session_id: &str,
        rating: Option<&str>,
    ) -> Result<Vec<Feedback>, FeedbackError> {
        let result = match rating.filter(|rating| !rating.is_empty()) {
            Some(raw) => {
                let Some(rating) = Rating::parse_filter(raw) else {
                    tracing::debug!(session_id, rating = raw, "Rating filter cannot match");
                    return Ok(Vec::new());
                };
                self.provider
                    .find_recent_filtered(
                        session_id,
                        rating,
                        SortOrder::Descending,
                        RECENT_FEEDBACK_LIMIT,
                    )
                    .await
            }
            None => {
                self.provider
                    .find_recent(session_id, SortOrder::Descending, RECENT_FEEDBACK_LIMIT)
                    .await
            }
        };

        result.map_err(|source| FeedbackError::Retrieve {
            session_id: session_id.to_string(),
            source,
        })
    }
}

fn already_submitted(user_id: &str, session_id: &str) -> FeedbackError {
    FeedbackError::AlreadySubmitted {
        user_id: user_id.to_string(),
        session_id: session_id.to_string(),
    }
}
