use crate::domain::entities::{Feedback, NewFeedback};
use crate::domain::value_objects::{Rating, SortOrder};
use futures_util::future::BoxFuture;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("user {user_id} already stored feedback for session {session_id}")]
    Duplicate { user_id: String, session_id: String },

    #[error("failed to decode feedback row: {0}")]
    Decode(#[source] BoxError),

    #[error("storage backend failure: {0}")]
    Backend(#[source] BoxError),
}

/// Persistence capability for feedback records.
///
/// A missing record is never an error: `exists` answers `false` and the
/// `find_*` operations answer an empty list.
pub trait FeedbackProvider: Send + Sync {
    fn exists<'a>(
        &'a self,
        user_id: &'a str,
        session_id: &'a str,
    ) -> BoxFuture<'a, Result<bool, StorageError>>;

    /// Fails with [`StorageError::Duplicate`] when the store already holds a
    /// feedback for the same user and session.
    fn insert(&self, feedback: NewFeedback) -> BoxFuture<'_, Result<(), StorageError>>;

    fn find_recent<'a>(
        &'a self,
        session_id: &'a str,
        sort: SortOrder,
        limit: u32,
    ) -> BoxFuture<'a, Result<Vec<Feedback>, StorageError>>;

    fn find_recent_filtered<'a>(
        &'a self,
        session_id: &'a str,
        rating: Rating,
        sort: SortOrder,
        limit: u32,
    ) -> BoxFuture<'a, Result<Vec<Feedback>, StorageError>>;

    /// Releases connections held by the provider.
    fn close(&self) -> BoxFuture<'_, ()>;
}
