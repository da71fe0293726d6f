use crate::domain::entities::{Feedback, NewFeedback};
use crate::domain::repositories::{FeedbackProvider, StorageError};
use crate::domain::value_objects::{FeedbackId, Rating, SortOrder};
use chrono::{TimeZone, Utc};
use futures_util::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use typed_builder::TypedBuilder;

pub(crate) fn sample_feedback(id: u32, rating: i64) -> Feedback {
    Feedback::builder()
        .id(FeedbackId::from(id))
        .user_id("123")
        .session_id("987")
        .comment(Some("A Test".to_string()))
        .rating(Rating::try_from(rating).unwrap())
        .date(Utc.with_ymd_and_hms(2019, 11, 12, 21, 0, 0).unwrap())
        .build()
}

#[derive(Debug, Default)]
pub(crate) struct Calls {
    pub(crate) exists: AtomicUsize,
    pub(crate) insert: AtomicUsize,
    pub(crate) find_recent: AtomicUsize,
    pub(crate) find_recent_filtered: AtomicUsize,
    pub(crate) close: AtomicUsize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FindQuery {
    pub(crate) session_id: String,
    pub(crate) rating: Option<Rating>,
    pub(crate) sort: SortOrder,
    pub(crate) limit: u32,
}

/// Provider with canned answers that counts every call it receives.
#[derive(Debug, TypedBuilder)]
pub(crate) struct StubProvider {
    #[builder(default)]
    exists: bool,
    #[builder(default)]
    exists_error: bool,
    #[builder(default)]
    insert_error: bool,
    #[builder(default)]
    duplicate_on_insert: bool,
    #[builder(default)]
    find_error: bool,
    #[builder(default)]
    feedback: Vec<Feedback>,
    #[builder(default, setter(skip))]
    pub(crate) calls: Calls,
    #[builder(default, setter(skip))]
    last_query: Mutex<Option<FindQuery>>,
}

impl StubProvider {
    pub(crate) fn last_query(&self) -> Option<FindQuery> {
        self.last_query.lock().unwrap().clone()
    }

    fn find(
        &self,
        session_id: &str,
        rating: Option<Rating>,
        sort: SortOrder,
        limit: u32,
    ) -> Result<Vec<Feedback>, StorageError> {
        *self.last_query.lock().unwrap() = Some(FindQuery {
            session_id: session_id.to_string(),
            rating,
            sort,
            limit,
        });
        if self.find_error {
            return Err(StorageError::Backend("failed to find feedback".into()));
        }
        Ok(self.feedback.clone())
    }
}

impl FeedbackProvider for StubProvider {
    fn exists<'a>(
        &'a self,
        _user_id: &'a str,
        _session_id: &'a str,
    ) -> BoxFuture<'a, Result<bool, StorageError>> {
        Box::pin(async move {
            self.calls.exists.fetch_add(1, Ordering::SeqCst);
            if self.exists_error {
                return Err(StorageError::Backend("failed to check existence".into()));
            }
            Ok(self.exists)
        })
    }

    fn insert(&self, feedback: NewFeedback) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(async move {
            self.calls.insert.fetch_add(1, Ordering::SeqCst);
            if self.duplicate_on_insert {
                return Err(StorageError::Duplicate {
                    user_id: feedback.user_id().to_string(),
                    session_id: feedback.session_id().to_string(),
                });
            }
            if self.insert_error {
                return Err(StorageError::Backend("failed to insert".into()));
            }
            Ok(())
        })
    }

    fn find_recent<'a>(
        &'a self,
        session_id: &'a str,
        sort: SortOrder,
        limit: u32,
    ) -> BoxFuture<'a, Result<Vec<Feedback>, StorageError>> {
        Box::pin(async move {
            self.calls.find_recent.fetch_add(1, Ordering::SeqCst);
            self.find(session_id, None, sort, limit)
        })
    }

    fn find_recent_filtered<'a>(
        &'a self,
        session_id: &'a str,
        rating: Rating,
        sort: SortOrder,
        limit: u32,
    ) -> BoxFuture<'a, Result<Vec<Feedback>, StorageError>> {
        Box::pin(async move {
            self.calls.find_recent_filtered.fetch_add(1, Ordering::SeqCst);
            self.find(session_id, Some(rating), sort, limit)
        })
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.calls.close.fetch_add(1, Ordering::SeqCst);
        })
    }
}
