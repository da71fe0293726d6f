use crate::domain::entities::{Feedback, NewFeedback};
use crate::domain::repositories::{FeedbackProvider, StorageError};
use crate::domain::value_objects::{FeedbackId, Rating, SortOrder};
use futures_util::future::BoxFuture;
use std::sync::{Mutex, MutexGuard};

/// Process-local feedback store.
///
/// Uniqueness of (user, session) is checked under the same lock as the
/// insert, so concurrent submissions cannot both be stored.
#[derive(Debug, Default)]
pub struct InMemoryFeedbackProvider {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    last_id: u32,
    records: Vec<Feedback>,
    closed: bool,
}

impl InMemoryFeedbackProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().map(|state| state.closed).unwrap_or(true)
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.records.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn open_state(&self) -> Result<MutexGuard<'_, State>, StorageError> {
        let state = self
            .state
            .lock()
            .map_err(|_| StorageError::Backend("in-memory store lock poisoned".into()))?;
        if state.closed {
            return Err(StorageError::Backend("in-memory store is closed".into()));
        }
        Ok(state)
    }

    fn find(
        &self,
        session_id: &str,
        rating: Option<Rating>,
        sort: SortOrder,
        limit: u32,
    ) -> Result<Vec<Feedback>, StorageError> {
        let state = self.open_state()?;
        let mut found: Vec<Feedback> = state
            .records
            .iter()
            .filter(|feedback| feedback.session_id() == session_id)
            .filter(|feedback| rating.is_none_or(|rating| feedback.rating() == rating))
            .cloned()
            .collect();

        found.sort_by(|a, b| a.date().cmp(b.date()).then(a.id().cmp(&b.id())));
        if sort == SortOrder::Descending {
            found.reverse();
        }
        found.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

        Ok(found)
    }
}

impl FeedbackProvider for InMemoryFeedbackProvider {
    fn exists<'a>(
        &'a self,
        user_id: &'a str,
        session_id: &'a str,
    ) -> BoxFuture<'a, Result<bool, StorageError>> {
        Box::pin(async move {
            let state = self.open_state()?;
            Ok(state.records.iter().any(|feedback| {
                feedback.user_id() == user_id && feedback.session_id() == session_id
            }))
        })
    }

    fn insert(&self, feedback: NewFeedback) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(async move {
            let mut state = self.open_state()?;

            let duplicate = state.records.iter().any(|stored| {
                stored.user_id() == feedback.user_id()
                    && stored.session_id() == feedback.session_id()
            });
            if duplicate {
                return Err(StorageError::Duplicate {
                    user_id: feedback.user_id().to_string(),
                    session_id: feedback.session_id().to_string(),
                });
            }

            let id = state
                .last_id
                .checked_add(1)
                .ok_or_else(|| StorageError::Backend("feedback id space exhausted".into()))?;
            state.last_id = id;
            state.records.push(feedback.into_feedback(FeedbackId::from(id)));

            Ok(())
        })
    }

    fn find_recent<'a>(
        &'a self,
        session_id: &'a str,
        sort: SortOrder,
        limit: u32,
    ) -> BoxFuture<'a, Result<Vec<Feedback>, StorageError>> {
        Box::pin(async move { self.find(session_id, None, sort, limit) })
    }

    fn find_recent_filtered<'a>(
        &'a self,
        session_id: &'a str,
        rating: Rating,
        sort: SortOrder,
        limit: u32,
    ) -> BoxFuture<'a, Result<Vec<Feedback>, StorageError>> {
        Box::pin(async move { self.find(session_id, Some(rating), sort, limit) })
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            match self.state.lock() {
                Ok(mut state) => state.closed = true,
                Err(_) => tracing::warn!("In-memory store lock poisoned while closing"),
            }
        })
    }
}
