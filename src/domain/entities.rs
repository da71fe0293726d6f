use crate::domain::value_objects::{FeedbackId, Rating};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// A stored feedback entry. Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    id: FeedbackId,
    #[builder(setter(into))]
    user_id: String,
    #[builder(setter(into))]
    session_id: String,
    #[builder(default)]
    comment: Option<String>,
    rating: Rating,
    date: DateTime<Utc>,
}

impl Feedback {
    pub fn id(&self) -> FeedbackId {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn rating(&self) -> Rating {
        self.rating
    }

    pub fn date(&self) -> &DateTime<Utc> {
        &self.date
    }
}

/// A feedback that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, TypedBuilder)]
pub struct NewFeedback {
    #[builder(setter(into))]
    user_id: String,
    #[builder(setter(into))]
    session_id: String,
    #[builder(default)]
    comment: Option<String>,
    rating: Rating,
    date: DateTime<Utc>,
}

impl NewFeedback {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn rating(&self) -> Rating {
        self.rating
    }

    pub fn date(&self) -> &DateTime<Utc> {
        &self.date
    }

    pub fn into_feedback(self, id: FeedbackId) -> Feedback {
        Feedback {
            id,
            user_id: self.user_id,
            session_id: self.session_id,
            comment: self.comment,
            rating: self.rating,
            date: self.date,
        }
    }
}
