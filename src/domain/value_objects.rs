use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Formatter;
use thiserror::Error;

/// Server-assigned sequence number of a stored feedback.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct FeedbackId(u32);

impl fmt::Display for FeedbackId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for FeedbackId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl FeedbackId {
    pub fn value(self) -> u32 {
        self.0
    }
}

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("rating {0} is not within the allowed range of 1-5")]
pub struct RatingOutOfRange(pub i64);

/// A rating between [`MIN_RATING`] and [`MAX_RATING`], inclusive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl TryFrom<i64> for Rating {
    type Error = RatingOutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(rating) if (MIN_RATING..=MAX_RATING).contains(&rating) => Ok(Self(rating)),
            _ => Err(RatingOutOfRange(value)),
        }
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Rating {
    pub fn value(self) -> u8 {
        self.0
    }

    /// Interprets a `rating` query value as a filter.
    ///
    /// Returns `None` when the value can never match a stored rating, either
    /// because it is not an integer or because it lies outside the valid range.
    pub fn parse_filter(raw: &str) -> Option<Self> {
        raw.trim()
            .parse::<i64>()
            .ok()
            .and_then(|value| Self::try_from(value).ok())
    }
}

/// Ordering of feedback by submission date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}
