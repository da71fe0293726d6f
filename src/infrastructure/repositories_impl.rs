use crate::config::DatabaseOptions;
use crate::domain::entities::{Feedback, NewFeedback};
use crate::domain::repositories::{FeedbackProvider, StorageError};
use crate::domain::value_objects::{FeedbackId, Rating, SortOrder};
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::{Connection, FromRow};
use std::time::Duration;
use typed_builder::TypedBuilder;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS `feedback`(\
    `id` INT UNSIGNED NOT NULL AUTO_INCREMENT, \
    `userID` VARCHAR(255) NOT NULL, \
    `sessionID` VARCHAR(255) NOT NULL, \
    `comment` VARCHAR(255), \
    `rating` TINYINT NOT NULL, \
    `date` TIMESTAMP NOT NULL, \
    PRIMARY KEY (`id`), \
    UNIQUE KEY `user_session` (`userID`, `sessionID`), \
    INDEX `session_date` (`sessionID`, `date` DESC))";

const EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM `feedback` WHERE `userID` = ? AND `sessionID` = ?)";

const INSERT: &str = "INSERT INTO `feedback`(`userID`, `sessionID`, `comment`, `rating`, `date`) \
    VALUES (?, ?, ?, ?, ?)";

/// Feedback provider backed by a MySQL `feedback` table.
#[derive(Clone, TypedBuilder)]
pub struct MySqlFeedbackProvider {
    pool: MySqlPool,
}

impl MySqlFeedbackProvider {
    /// Opens a connection pool and pings the database once.
    pub async fn connect(options: &DatabaseOptions) -> Result<Self, StorageError> {
        let connect_options = MySqlConnectOptions::new()
            .host(options.host())
            .port(options.port())
            .username(options.username())
            .password(options.password())
            .database(options.database());

        let pool = MySqlPoolOptions::new()
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(connect_options)
            .await?;

        pool.acquire().await?.ping().await?;
        tracing::info!(database = options.database(), "Successfully connected to database");

        Ok(Self::builder().pool(pool).build())
    }

    pub async fn create_table_if_not_exists(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    async fn find_rows(
        &self,
        session_id: &str,
        rating: Option<Rating>,
        sort: SortOrder,
        limit: u32,
    ) -> Result<Vec<Feedback>, StorageError> {
        let query = find_query(rating.is_some(), sort);
        let mut statement = sqlx::query_as::<_, FeedbackRow>(&query).bind(session_id);
        if let Some(rating) = rating {
            statement = statement.bind(rating.value());
        }

        statement
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Feedback::try_from)
            .collect()
    }
}

fn find_query(filter_rating: bool, sort: SortOrder) -> String {
    let rating_clause = if filter_rating { " AND `rating` = ?" } else { "" };
    format!(
        "SELECT `id`, `userID`, `sessionID`, `comment`, `rating`, `date` FROM `feedback` \
         WHERE `sessionID` = ?{rating_clause} ORDER BY `date` {sort}, `id` {sort} LIMIT ?"
    )
}

#[derive(Debug, FromRow)]
struct FeedbackRow {
    id: u32,
    #[sqlx(rename = "userID")]
    user_id: String,
    #[sqlx(rename = "sessionID")]
    session_id: String,
    comment: Option<String>,
    rating: i8,
    date: DateTime<Utc>,
}

impl TryFrom<FeedbackRow> for Feedback {
    type Error = StorageError;

    fn try_from(row: FeedbackRow) -> Result<Self, Self::Error> {
        let rating =
            Rating::try_from(i64::from(row.rating)).map_err(|e| StorageError::Decode(Box::new(e)))?;

        Ok(Feedback::builder()
            .id(FeedbackId::from(row.id))
            .user_id(row.user_id)
            .session_id(row.session_id)
            .comment(row.comment)
            .rating(rating)
            .date(row.date)
            .build())
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::TypeNotFound { .. } => StorageError::Decode(Box::new(e)),
            e => StorageError::Backend(Box::new(e)),
        }
    }
}

impl FeedbackProvider for MySqlFeedbackProvider {
    fn exists<'a>(
        &'a self,
        user_id: &'a str,
        session_id: &'a str,
    ) -> BoxFuture<'a, Result<bool, StorageError>> {
        Box::pin(async move {
            let exists: Option<i64> = sqlx::query_scalar(EXISTS)
                .bind(user_id)
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?;

            Ok(exists.is_some_and(|exists| exists != 0))
        })
    }

    fn insert(&self, feedback: NewFeedback) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(async move {
            let result = sqlx::query(INSERT)
                .bind(feedback.user_id())
                .bind(feedback.session_id())
                .bind(feedback.comment())
                .bind(feedback.rating().value())
                .bind(*feedback.date())
                .execute(&self.pool)
                .await;

            match result {
                Ok(_) => Ok(()),
                Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                    Err(StorageError::Duplicate {
                        user_id: feedback.user_id().to_string(),
                        session_id: feedback.session_id().to_string(),
                    })
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    fn find_recent<'a>(
        &'a self,
        session_id: &'a str,
        sort: SortOrder,
        limit: u32,
    ) -> BoxFuture<'a, Result<Vec<Feedback>, StorageError>> {
        Box::pin(self.find_rows(session_id, None, sort, limit))
    }

    fn find_recent_filtered<'a>(
        &'a self,
        session_id: &'a str,
        rating: Rating,
        sort: SortOrder,
        limit: u32,
    ) -> BoxFuture<'a, Result<Vec<Feedback>, StorageError>> {
        Box::pin(self.find_rows(session_id, Some(rating), sort, limit))
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.pool.close().await;
            tracing::info!("Closed database connection pool");
        })
    }
}
