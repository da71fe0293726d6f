use crate::application::services::{FeedbackError, FeedbackService, HEADER_USER_ID};
use crate::domain::entities::Feedback;
use crate::interface::payloads::RetrieveQuery;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

pub(crate) async fn submit_feedback_handler(
    State(service): State<FeedbackService>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, FeedbackError> {
    let user_id = headers
        .get(HEADER_USER_ID)
        .and_then(|value| value.to_str().ok());

    service.submit_feedback(&session_id, user_id, &body).await?;

    Ok(StatusCode::OK)
}

pub(crate) async fn retrieve_feedback_handler(
    State(service): State<FeedbackService>,
    Path(session_id): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Feedback>>, FeedbackError> {
    let query = RetrieveQuery::from_pairs(pairs);
    let feedback = service
        .retrieve_feedback(&session_id, query.rating())
        .await?;

    Ok(Json(feedback))
}

#[cfg(test)]
mod tests {
    use crate::domain::entities::Feedback;
    use crate::domain::repositories::FeedbackProvider;
    use crate::interface::payloads::ErrorBody;
    use crate::interface::routers::create_feedback_router;
    use crate::test_support::{sample_feedback, StubProvider};
    use axum::body::{Body, Bytes};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use tower::ServiceExt;

    const BODY: &str = r#"{"comment":"A Test", "rating":4}"#;

    fn router(stub: &Arc<StubProvider>) -> Router {
        let provider: Arc<dyn FeedbackProvider> = stub.clone();
        create_feedback_router(provider)
    }

    fn post(path: &str, user_id: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder().method(Method::POST).uri(path);
        if let Some(user_id) = user_id {
            builder = builder.header("Ubi-UserId", user_id);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(path: &str) -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body)
    }

    async fn send_error(router: Router, request: Request<Body>) -> ErrorBody {
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let error: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.status_code, status.as_u16());
        error
    }

    #[tokio::test]
    async fn test_submit_feedback() {
        let stub = Arc::new(StubProvider::builder().build());

        let (status, body) = send(router(&stub), post("/987", Some("123"), BODY)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        assert_eq!(stub.calls.exists.load(Ordering::SeqCst), 1);
        assert_eq!(stub.calls.insert.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_submit_feedback_too_high_rating() {
        let stub = Arc::new(StubProvider::builder().build());

        let error = send_error(
            router(&stub),
            post("/987", Some("123"), r#"{"comment":"A Test", "rating":6}"#),
        )
        .await;

        assert_eq!(error.status_code, 400);
        assert_eq!(
            error.reason,
            "User 123 submitted rating 6 is not within the allowed range of 1-5 for session 987"
        );
        assert_eq!(stub.calls.insert.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_feedback_zero_rating() {
        let stub = Arc::new(StubProvider::builder().build());

        let error = send_error(
            router(&stub),
            post("/987", Some("123"), r#"{"comment":"A Test", "rating":0}"#),
        )
        .await;

        assert_eq!(error.status_code, 400);
        assert_eq!(stub.calls.insert.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_feedback_malformed_request() {
        let stub = Arc::new(StubProvider::builder().build());

        let error = send_error(
            router(&stub),
            post("/987", Some("123"), r#"{"comment":"A Test" "rating":4}"#),
        )
        .await;

        assert_eq!(
            error,
            ErrorBody {
                status_code: 400,
                reason: "Failed to decode user 123 feedback for session 987".to_string(),
            }
        );
        assert_eq!(stub.calls.insert.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_feedback_exists_error() {
        let stub = Arc::new(StubProvider::builder().exists_error(true).build());

        let error = send_error(router(&stub), post("/987", Some("123"), BODY)).await;

        assert_eq!(
            error,
            ErrorBody {
                status_code: 500,
                reason: "Failed to check if user 123 has previously submitted feedback for session 987"
                    .to_string(),
            }
        );
        assert_eq!(stub.calls.insert.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_feedback_already_exists() {
        let stub = Arc::new(StubProvider::builder().exists(true).build());

        let error = send_error(router(&stub), post("/987", Some("123"), BODY)).await;

        assert_eq!(
            error,
            ErrorBody {
                status_code: 409,
                reason: "User 123 has already submitted feedback for session 987".to_string(),
            }
        );
        assert_eq!(stub.calls.insert.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_feedback_already_exists_ignores_body() {
        let stub = Arc::new(StubProvider::builder().exists(true).build());

        let error = send_error(router(&stub), post("/987", Some("123"), "not json")).await;

        assert_eq!(error.status_code, 409);
    }

    #[tokio::test]
    async fn test_submit_feedback_missing_header() {
        let stub = Arc::new(StubProvider::builder().build());

        let error = send_error(router(&stub), post("/987", None, BODY)).await;

        assert_eq!(
            error,
            ErrorBody {
                status_code: 400,
                reason: "Missing Header 'Ubi-UserId'".to_string(),
            }
        );
        assert_eq!(stub.calls.exists.load(Ordering::SeqCst), 0);
        assert_eq!(stub.calls.insert.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_feedback_blank_header() {
        let stub = Arc::new(StubProvider::builder().build());

        let error = send_error(router(&stub), post("/987", Some("   "), BODY)).await;

        assert_eq!(error.status_code, 400);
        assert_eq!(stub.calls.exists.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_feedback_insert_failure() {
        let stub = Arc::new(StubProvider::builder().insert_error(true).build());

        let error = send_error(router(&stub), post("/987", Some("123"), BODY)).await;

        assert_eq!(
            error,
            ErrorBody {
                status_code: 500,
                reason: "Failed to insert user 123 feedback for session 987".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_retrieve_feedback() {
        let stub = Arc::new(
            StubProvider::builder()
                .feedback(vec![sample_feedback(1, 4)])
                .build(),
        );

        let (status, body) = send(router(&stub), get("/987")).await;

        assert_eq!(status, StatusCode::OK);
        let feedback: Vec<Feedback> = serde_json::from_slice(&body).unwrap();
        assert_eq!(feedback, vec![sample_feedback(1, 4)]);
        assert_eq!(stub.calls.find_recent.load(Ordering::SeqCst), 1);
        assert_eq!(stub.calls.find_recent_filtered.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_retrieve_feedback_with_filter() {
        let stub = Arc::new(
            StubProvider::builder()
                .feedback(vec![sample_feedback(1, 5)])
                .build(),
        );

        let (status, body) = send(router(&stub), get("/987?rating=5")).await;

        assert_eq!(status, StatusCode::OK);
        let feedback: Vec<Feedback> = serde_json::from_slice(&body).unwrap();
        assert_eq!(feedback.len(), 1);
        assert_eq!(stub.calls.find_recent_filtered.load(Ordering::SeqCst), 1);
        assert_eq!(stub.calls.find_recent.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_retrieve_feedback_repeated_rating_uses_first() {
        let stub = Arc::new(
            StubProvider::builder()
                .feedback(vec![sample_feedback(1, 5)])
                .build(),
        );

        let (status, body) = send(router(&stub), get("/987?rating=5&rating=3")).await;

        assert_eq!(status, StatusCode::OK);
        let feedback: Vec<Feedback> = serde_json::from_slice(&body).unwrap();
        assert_eq!(feedback.len(), 1);
        let query = stub.last_query().unwrap();
        assert_eq!(query.rating.map(|rating| rating.value()), Some(5));
        assert_eq!(stub.calls.find_recent_filtered.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retrieve_feedback_empty() {
        let stub = Arc::new(StubProvider::builder().build());

        let (status, body) = send(router(&stub), get("/987")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"[]");
    }

    #[tokio::test]
    async fn test_retrieve_feedback_find_error() {
        let stub = Arc::new(StubProvider::builder().find_error(true).build());

        let error = send_error(router(&stub), get("/987")).await;

        assert_eq!(
            error,
            ErrorBody {
                status_code: 500,
                reason: "Failed to retrieve feedback for session 987".to_string(),
            }
        );
    }
}
