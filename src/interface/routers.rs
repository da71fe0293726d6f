use crate::application::services::FeedbackService;
use crate::domain::repositories::FeedbackProvider;
use crate::interface::handlers::{retrieve_feedback_handler, submit_feedback_handler};
use axum::routing::post;
use axum::Router;
use std::sync::Arc;

pub fn create_feedback_router(provider: Arc<dyn FeedbackProvider>) -> Router {
    let state = FeedbackService::builder().provider(provider).build();

    Router::new()
        .route(
            "/{session_id}",
            post(submit_feedback_handler).get(retrieve_feedback_handler),
        )
        .with_state(state)
}
