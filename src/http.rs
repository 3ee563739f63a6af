//! `PUT /events` ingress (§4.1): validate, publish, respond with the literal
//! plain-text bodies the wire contract mandates.

use crate::broker::LogProducer;
use crate::error::IngressError;
use crate::model::{Event, LogMessage};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::put;
use axum::Router;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct IngressState {
    pub producer: Arc<dyn LogProducer>,
}

pub fn router(state: IngressState) -> Router {
    Router::new()
        .route("/events", put(put_event).fallback(method_not_allowed))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
}

async fn put_event(State(state): State<IngressState>, headers: HeaderMap, body: Bytes) -> Response {
    match handle(&state, &headers, &body).await {
        Ok(()) => (StatusCode::OK, "Message received successfully").into_response(),
        Err(error) => error.into_response(),
    }
}

async fn handle(state: &IngressState, headers: &HeaderMap, body: &[u8]) -> Result<(), IngressError> {
    let content_type = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or("");
    if !content_type.starts_with("application/json") {
        return Err(IngressError::WrongContentType { actual: content_type.to_string() });
    }

    let event: Event =
        serde_json::from_slice(body).map_err(|error| IngressError::MalformedBody(error.to_string()))?;
    if !event.is_valid() {
        return Err(IngressError::MissingUserId);
    }

    let message = LogMessage::from_event(&event, now_millis());
    state.producer.send(vec![message]).await?;
    Ok(())
}

fn now_millis() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as i64
}

impl IntoResponse for IngressError {
    fn into_response(self) -> Response {
        let status = match &self {
            IngressError::WrongContentType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            IngressError::MalformedBody(_) | IngressError::MissingUserId => StatusCode::BAD_REQUEST,
            IngressError::Publish(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::InMemoryBroker;
    use crate::error::ProducerError;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    struct FailingProducer;

    #[async_trait]
    impl LogProducer for FailingProducer {
        async fn send(&self, _messages: Vec<LogMessage>) -> Result<(), ProducerError> {
            Err(ProducerError::WriteRejected("disk full".to_string()))
        }
        async fn close(&self) -> Result<(), ProducerError> {
            Ok(())
        }
    }

    fn app_with(producer: Arc<dyn LogProducer>) -> Router {
        router(IngressState { producer })
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn valid_event_is_published_and_acknowledged() {
        let broker = InMemoryBroker::new(1);
        let app = app_with(Arc::new(broker.producer()));

        let request = Request::put("/events")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"user_id":"user_test_1","payload":"hi"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Message received successfully");
    }

    #[tokio::test]
    async fn missing_content_type_is_rejected() {
        let broker = InMemoryBroker::new(1);
        let app = app_with(Arc::new(broker.producer()));

        let request = Request::put("/events")
            .header("content-type", "text/plain")
            .body(Body::from("{}"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body_text(response).await, "need content-type 'application/json', but got 'text/plain'");
    }

    #[tokio::test]
    async fn missing_user_id_is_rejected() {
        let broker = InMemoryBroker::new(1);
        let app = app_with(Arc::new(broker.producer()));

        let request = Request::put("/events")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"user_id":"","payload":"hi"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "UserID should be provided");
    }

    #[tokio::test]
    async fn malformed_json_is_rejected_with_parse_error() {
        let broker = InMemoryBroker::new(1);
        let app = app_with(Arc::new(broker.producer()));

        let request = Request::put("/events")
            .header("content-type", "application/json")
            .body(Body::from("not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn publish_failure_surfaces_as_500() {
        let app = app_with(Arc::new(FailingProducer));

        let request = Request::put("/events")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"user_id":"user_test_1","payload":"hi"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "write rejected: disk full");
    }

    #[tokio::test]
    async fn other_methods_are_not_allowed() {
        let broker = InMemoryBroker::new(1);
        let app = app_with(Arc::new(broker.producer()));

        let request = Request::get("/events").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_text(response).await, "method not allowed");
    }
}
