use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`
use youtube_gemini::server;

mod common;
use common::{MockInference, MockRetriever, VALID_URL, create_analyzer};

fn create_test_app(retriever: MockRetriever, inference: MockInference) -> Router {
    let (analyzer, _, _) = create_analyzer(retriever, inference);
    server::router(Arc::new(analyzer))
}

fn analyze_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_analyze_endpoint_returns_answer() {
    let app = create_test_app(
        MockRetriever::new(),
        MockInference::answering("The protagonist wears a blue jacket."),
    );

    let body = json!({ "videoUrl": VALID_URL, "question": "Who is the protagonist?" });
    let response = app.oneshot(analyze_request(body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "answerText": "The protagonist wears a blue jacket." })
    );
}

#[tokio::test]
async fn test_analyze_endpoint_invalid_url() {
    let app = create_test_app(MockRetriever::new(), MockInference::answering("unused"));

    let body = json!({ "videoUrl": "https://example.com/clip", "question": "What?" });
    let response = app.oneshot(analyze_request(body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["kind"], "invalid_input");
}

#[tokio::test]
async fn test_analyze_endpoint_empty_question() {
    let app = create_test_app(MockRetriever::new(), MockInference::answering("unused"));

    let body = json!({ "videoUrl": VALID_URL, "question": "" });
    let response = app.oneshot(analyze_request(body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["kind"], "invalid_input");
    assert!(body["error"].as_str().unwrap().contains("question"));
}

#[tokio::test]
async fn test_analyze_endpoint_retrieval_failure() {
    let app = create_test_app(
        MockRetriever::new().with_error("ERROR: Private video"),
        MockInference::answering("unused"),
    );

    let body = json!({ "videoUrl": VALID_URL, "question": "What?" });
    let response = app.oneshot(analyze_request(body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["kind"], "retrieval_failure");
    assert!(body["error"].as_str().unwrap().contains("Private video"));
}

#[tokio::test]
async fn test_analyze_endpoint_inference_failure() {
    let app = create_test_app(MockRetriever::new(), MockInference::failing("deadline exceeded"));

    let body = json!({ "videoUrl": VALID_URL, "question": "What?" });
    let response = app.oneshot(analyze_request(body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["kind"], "inference_failure");
}

#[tokio::test]
async fn test_analyze_endpoint_missing_question() {
    let app = create_test_app(MockRetriever::new(), MockInference::answering("unused"));

    let body = json!({ "videoUrl": VALID_URL });
    let response = app.oneshot(analyze_request(body.to_string())).await.unwrap();

    // Should return 422 Unprocessable Entity for missing required field
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_analyze_endpoint_invalid_json() {
    let app = create_test_app(MockRetriever::new(), MockInference::answering("unused"));

    let response = app.oneshot(analyze_request("invalid json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(MockRetriever::new(), MockInference::answering("unused"));

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_analyze_requires_post() {
    let app = create_test_app(MockRetriever::new(), MockInference::answering("unused"));

    let request = Request::builder()
        .uri("/analyze")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
