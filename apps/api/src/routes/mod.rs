pub mod health;
pub mod processor;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::config::BackendKind;
use crate::screening::handlers;
use crate::state::AppState;

/// Ten PDFs at a few MB each, base64-inflated for the JSON route.
const UPLOAD_BODY_LIMIT: usize = 64 * 1024 * 1024;

/// The processor endpoints are mounted only when this instance does the
/// screening itself; a `remote` instance serving them would forward each
/// request to its processor, and to itself if pointed at its own address.
pub fn build_router(state: AppState) -> Router {
    let processor = match state.config.backend {
        BackendKind::Llm | BackendKind::Mock => Some(processor::processor_router(
            state.screener.backend().clone(),
        )),
        BackendKind::Remote => None,
    };

    let router = Router::new()
        .route("/health", get(health::health_handler))
        // Screening API
        .route("/api/v1/screenings", post(handlers::handle_screen))
        .route(
            "/api/v1/screenings/upload",
            post(handlers::handle_screen_upload),
        )
        .route(
            "/api/v1/screenings/current",
            get(handlers::handle_current),
        )
        .route(
            "/api/v1/screenings/current/stages/:index",
            get(handlers::handle_stage_output),
        )
        .route(
            "/api/v1/screenings/current/cancel",
            post(handlers::handle_cancel),
        )
        .route("/api/v1/emails", post(handlers::handle_email))
        .route("/api/v1/emails/batch", post(handlers::handle_batch_email))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .with_state(state);

    match processor {
        Some(processor) => router.merge(processor),
        None => router,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::screening::backend::MockBackend;
    use crate::screening::ingest::encode_resume_bytes;
    use crate::screening::pipeline::Screener;

    fn test_state() -> AppState {
        state_with(BackendKind::Mock)
    }

    fn state_with(backend: BackendKind) -> AppState {
        AppState {
            screener: Arc::new(Screener::new(Arc::new(MockBackend::new(0)))),
            config: Config {
                backend,
                anthropic_api_key: None,
                processor_base_url: None,
                item_concurrency: 2,
                max_resume_files: 3,
                http_timeout_secs: 5,
                mock_delay_ms: 0,
                port: 0,
                rust_log: "info".to_string(),
            },
        }
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn screening_body(files: &[&str]) -> Value {
        json!({
            "job_description": "Looking for a backend engineer, 3+ years Go experience",
            "resume_files": files
                .iter()
                .map(|f| json!({"filename": f, "content": encode_resume_bytes(f.as_bytes())}))
                .collect::<Vec<_>>()
        })
    }

    #[tokio::test]
    async fn test_health_reports_backend() {
        let (status, body) = send(build_router(test_state()), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["backend"], "mock");
    }

    #[tokio::test]
    async fn test_screening_then_inspect_outputs() {
        let state = test_state();
        let app = build_router(state.clone());

        let (status, body) = send(
            app.clone(),
            post_json("/api/v1/screenings", screening_body(&["alice.pdf", "bob.pdf"])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        let first = results[0]["avg_score"].as_f64().unwrap();
        let second = results[1]["avg_score"].as_f64().unwrap();
        assert!(first >= second);

        let (status, run) = send(app.clone(), get("/api/v1/screenings/current")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(run["status"], "complete");
        assert_eq!(run["current_stage"], 5);
        assert_eq!(run["outputs"].as_object().unwrap().len(), 5);

        let (status, stage) = send(app.clone(), get("/api/v1/screenings/current/stages/1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stage["stage"], "parse_job_description");

        let (status, _) = send(app, get("/api/v1/screenings/current/stages/9")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stage_output_absent_before_any_run() {
        let (status, body) = send(
            build_router(test_state()),
            get("/api/v1/screenings/current/stages/0"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_validation_errors_are_bad_request() {
        let app = build_router(test_state());

        let mut blank = screening_body(&["alice.pdf"]);
        blank["job_description"] = json!("   ");
        let (status, body) = send(app.clone(), post_json("/api/v1/screenings", blank)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, _) = send(
            app.clone(),
            post_json("/api/v1/screenings", screening_body(&[])),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            app,
            post_json(
                "/api/v1/screenings",
                screening_body(&["a.pdf", "b.pdf", "c.pdf", "d.pdf"]),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_email_requires_parsed_job_description() {
        let candidate = json!({
            "name": "Bob",
            "relevance": 30, "experience": 40, "skills": 20, "overall": 30,
            "comment": "Weak match",
            "avg_score": 30.0
        });
        let app = build_router(test_state());

        let (status, _) = send(
            app.clone(),
            post_json(
                "/api/v1/emails",
                json!({"candidate": candidate, "email_type": "reject"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, draft) = send(
            app,
            post_json(
                "/api/v1/emails",
                json!({
                    "candidate": candidate,
                    "email_type": "reject",
                    "job_description": {"title": "Backend Engineer"}
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(draft["candidate_name"], "Bob");
        assert!(draft["body"].as_str().unwrap().contains("Backend Engineer"));
    }

    #[tokio::test]
    async fn test_email_uses_cached_job_description_after_run() {
        let app = build_router(test_state());
        send(
            app.clone(),
            post_json("/api/v1/screenings", screening_body(&["alice.pdf"])),
        )
        .await;

        let (status, draft) = send(
            app,
            post_json(
                "/api/v1/emails",
                json!({
                    "candidate": {
                        "name": "alice",
                        "relevance": 90, "experience": 90, "skills": 90, "overall": 90,
                        "comment": "Strong", "avg_score": 90.0
                    },
                    "email_type": "accept"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(draft["generated"], true);
        assert!(draft["body"].as_str().unwrap().contains("quick call"));
    }

    #[tokio::test]
    async fn test_multipart_upload_rejects_non_pdf() {
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"job_description\"\r\n\r\n\
             Backend engineer\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"resumes\"; filename=\"alice.docx\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             hello\r\n\
             --{boundary}--\r\n"
        );
        let request = Request::post("/api/v1/screenings/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let (status, body) = send(build_router(test_state()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"].as_str().unwrap().contains("alice.docx"));
    }

    #[tokio::test]
    async fn test_multipart_upload_runs_pipeline() {
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"job_url\"\r\n\r\n\
             \r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"job_description\"\r\n\r\n\
             Backend engineer\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"resumes\"; filename=\"alice.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n\
             %PDF-1.4 fake\r\n\
             --{boundary}--\r\n"
        );
        let request = Request::post("/api/v1/screenings/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let (status, body) = send(build_router(test_state()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"][0]["name"], "alice");
    }

    #[tokio::test]
    async fn test_cancel_without_run_reports_false() {
        let (status, body) = send(
            build_router(test_state()),
            Request::post("/api/v1/screenings/current/cancel")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cancelled"], false);
    }

    #[tokio::test]
    async fn test_processor_routes_are_mounted() {
        let (status, body) = send(
            build_router(test_state()),
            post_json(
                "/rank_candidates",
                json!({"candidate_scores": [
                    {"name": "a", "relevance": 10, "experience": 10, "skills": 10, "overall": 10, "comment": ""},
                    {"name": "b", "relevance": 90, "experience": 70, "skills": 80, "overall": 60, "comment": ""}
                ]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "b");
        assert_eq!(body[0]["avg_score"], 75.0);
    }

    #[tokio::test]
    async fn test_remote_instance_does_not_serve_processor_routes() {
        let (status, _) = send(
            build_router(state_with(BackendKind::Remote)),
            post_json("/rank_candidates", json!({"candidate_scores": []})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_batch_emails_use_current_run() {
        let app = build_router(test_state());

        let (status, _) = send(app.clone(), post_json("/api/v1/emails/batch", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        send(
            app.clone(),
            post_json(
                "/api/v1/screenings",
                screening_body(&["alice.pdf", "bob.pdf", "carol.pdf"]),
            ),
        )
        .await;

        let (status, batch) = send(
            app,
            post_json("/api/v1/emails/batch", json!({"top_x": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(batch["invitations"].as_array().unwrap().len(), 1);
        assert_eq!(batch["rejections"].as_array().unwrap().len(), 2);
        assert!(batch["invitations"][0]["body"]
            .as_str()
            .unwrap()
            .contains("quick call"));
    }
}
