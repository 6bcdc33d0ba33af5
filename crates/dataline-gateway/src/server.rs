// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway router and server lifecycle.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use dataline_config::model::ServerConfig;
use dataline_core::DatalineError;
use dataline_pipeline::QueryService;

use crate::handlers;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub service: QueryService,
}

/// Build the gateway router.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/v1/queries", post(handlers::post_query))
        .route("/v1/history/{user_id}", get(handlers::get_history))
        .route(
            "/v1/results/{user_id}/{conversation_id}",
            get(handlers::get_result),
        )
        .route("/v1/health", get(handlers::get_health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve the gateway until the process exits.
pub async fn serve(config: &ServerConfig, state: GatewayState) -> Result<(), DatalineError> {
    let address = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| DatalineError::Internal(format!("failed to bind {address}: {e}")))?;
    info!(address, "gateway listening");
    axum::serve(listener, build_router(state))
        .await
        .map_err(|e| DatalineError::Internal(format!("gateway server error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataline_core::ResultCache;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    use dataline_core::types::{ConversationRecord, FormattedResult, RawResult};
    use dataline_core::ResultStatus;
    use dataline_pipeline::{
        ConversationStore, HistoryAssembler, QueryService, TranslationRequester,
    };
    use dataline_test_utils::{
        MemoryBlobStore, MemoryQueue, MemoryRecordStore, MemoryResultCache, MockTranslator,
    };

    struct Fixture {
        router: Router,
        store: ConversationStore,
        cache: Arc<MemoryResultCache>,
        queue: Arc<MemoryQueue>,
    }

    fn fixture() -> Fixture {
        let records = Arc::new(MemoryRecordStore::new());
        let store = ConversationStore::new(records, 5);
        let cache = Arc::new(MemoryResultCache::new());
        let blob = Arc::new(MemoryBlobStore::new());
        let queue = Arc::new(MemoryQueue::new());
        let requester = TranslationRequester::new(
            Arc::new(MockTranslator::new()),
            queue.clone(),
            store.clone(),
            HistoryAssembler::new(store.clone(), 30),
            90,
        );
        let service = QueryService::new(requester, store.clone(), cache.clone(), blob);
        let router = build_router(GatewayState { service });
        Fixture {
            router,
            store,
            cache,
            queue,
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn submit_returns_accepted_with_conversation_id() {
        let f = fixture();
        let response = f
            .router
            .oneshot(post_json(
                "/v1/queries",
                serde_json::json!({"user_id": "U1", "query": "show usage last week"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        assert!(body["conversation_id"].is_string());
        assert_eq!(f.queue.pending_count().await, 1);
    }

    #[tokio::test]
    async fn empty_query_is_a_structured_bad_request() {
        let f = fixture();
        let response = f
            .router
            .oneshot(post_json(
                "/v1/queries",
                serde_json::json!({"user_id": "U1", "query": "  "}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "translation");
        assert!(body["error"].as_str().unwrap().contains("empty"));
    }

    #[tokio::test]
    async fn history_returns_conversations_and_count() {
        let f = fixture();
        for query in ["first", "second"] {
            f.router
                .clone()
                .oneshot(post_json(
                    "/v1/queries",
                    serde_json::json!({"user_id": "U1", "query": query}),
                ))
                .await
                .unwrap();
        }

        let response = f
            .router
            .oneshot(get_request("/v1/history/U1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["count"], 2);
        assert_eq!(body["conversations"][0]["query"], "second");
    }

    #[tokio::test]
    async fn unknown_result_is_404() {
        let f = fixture();
        let response = f
            .router
            .oneshot(get_request("/v1/results/U1/ghost"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "not_found");
    }

    #[tokio::test]
    async fn completed_result_includes_rows_from_cache() {
        let f = fixture();
        let record = ConversationRecord::provisional(
            "U1",
            "c1",
            "top apps",
            "SELECT 1",
            chrono::Utc::now(),
            chrono::Duration::days(90),
        );
        f.store.put(&record).await.unwrap();
        f.store
            .complete("U1", "c1", 1, chrono::Utc::now())
            .await
            .unwrap();

        let mut row = std::collections::BTreeMap::new();
        row.insert("app_name".to_string(), "maps".to_string());
        let raw = RawResult {
            user_id: "U1".into(),
            conversation_id: "c1".into(),
            execution_id: "exec-1".into(),
            columns: vec!["app_name".into()],
            rows: vec![row],
            result_count: 1,
            execution_time: chrono::Utc::now(),
        };
        let formatted = FormattedResult::from_raw(raw, chrono::Utc::now());
        f.cache
            .set(
                "result:U1:c1",
                &serde_json::to_string(&formatted).unwrap(),
                std::time::Duration::from_secs(3600),
            )
            .await
            .unwrap();

        let response = f
            .router
            .oneshot(get_request("/v1/results/U1/c1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "COMPLETED");
        assert_eq!(body["result_count"], 1);
        assert_eq!(body["rows"][0]["app_name"], "maps");
    }

    #[tokio::test]
    async fn failed_result_carries_error_reason() {
        let f = fixture();
        let record = ConversationRecord::provisional(
            "U1",
            "c1",
            "top apps",
            "SELECT 1",
            chrono::Utc::now(),
            chrono::Duration::days(90),
        );
        f.store.put(&record).await.unwrap();
        f.store
            .fail("U1", "c1", "execution cancelled: cancelled by operator")
            .await
            .unwrap();

        let response = f
            .router
            .oneshot(get_request("/v1/results/U1/c1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "FAILED");
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("cancelled by operator"));
        assert!(body.get("rows").is_none());

        // Terminal states still list in history.
        let record = f.store.get_one("U1", "c1").await.unwrap().unwrap();
        assert_eq!(record.result_status, Some(ResultStatus::Failed));
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let f = fixture();
        let response = f.router.oneshot(get_request("/v1/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
    }
}
