//! Webhook 服务 - 编排层
//!
//! - `POST /webhook/ghost`：Ghost 发布事件，取 `post.current.id` 后转发
//! - `GET /health`：存活检查
//!
//! 每个请求各自走一遍转发流程，失败直接映射为 500，不重试。
//! 转发在独立任务里运行，调用方断开连接也会跑完并关闭浏览器。

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value as JsonValue};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::clients::ContentSource;
use crate::error::{AppError, AppResult};
use crate::infrastructure::SessionLauncher;
use crate::orchestrator::relay::Relay;

/// 从 Ghost webhook 载荷中取文章 id
pub fn post_id_from_payload(payload: &JsonValue) -> Option<&str> {
    payload
        .pointer("/post/current/id")
        .and_then(|v| v.as_str())
        .filter(|id| !id.is_empty())
}

/// 构建路由
pub fn router<C, L>(relay: Arc<Relay<C, L>>) -> Router
where
    C: ContentSource + 'static,
    L: SessionLauncher + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/webhook/ghost", post(ghost_webhook::<C, L>))
        .with_state(relay)
}

async fn health() -> Json<JsonValue> {
    Json(json!({ "status": "ok" }))
}

async fn ghost_webhook<C, L>(
    State(relay): State<Arc<Relay<C, L>>>,
    Json(payload): Json<JsonValue>,
) -> Response
where
    C: ContentSource + 'static,
    L: SessionLauncher + 'static,
{
    info!("📨 收到 Ghost webhook");

    let Some(post_id) = post_id_from_payload(&payload) else {
        warn!("webhook 载荷中没有文章 id");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing post ID in payload" })),
        )
            .into_response();
    };

    let post_id = post_id.to_string();
    let task = tokio::spawn(async move {
        let result = relay.handle(&post_id).await;
        result.map_err(|e| (post_id, e))
    });
    let result = match task.await {
        Ok(result) => result,
        Err(e) => {
            error!("❌ 转发任务异常结束: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("转发任务异常结束: {}", e) })),
            )
                .into_response();
        }
    };

    match result {
        Ok(report) => Json(json!({
            "success": true,
            "title": report.title,
            "warnings": report.outcome.warnings,
            "screenshots": report.outcome.artifact_paths,
        }))
        .into_response(),
        Err((post_id, e)) => {
            error!("❌ 文章 {} 转发失败: {}", post_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// 监听端口直到进程退出
pub async fn serve<C, L>(relay: Arc<Relay<C, L>>, port: u16) -> AppResult<()>
where
    C: ContentSource + 'static,
    L: SessionLauncher + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Other(format!("监听 {} 失败: {}", addr, e)))?;

    info!("🌐 服务已启动: {}", addr);
    info!("   Webhook: POST http://localhost:{}/webhook/ghost", port);
    info!("   健康检查: GET  http://localhost:{}/health", port);

    axum::serve(listener, router(relay))
        .await
        .map_err(|e| AppError::Other(format!("服务异常退出: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::fake::FakePage;
    use crate::models::Post;
    use crate::orchestrator::relay::tests::{build_relay, StaticSource};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, JsonValue) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn webhook(body: JsonValue) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhook/ghost")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_post_id_extraction() {
        let payload = json!({"post": {"current": {"id": "abc"}, "previous": {}}});
        assert_eq!(post_id_from_payload(&payload), Some("abc"));
        assert_eq!(post_id_from_payload(&json!({"post": {}})), None);
        assert_eq!(
            post_id_from_payload(&json!({"post": {"current": {"id": ""}}})),
            None
        );
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let (relay, _) = build_relay(StaticSource::default(), &FakePage::publish_form(), dir.path());

        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = call(router(Arc::new(relay)), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_missing_post_id_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let (relay, launcher) =
            build_relay(StaticSource::default(), &FakePage::publish_form(), dir.path());

        let (status, body) = call(router(Arc::new(relay)), webhook(json!({"post": {}}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("post ID"));
        assert_eq!(launcher.open_count(), 0);
    }

    #[tokio::test]
    async fn test_webhook_relays_post() {
        let dir = tempfile::tempdir().unwrap();
        let page = FakePage::publish_form();
        let source = StaticSource::default().with_post("p1", Post::new("Hello", "<p>x</p>"));
        let (relay, _) = build_relay(source, &page, dir.path());

        let (status, body) = call(
            router(Arc::new(relay)),
            webhook(json!({"post": {"current": {"id": "p1"}}})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["title"], json!("Hello"));
        assert_eq!(body["warnings"], json!([]));
        assert_eq!(body["screenshots"].as_array().unwrap().len(), 1);
        assert_eq!(page.close_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_post_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let (relay, launcher) =
            build_relay(StaticSource::default(), &FakePage::publish_form(), dir.path());

        let (status, body) = call(
            router(Arc::new(relay)),
            webhook(json!({"post": {"current": {"id": "nope"}}})),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("nope"));
        assert_eq!(launcher.open_count(), 0);
    }

    #[tokio::test]
    async fn test_client_disconnect_does_not_abandon_submission() {
        let dir = tempfile::tempdir().unwrap();
        let page = FakePage::publish_form();
        page.state().navigate_delay = Some(std::time::Duration::from_millis(300));
        let source = StaticSource::default().with_post("p1", Post::new("Hello", "<p>x</p>"));
        let (relay, launcher) = build_relay(source, &page, dir.path());

        // Ghost 投递超时后断开：请求 future 在处理中途被丢弃
        let request = router(Arc::new(relay)).oneshot(webhook(json!({"post": {"current": {"id": "p1"}}})));
        let abandoned = tokio::time::timeout(std::time::Duration::from_millis(100), request).await;
        assert!(abandoned.is_err());
        assert_eq!(launcher.open_count(), 1);

        for _ in 0..100 {
            if page.close_count() > 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }

        assert_eq!(page.close_count(), 1);
        assert!(page.called("click:#publish"));
        assert_eq!(page.value_of("#title").unwrap(), "Hello");
    }
}
