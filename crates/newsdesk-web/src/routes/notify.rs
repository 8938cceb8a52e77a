//! Change notifications from the upstream channel.
//!
//! `POST /notify/{feed}` with an optional JSON body:
//!
//! ```json
//! {"event": "create" | "update" | "delete", "id": "<message id>"}
//! ```
//!
//! Any notification triggers a rebuild of the whole feed. A rebuild already
//! in progress absorbs the notification and runs once more when it is done.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use newsdesk_core::RebuildOutcome;
use serde::{Deserialize, Serialize};

use crate::error::SiteError;
use crate::state::AppState;

/// Kind of upstream change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeEvent {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Default, Deserialize)]
struct ChangeNotice {
    event: Option<ChangeEvent>,
    id: Option<String>,
}

/// Result of a notification.
#[derive(Debug, Serialize)]
pub struct NotifyResponse {
    feed: String,
    /// `rebuilt` or `queued`.
    status: &'static str,
    /// Index version now being served.
    version: u64,
}

/// `POST /notify/{feed}`
pub async fn notify_handler(
    State(state): State<AppState>,
    Path(feed_name): Path<String>,
    body: Bytes,
) -> Result<Json<NotifyResponse>, SiteError> {
    let notice: ChangeNotice = if body.iter().all(u8::is_ascii_whitespace) {
        ChangeNotice::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|err| SiteError::BadRequest(format!("invalid notification: {err}")))?
    };

    let feed = state
        .feed(&feed_name)
        .ok_or_else(|| SiteError::NotFound(format!("feed {feed_name}")))?;

    tracing::info!(
        feed = %feed.name,
        event = ?notice.event,
        id = notice.id.as_deref().unwrap_or("-"),
        "change notification received"
    );

    let status = match state.rebuild_feed(&feed).await? {
        RebuildOutcome::Rebuilt(_) => "rebuilt",
        RebuildOutcome::Queued => "queued",
    };

    Ok(Json(NotifyResponse {
        feed: feed.name.clone(),
        status,
        version: feed.slot.version(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use crate::AppState;
    use crate::export::tests::{TempDir, message_json, write_export};
    use crate::routes::router;
    use crate::routes::tests::{get, seeded_state};

    async fn post(state: &AppState, uri: &str, token: Option<&str>, body: &str) -> (StatusCode, String) {
        let mut request = Request::builder().method("POST").uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = router(state.clone())
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn requires_token() {
        let dir = TempDir::new("notify-auth");
        let state = seeded_state(&dir).await;
        let (status, _) = post(&state, "/notify/news", None, "").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = post(&state, "/notify/news", Some("wrong"), "").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn disabled_without_tokens() {
        let dir = TempDir::new("notify-disabled");
        let mut state = seeded_state(&dir).await;
        let mut config = (*state.config).clone();
        config.notify_tokens = Default::default();
        state.config = std::sync::Arc::new(config);
        let (status, _) = post(&state, "/notify/news", Some("secret"), "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rebuilds_and_serves_new_content() {
        let dir = TempDir::new("notify-rebuild");
        let state = seeded_state(&dir).await;
        let before = state.feed("news").unwrap().slot.version();

        write_export(
            &dir.0,
            "news",
            vec![
                message_json("2", "2024-01-02T10:00:00Z", "Calm seas ahead"),
                message_json("4", "2024-01-04T10:00:00Z", "Fresh headline"),
            ],
        );
        let (status, body) = post(
            &state,
            "/notify/news",
            Some("secret"),
            r#"{"event":"create","id":"4"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "rebuilt");
        assert_eq!(json["version"], before + 1);

        let (_, _, page) = get(&state, "/").await;
        assert!(page.contains("Fresh headline"));
        assert!(!page.contains("Storm warning"));
    }

    #[tokio::test]
    async fn rejects_bad_body_and_unknown_feed() {
        let dir = TempDir::new("notify-bad");
        let state = seeded_state(&dir).await;
        let (status, _) = post(&state, "/notify/news", Some("secret"), "{oops").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = post(&state, "/notify/nope", Some("secret"), "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn failed_rebuild_keeps_serving() {
        let dir = TempDir::new("notify-fail");
        let state = seeded_state(&dir).await;
        std::fs::write(dir.0.join("news.json"), "{broken").unwrap();
        let (status, _) = post(&state, "/notify/news", Some("secret"), "").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _, page) = get(&state, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(page.contains("Calm seas ahead"));
    }
}
