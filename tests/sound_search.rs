use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;

use timer_bell::services::{SearchError, SoundSearch};

#[derive(Deserialize)]
struct Params {
    query: String,
    fields: String,
}

async fn fake_freesound(headers: HeaderMap, Query(params): Query<Params>) -> impl IntoResponse {
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Token good") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Invalid token."})));
    }
    if params.query == "broken" {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})));
    }
    assert_eq!(params.fields, "id,name,previews");
    (
        StatusCode::OK,
        Json(json!({
            "count": 2,
            "results": [
                {"id": 1, "name": format!("{} one", params.query), "previews": {
                    "preview-hq-mp3": "https://cdn.test/1-hq.mp3"
                }},
                {"id": 2, "name": "quiet", "previews": {}}
            ]
        })),
    )
}

async fn serve() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/apiv2/search/", get(fake_freesound));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/apiv2/search/", addr)
}

#[tokio::test]
async fn search_returns_named_previews() {
    let endpoint = serve().await;
    let search = SoundSearch::with_endpoint(Some("good".into()), endpoint);

    let hits = search.search("alarm").await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].name, "alarm one");
    assert_eq!(hits[0].preview_url.as_deref(), Some("https://cdn.test/1-hq.mp3"));
    assert_eq!(hits[1].preview_url, None);
}

#[tokio::test]
async fn bad_token_is_unauthorized() {
    let endpoint = serve().await;
    let search = SoundSearch::with_endpoint(Some("bad".into()), endpoint);
    assert!(matches!(search.search("alarm").await, Err(SearchError::Unauthorized)));
}

#[tokio::test]
async fn server_errors_carry_status() {
    let endpoint = serve().await;
    let search = SoundSearch::with_endpoint(Some("good".into()), endpoint);
    assert!(matches!(search.search("broken").await, Err(SearchError::HttpStatus(500))));
}

#[tokio::test]
async fn unreachable_host_is_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let search =
        SoundSearch::with_endpoint(Some("good".into()), format!("http://{}/apiv2/search/", addr));
    assert!(matches!(
        search.search("alarm").await,
        Err(SearchError::NetworkFailure(_))
    ));
}
