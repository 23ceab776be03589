use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use bookfinder_core::Document;
use bookfinder_server::{build_app, cors_layer, router, AppConfig, AppState, SearchResponse, SimilarResponse, StatsResponse};
use http_body_util::BodyExt;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;
use tower::ServiceExt;

fn book(id: &str, title: &str, author: &str, category: &str, year: i32, rating: f32) -> Document {
    let mut d = Document::new(id, title, author, category, "...");
    d.year = Some(year);
    d.rating = Some(rating);
    d
}

fn corpus() -> Vec<Document> {
    vec![
        book("b1", "Python Programming Guide", "A", "Tech", 2018, 4.2),
        book("b2", "Guide to JavaScript", "B", "Tech", 2020, 4.9),
        book("b3", "Python for Data Science", "C", "Science", 2022, 3.8),
    ]
}

fn app_with_token(token: Option<&str>) -> Router {
    router(AppState::new(corpus(), token.map(str::to_string)), cors_layer(None))
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    call(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

fn ids(results: &[Document]) -> Vec<&str> {
    results.iter().map(|d| d.id.as_str()).collect()
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let (status, body) = get(app_with_token(None), "/search?q=python").await;
    assert_eq!(status, StatusCode::OK);
    let resp: SearchResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(resp.total_hits, 2);
    let got = ids(&resp.results);
    assert!(got.contains(&"b1") && got.contains(&"b3"));
}

#[tokio::test]
async fn search_filters_sorts_and_truncates() {
    let (_, body) = get(app_with_token(None), "/search?q=guide%20python&sort=rating").await;
    let resp: SearchResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(ids(&resp.results), ["b2", "b1", "b3"]);

    let (_, body) = get(app_with_token(None), "/search?q=python&category=Science").await;
    let resp: SearchResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(ids(&resp.results), ["b3"]);

    let (_, body) = get(app_with_token(None), "/search?q=guide%20python&sort=year&k=1").await;
    let resp: SearchResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(resp.total_hits, 3);
    assert_eq!(ids(&resp.results), ["b3"]);
}

#[tokio::test]
async fn empty_query_has_no_hits() {
    let (status, body) = get(app_with_token(None), "/search?q=").await;
    assert_eq!(status, StatusCode::OK);
    let resp: SearchResponse = serde_json::from_slice(&body).unwrap();
    assert!(resp.results.is_empty());
}

#[tokio::test]
async fn similar_books_exclude_source() {
    let (status, body) = get(app_with_token(None), "/books/b1/similar?top_n=1").await;
    assert_eq!(status, StatusCode::OK);
    let resp: SimilarResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(resp.results.len(), 1);
    assert_ne!(resp.results[0].id, "b1");

    let (_, body) = get(app_with_token(None), "/books/b1/similar").await;
    let resp: SimilarResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(resp.results.len(), 2);

    let (status, body) = get(app_with_token(None), "/books/zz/similar").await;
    assert_eq!(status, StatusCode::OK);
    let resp: SimilarResponse = serde_json::from_slice(&body).unwrap();
    assert!(resp.results.is_empty());
}

#[tokio::test]
async fn book_lookup_and_catalog_listing() {
    let (status, body) = get(app_with_token(None), "/books/b2").await;
    assert_eq!(status, StatusCode::OK);
    let doc: Document = serde_json::from_slice(&body).unwrap();
    assert_eq!(doc.title, "Guide to JavaScript");

    let (status, _) = get(app_with_token(None), "/books/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = get(app_with_token(None), "/categories").await;
    let cats: Vec<String> = serde_json::from_slice(&body).unwrap();
    assert_eq!(cats, ["Science", "Tech"]);

    let (_, body) = get(app_with_token(None), "/books").await;
    let all: Vec<Document> = serde_json::from_slice(&body).unwrap();
    assert_eq!(ids(&all), ["b1", "b2", "b3"]);
}

#[tokio::test]
async fn suggestions_match_substrings() {
    let (_, body) = get(app_with_token(None), "/suggest?q=SCI").await;
    let s: Vec<String> = serde_json::from_slice(&body).unwrap();
    assert_eq!(s, ["Data Science"]);

    let (_, body) = get(app_with_token(None), "/suggest?q=").await;
    let s: Vec<String> = serde_json::from_slice(&body).unwrap();
    assert!(s.is_empty());
}

fn rebuild_request(token: Option<&str>, books: &[Document]) -> Request<Body> {
    let mut req = Request::post("/index/rebuild").header("content-type", "application/json");
    if let Some(t) = token {
        req = req.header("X-ADMIN-TOKEN", t);
    }
    req.body(Body::from(serde_json::to_vec(books).unwrap())).unwrap()
}

#[tokio::test]
async fn rebuild_requires_admin_token() {
    let (status, _) = call(app_with_token(None), rebuild_request(Some("x"), &corpus())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(app_with_token(Some("secret")), rebuild_request(Some("wrong"), &corpus())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rebuild_publishes_new_index() {
    let app = app_with_token(Some("secret"));
    let (_, body) = get(app.clone(), "/stats").await;
    let before: StatsResponse = serde_json::from_slice(&body).unwrap();

    let mut books = corpus();
    books.push(book("b4", "Rust in Action", "D", "Tech", 2021, 4.5));
    let (status, body) = call(app.clone(), rebuild_request(Some("secret"), &books)).await;
    assert_eq!(status, StatusCode::OK);
    let after: StatsResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(after.books, 4);
    assert_eq!(after.vectors, 4);
    assert!(after.vocabulary_size > before.vocabulary_size);

    let (_, body) = get(app, "/search?q=rust").await;
    let resp: SearchResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(ids(&resp.results), ["b4"]);
}

#[tokio::test]
async fn builds_from_corpus_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("books.json");
    fs::write(&path, serde_json::to_vec(&corpus()).unwrap()).unwrap();
    let app = build_app(AppConfig { corpus_path: path.to_string_lossy().to_string(), ..AppConfig::default() }).unwrap();

    let (status, body) = get(app.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");

    let (_, body) = get(app, "/stats").await;
    let stats: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(stats["books"], 3);
    assert_eq!(stats["vocabulary_size"], stats["idf_size"]);
}
