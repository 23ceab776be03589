use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use bookfinder_core::corpus::load_corpus;
use bookfinder_core::{Document, EngineError, SearchFilters, SharedCatalog, Snapshot, SortOrder, DEFAULT_TOP_N};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Query suggestions offered while typing.
pub const POPULAR_SEARCHES: &[&str] = &[
    "Python", "JavaScript", "React", "Machine Learning", "Data Science",
    "Business", "Leadership", "Finance", "Fiction", "Mystery",
];
const MAX_SUGGESTIONS: usize = 5;

type ApiError = (StatusCode, String);

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub corpus_path: String,
    pub admin_token: Option<String>,
    /// Comma-separated origins; any origin is allowed when unset or empty.
    pub cors_allow_origin: Option<String>,
}

impl AppConfig {
    /// Read `ADMIN_TOKEN` and `CORS_ALLOW_ORIGIN` from the environment.
    pub fn from_env(corpus_path: impl Into<String>) -> Self {
        Self {
            corpus_path: corpus_path.into(),
            admin_token: std::env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty()),
            cors_allow_origin: std::env::var("CORS_ALLOW_ORIGIN").ok(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<SharedCatalog>,
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(corpus: Vec<Document>, admin_token: Option<String>) -> Self {
        Self { catalog: Arc::new(SharedCatalog::new(corpus)), admin_token }
    }
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sort: SortOrder,
    /// Truncate to this many results; all matches when absent.
    pub k: Option<usize>,
}

#[derive(Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<Document>,
}

#[derive(Deserialize)]
pub struct SimilarParams {
    pub top_n: Option<usize>,
}

#[derive(Serialize, Deserialize)]
pub struct SimilarResponse {
    pub source: String,
    pub results: Vec<Document>,
}

#[derive(Deserialize)]
pub struct SuggestParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Serialize, Deserialize)]
pub struct StatsResponse {
    pub books: usize,
    pub vocabulary_size: usize,
    pub idf_size: usize,
    pub vectors: usize,
    pub built_at: String,
}

impl StatsResponse {
    fn of(snapshot: &Snapshot) -> Self {
        let stats = snapshot.stats();
        Self {
            books: snapshot.corpus().len(),
            vocabulary_size: stats.vocabulary_size,
            idf_size: stats.idf_size,
            vectors: stats.vectors,
            built_at: snapshot.built_at().format(&Rfc3339).unwrap_or_default(),
        }
    }
}

pub fn build_app(config: AppConfig) -> Result<Router> {
    let corpus = load_corpus(&config.corpus_path)?;
    let state = AppState::new(corpus, config.admin_token);
    Ok(router(state, cors_layer(config.cors_allow_origin.as_deref())))
}

pub fn cors_layer(allow_origin: Option<&str>) -> CorsLayer {
    let origins: Vec<_> = allow_origin
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    if origins.is_empty() {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
    }
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/stats", get(stats_handler))
        .route("/search", get(search_handler))
        .route("/suggest", get(suggest_handler))
        .route("/categories", get(categories_handler))
        .route("/books", get(books_handler))
        .route("/books/:id", get(book_handler))
        .route("/books/:id/similar", get(similar_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn integrity_error(err: EngineError) -> ApiError {
    tracing::error!(error = %err, "index integrity failure");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

fn owned(books: Vec<&Document>) -> Vec<Document> {
    books.into_iter().cloned().collect()
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::of(&state.catalog.current()))
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let snapshot = state.catalog.current();
    let filters = SearchFilters { category: params.category.filter(|c| !c.is_empty()), sort: params.sort };
    let mut books = filters.apply(snapshot.search(&params.q).map_err(integrity_error)?);
    let total_hits = books.len();
    if let Some(k) = params.k {
        books.truncate(k);
    }
    let elapsed = start.elapsed();
    tracing::debug!(query = %params.q, total_hits, "search served");
    Ok(Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits, results: owned(books) }))
}

pub async fn suggest_handler(Query(params): Query<SuggestParams>) -> Json<Vec<&'static str>> {
    let q = params.q.trim().to_lowercase();
    if q.is_empty() {
        return Json(Vec::new());
    }
    Json(POPULAR_SEARCHES.iter().copied().filter(|s| s.to_lowercase().contains(&q)).take(MAX_SUGGESTIONS).collect())
}

pub async fn categories_handler(State(state): State<AppState>) -> Json<Vec<String>> {
    let snapshot = state.catalog.current();
    Json(snapshot.categories().into_iter().map(str::to_string).collect())
}

pub async fn books_handler(State(state): State<AppState>) -> Json<Vec<Document>> {
    let snapshot = state.catalog.current();
    Json(snapshot.corpus().to_vec())
}

pub async fn book_handler(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Document>, ApiError> {
    let snapshot = state.catalog.current();
    match snapshot.get(&id) {
        Some(doc) => Ok(Json(doc.clone())),
        None => Err((StatusCode::NOT_FOUND, format!("book {id} not found"))),
    }
}

pub async fn similar_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<SimilarParams>,
) -> Result<Json<SimilarResponse>, ApiError> {
    let snapshot = state.catalog.current();
    let top_n = params.top_n.unwrap_or(DEFAULT_TOP_N);
    let books = snapshot.recommend_by_id(&id, top_n).map_err(integrity_error)?;
    Ok(Json(SimilarResponse { source: id, results: owned(books) }))
}

async fn rebuild_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(books): Json<Vec<Document>>,
) -> Result<Json<StatsResponse>, ApiError> {
    authorize(&state, &headers)?;
    let catalog = Arc::clone(&state.catalog);
    let snapshot = tokio::task::spawn_blocking(move || catalog.rebuild(books))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("rebuild failed: {e}")))?;
    Ok(Json(StatsResponse::of(&snapshot)))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
