use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use marquee_catalog::MovieDetail;
use marquee_core::{Movie, NewMovie, NewTheater, Theater};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::customer_auth_middleware;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct MovieQuery {
    pub search: Option<String>,
}

/// Accepts either a single object or an array of them.
#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self, OneOrMany::One(_))
    }

    /// Responds in the shape the request came in.
    pub fn shaped(single: bool, mut items: Vec<T>) -> Option<Self> {
        if single {
            items.pop().map(OneOrMany::One)
        } else {
            Some(OneOrMany::Many(items))
        }
    }
}

// ============================================================================
// Routes
// ============================================================================

/// Browsing is public; adding a movie needs a customer token.
pub fn routes(state: AppState) -> Router<AppState> {
    let create = post(create_movie)
        .layer(middleware::from_fn_with_state(state, customer_auth_middleware));

    Router::new()
        .route("/movies/", get(list_movies).merge(create))
        .route("/movies/{id}/", get(movie_detail))
        .route("/theaters/", get(list_theaters).post(create_theaters))
}

// ============================================================================
// Movies
// ============================================================================

async fn list_movies(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MovieQuery>,
) -> Result<Json<Vec<Movie>>, AppError> {
    let movies = state.catalog.list_movies(query.search.as_deref()).await?;
    Ok(Json(movies))
}

async fn movie_detail(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MovieDetail>, AppError> {
    Ok(Json(state.catalog.movie_detail(id).await?))
}

async fn create_movie(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<NewMovie>,
) -> Result<(StatusCode, Json<Movie>), AppError> {
    let movie = state.catalog.create_movie(req).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

// ============================================================================
// Theaters
// ============================================================================

async fn list_theaters(State(state): State<AppState>) -> Result<Json<Vec<Theater>>, AppError> {
    Ok(Json(state.catalog.list_theaters().await?))
}

async fn create_theaters(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<OneOrMany<NewTheater>>,
) -> Result<(StatusCode, Json<OneOrMany<Theater>>), AppError> {
    let single = req.is_single();
    let theaters = state.catalog.create_theaters(req.into_vec()).await?;
    let body = OneOrMany::shaped(single, theaters)
        .ok_or_else(|| AppError::InternalServerError("theater was not created".to_string()))?;
    Ok((StatusCode::CREATED, Json(body)))
}
