// http server - routes the trivia api and shapes its json envelopes

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::core::categories::{self, CategoryList};
use crate::core::questions::{
    self, CategoryQuestions, Created, Deleted, QuestionList, QuizQuestion, QuizRequest,
    SearchResults,
};
use crate::{ApiError, Db, Error, NewQuestion, page_number};

const ALLOW_HEADERS: &str = "Content-Type,Authorization,true";
const ALLOW_METHODS: &str = "GET,PUT,POST,DELETE,OPTIONS";

struct AppState {
    db: Db,
}

// every successful response is `{"success": true, ...fields}`
#[derive(Serialize)]
struct Success<T> {
    success: bool,
    #[serde(flatten)]
    body: T,
}

type ApiResult<T> = Result<Json<Success<T>>, ApiError>;

fn success<T>(body: T) -> Json<Success<T>> {
    Json(Success {
        success: true,
        body,
    })
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<String>,
}

#[derive(Deserialize)]
struct SearchRequest {
    #[serde(rename = "searchTerm", default)]
    search_term: Option<String>,
}

pub struct Server;

impl Server {
    pub async fn run(db_url: &str, host: &str, port: u16, init: bool) -> Result<(), Error> {
        let db = Db::connect(db_url).await?;
        info!(dialect = db.dialect_name(), "connected to database");

        if init {
            db.init_schema(true).await?;
            info!("schema ready");
        }

        let app = router(db);

        let addr = format!("{host}:{port}");
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Server(e.to_string()))?;
        info!("server running at http://{addr}");

        axum::serve(listener, app)
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        Ok(())
    }
}

/// Builds the api router over an already connected store.
pub fn router(db: Db) -> Router {
    let state = Arc::new(AppState { db });

    Router::new()
        .route("/categories", get(get_categories))
        .route("/categories/{id}/questions", get(get_category_questions))
        .route("/questions", get(get_questions).post(create_question))
        .route("/questions/search", post(search_questions))
        .route("/questions/{id}", delete(delete_question))
        .route("/quizzes", post(quiz))
        .fallback(not_found)
        .layer(middleware::map_response(json_method_not_allowed))
        .layer(CorsLayer::new().allow_origin(Any))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

// axum answers a wrong verb with an empty 405; give it the same envelope as other errors
async fn json_method_not_allowed(response: Response) -> Response {
    if response.status() == StatusCode::METHOD_NOT_ALLOWED {
        ApiError::MethodNotAllowed.into_response()
    } else {
        response
    }
}

fn page_of(query: Result<Query<PageQuery>, QueryRejection>) -> i64 {
    let raw = query.ok().and_then(|Query(q)| q.page);
    page_number(raw.as_deref())
}

// ids that don't parse don't name a resource
fn id_of(path: Result<Path<String>, PathRejection>) -> Result<i64, ApiError> {
    let Path(raw) = path.map_err(|_| ApiError::NotFound)?;
    raw.trim().parse().map_err(|_| ApiError::NotFound)
}

async fn get_categories(State(state): State<Arc<AppState>>) -> ApiResult<CategoryList> {
    Ok(success(categories::list_categories(&state.db).await?))
}

async fn get_questions(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<QuestionList> {
    let page = page_of(query);
    Ok(success(questions::list_questions(&state.db, page).await?))
}

async fn delete_question(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Deleted> {
    let id = id_of(path)?;
    Ok(success(questions::delete_question(&state.db, id).await?))
}

async fn create_question(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewQuestion>, JsonRejection>,
) -> ApiResult<Created> {
    let Json(new) = payload?;
    Ok(success(questions::create_question(&state.db, &new).await?))
}

async fn search_questions(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<SearchResults> {
    let Json(req) = payload?;
    let page = page_of(query);

    Ok(success(
        questions::search_questions(&state.db, req.search_term.as_deref(), page).await?,
    ))
}

// the category id comes in as text; anything unusable is a 404 from the service
async fn get_category_questions(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<CategoryQuestions> {
    let Path(id) = path.map_err(|_| ApiError::NotFound)?;
    Ok(success(questions::questions_by_category(&state.db, &id).await?))
}

async fn quiz(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QuizRequest>, JsonRejection>,
) -> ApiResult<QuizQuestion> {
    // every quiz failure, body parsing included, is unprocessable
    let Json(req) = payload.map_err(|e| {
        warn!(error = %e, "rejected quiz request");
        ApiError::Unprocessable
    })?;

    Ok(success(questions::next_quiz_question(&state.db, req).await?))
}
