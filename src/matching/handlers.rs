use axum::{
    extract::State,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, warn};
use utoipa_swagger_ui::SwaggerUi;

use crate::matching::{
    errors::{MatchError, RankError, StoreError},
    objects::ScoredCandidate,
    openapi::{load_openapi_spec, MatchParams, RpcResponse},
    ranker::SimilarityRanker,
    service::recommend,
    store::EntityStore,
};

/// Состояние приложения для HTTP обработчиков
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub ranker: Arc<SimilarityRanker>,
}

impl AppState {
    pub fn new(store: Arc<dyn EntityStore>, ranker: Arc<SimilarityRanker>) -> AppState {
        AppState { store, ranker }
    }
}

pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/mentor-mentee", post(mentor_mentee))
        .route("/mentor-mentee/", post(mentor_mentee))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", load_openapi_spec()))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// CORS с credentials: только явно перечисленные источники
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([ACCEPT, AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}

/// Приветствие
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Сервис запущен", body = String)
    ),
    tag = "System"
)]
pub async fn home() -> Json<&'static str> {
    Json("Hi from mentor-match")
}

/// Проверка здоровья сервиса
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Сервис работает", body = RpcResponse)
    ),
    tag = "System"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<RpcResponse> {
    Json(RpcResponse {
        status: "ok".to_string(),
        data: Some(serde_json::json!({
            "status": "healthy",
            "model": state.ranker.model_name()
        })),
        message: None,
    })
}

/// Ранжирование пула (по умолчанию менторов) по сходству навыков с пользователем
#[utoipa::path(
    post,
    path = "/mentor-mentee/",
    request_body = MatchParams,
    responses(
        (status = 200, description = "Кандидаты по убыванию сходства", body = [ScoredCandidate]),
        (status = 400, description = "Некорректный запрос", body = RpcResponse),
        (status = 404, description = "Пользователь не найден", body = RpcResponse),
        (status = 502, description = "Ошибка модели эмбеддингов", body = RpcResponse)
    ),
    tag = "Matching"
)]
pub async fn mentor_mentee(
    State(state): State<AppState>,
    Json(payload): Json<MatchParams>,
) -> Result<Json<Vec<ScoredCandidate>>, MatchError> {
    let pool = payload.pool.unwrap_or_default();

    // Вызов модели блокирующий, уводим его с async воркеров
    let ranked = tokio::task::spawn_blocking(move || {
        recommend(state.store.as_ref(), &state.ranker, &payload.user_id, pool)
    })
    .await
    .map_err(|e| MatchError::Task(e.to_string()))??;

    Ok(Json(ranked))
}

impl MatchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            MatchError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            MatchError::Store(StoreError::InvalidInput(_))
            | MatchError::Rank(RankError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            MatchError::Rank(RankError::EmbeddingService(_)) => StatusCode::BAD_GATEWAY,
            MatchError::Store(_) | MatchError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, %status, "request failed");
        } else {
            warn!(error = %self, %status, "request rejected");
        }

        let body = RpcResponse {
            status: "error".to_string(),
            data: None,
            message: Some(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}
