use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::matching::objects::{Pool, ScoredCandidate};

/// Параметры запроса рекомендаций
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MatchParams {
    /// ID пользователя, для которого ищем пары
    pub user_id: String,
    /// Пул для ранжирования, по умолчанию менторы
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<Pool>,
}

/// Стандартный ответ со статусом
#[derive(Serialize, Deserialize, ToSchema)]
pub struct RpcResponse {
    /// "ok" или "error"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Сообщение об ошибке
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::matching::handlers::home,
        crate::matching::handlers::health_check,
        crate::matching::handlers::mentor_mentee
    ),
    components(
        schemas(
            MatchParams,
            Pool,
            RpcResponse,
            ScoredCandidate
        )
    ),
    tags(
        (name = "Matching", description = "Рекомендации менторов и менти"),
        (name = "System", description = "Состояние сервиса")
    ),
    info(
        title = "mentor-match API",
        version = "0.1.0",
        description = "Рекомендации менторов и менти по сходству навыков"
    )
)]
pub struct ApiDoc;

pub fn load_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
