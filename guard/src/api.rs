// Standard library imports
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

// Third party imports
use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::info;

// Internal imports
use crate::error::ServiceError;
use crate::service::{
    AnalysisOutcome, AnalyzeRequest, FraudGuardService, MockScoreRequest, ServiceStats,
};
use crate::state::{FrozenWallet, TransactionRecord};

/// Cấu trúc phản hồi API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
    pub timestamp: u64,
}

/// Cấu trúc lỗi API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
    pub code: u32,
    pub status: String,
    pub message: String,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::with_message("Operation successful", data)
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data: Some(data),
            timestamp: unix_now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
            timestamp: unix_now(),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match serde_json::to_value(&self) {
            Ok(json) => Json(json).into_response(),
            Err(err) => {
                let error_response =
                    ApiResponse::<()>::error(format!("JSON serialization error: {}", err));
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error_response)).into_response()
            }
        }
    }
}

type ApiError = (StatusCode, Json<ApiErrorResponse>);
type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

impl From<ServiceError> for ApiErrorResponse {
    fn from(err: ServiceError) -> Self {
        let (error, code) = match &err {
            ServiceError::InvalidAddress(_) => ("invalid_address", 400),
            ServiceError::EnforcementDisabled => ("enforcement_disabled", 503),
            ServiceError::Enforcement(_) => ("enforcement_failed", 502),
        };
        Self {
            error: error.to_string(),
            code,
            status: "error".to_string(),
            message: err.to_string(),
        }
    }
}

fn api_error(err: ServiceError) -> ApiError {
    let body = ApiErrorResponse::from(err);
    let status =
        StatusCode::from_u16(body.code as u16).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletStatus {
    pub wallet_address: String,
    pub frozen: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnfreezeResult {
    pub wallet_address: String,
    pub tx_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockScore {
    pub risk_score: u8,
}

async fn health_check(State(service): State<Arc<FraudGuardService>>) -> impl IntoResponse {
    ApiResponse::success(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "enforcement_enabled": service.enforcement_enabled(),
        "server_time": unix_now(),
    }))
}

async fn analyze(
    State(service): State<Arc<FraudGuardService>>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<AnalysisOutcome> {
    let outcome = service.analyze(request).await.map_err(api_error)?;
    let message = match &outcome.tx_hash {
        Some(_) => "Wallet frozen",
        None => "Analysis complete",
    };
    Ok(Json(ApiResponse::with_message(message, outcome)))
}

async fn wallet_status(
    State(service): State<Arc<FraudGuardService>>,
    Path(address): Path<String>,
) -> ApiResult<WalletStatus> {
    let frozen = service.check_status(&address).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(WalletStatus {
        wallet_address: address,
        frozen,
    })))
}

async fn unfreeze_wallet(
    State(service): State<Arc<FraudGuardService>>,
    Path(address): Path<String>,
) -> ApiResult<UnfreezeResult> {
    let tx_hash = service.unfreeze(&address).await.map_err(api_error)?;
    Ok(Json(ApiResponse::with_message(
        "Wallet unfrozen",
        UnfreezeResult {
            wallet_address: address,
            tx_hash,
        },
    )))
}

async fn frozen_wallets(
    State(service): State<Arc<FraudGuardService>>,
) -> Json<ApiResponse<Vec<FrozenWallet>>> {
    Json(ApiResponse::success(service.frozen_wallets().await))
}

async fn recent_transactions(
    State(service): State<Arc<FraudGuardService>>,
) -> Json<ApiResponse<Vec<TransactionRecord>>> {
    Json(ApiResponse::success(service.recent_transactions().await))
}

async fn stats(State(service): State<Arc<FraudGuardService>>) -> Json<ApiResponse<ServiceStats>> {
    Json(ApiResponse::success(service.stats().await))
}

async fn mock_score(
    State(service): State<Arc<FraudGuardService>>,
    Json(request): Json<MockScoreRequest>,
) -> Json<ApiResponse<MockScore>> {
    let risk_score = service.mock_score(&request).await;
    Json(ApiResponse::with_message(
        "Demo score, not used for enforcement",
        MockScore { risk_score },
    ))
}

/// Router của toàn bộ API
pub fn get_routes(service: Arc<FraudGuardService>) -> Router {
    let cors = CorsLayer::new()
        .allow_headers(Any)
        .allow_methods(Any)
        .allow_origin(Any);

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/analyze", post(analyze))
        .route("/api/wallets/frozen", get(frozen_wallets))
        .route("/api/wallets/:address/status", get(wallet_status))
        .route("/api/wallets/:address/unfreeze", post(unfreeze_wallet))
        .route("/api/transactions", get(recent_transactions))
        .route("/api/stats", get(stats))
        .route("/api/demo/mock-score", post(mock_score))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        )
        .layer(cors)
        .with_state(service)
}

/// Chạy API server cho đến khi `shutdown` hoàn thành
pub async fn serve<F>(service: Arc<FraudGuardService>, addr: SocketAddr, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = get_routes(service);

    info!("API server starting on {}", addr);

    axum::Server::try_bind(&addr)
        .with_context(|| format!("Không thể bind {}", addr))?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .context("API server dừng do lỗi")?;

    info!("API server đã dừng");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraudguard_blockchain::EnforcementError;

    #[test]
    fn test_service_error_status_codes() {
        let (status, body) = api_error(ServiceError::InvalidAddress("x".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.error, "invalid_address");

        let (status, _) = api_error(ServiceError::EnforcementDisabled);
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, body) = api_error(ServiceError::Enforcement(EnforcementError::Reverted(
            "wallet already frozen".into(),
        )));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.0.code, 502);
        assert!(body.0.message.contains("wallet already frozen"));
    }

    #[test]
    fn test_api_response_envelope() {
        let response = ApiResponse::success(5u8);
        assert_eq!(response.status, "success");
        assert_eq!(response.data, Some(5));

        let response = ApiResponse::<()>::error("boom");
        assert_eq!(response.status, "error");
        assert!(response.data.is_none());
        assert!(response.timestamp > 0);
    }
}
