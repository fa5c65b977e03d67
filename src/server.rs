// Copyright (c) 2026 memograde developers. Licensed under MIT.
use std::sync::Arc;

use axum::{
    async_trait,
    extract::rejection::JsonRejection,
    extract::{FromRequest, Path, Request, State},
    http::header::AUTHORIZATION,
    http::StatusCode,
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::api::{
    AuthorizationRequest, CheckRequest, FlowResponse, SubmitRequest, TransactionSummary,
};
use crate::errors::ServiceError;
use crate::flows::GradingService;

pub type SharedService = Arc<GradingService>;

/// Json extractor whose rejection is reported through the uniform flow
/// envelope as a 400 instead of axum's default 422.
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(ServiceError::Validation(rejection.body_text())),
        }
    }
}

async fn auth_guard(
    State(token): State<Arc<String>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let provided = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.strip_prefix("Bearer "));
    match provided {
        Some(value) if value == token.as_str() => Ok(next.run(req).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

pub fn build_router(state: SharedService, auth_token: Option<String>) -> Router {
    let mut app = Router::new()
        .route("/authorization/new", post(authorization))
        .route("/submit", post(submit))
        .route("/check", post(check))
        .route("/transaction/:pub_key", get(transaction_history))
        .route("/metrics", get(metrics_handler))
        .layer(CorsLayer::permissive())
        .with_state(state);

    if let Some(token) = auth_token {
        tracing::info!("auth enabled: bearer token required");
        app = app.layer(from_fn_with_state(Arc::new(token), auth_guard));
    } else {
        tracing::warn!("auth disabled: no token configured");
    }

    app
}

async fn authorization(
    State(svc): State<SharedService>,
    AppJson(req): AppJson<AuthorizationRequest>,
) -> Result<Json<FlowResponse>, ServiceError> {
    Ok(Json(svc.authorize(&req).await?))
}

async fn submit(
    State(svc): State<SharedService>,
    AppJson(req): AppJson<SubmitRequest>,
) -> Result<Json<FlowResponse>, ServiceError> {
    Ok(Json(svc.submit_code(&req).await?))
}

async fn check(
    State(svc): State<SharedService>,
    AppJson(req): AppJson<CheckRequest>,
) -> Result<Json<FlowResponse>, ServiceError> {
    Ok(Json(svc.check_code(&req).await?))
}

async fn transaction_history(
    State(svc): State<SharedService>,
    Path(pub_key): Path<String>,
) -> Result<Json<Vec<TransactionSummary>>, ServiceError> {
    Ok(Json(svc.history(&pub_key).await?))
}

async fn metrics_handler() -> String {
    crate::telemetry::get_metrics()
}
