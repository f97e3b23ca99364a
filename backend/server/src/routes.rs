use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, info, warn};

use crate::{
    database::parse_object_id,
    error::AppError,
    models::{CarModel, LoginPayload, Message, RefModel, StockPayload},
    state::AppState,
    utils::{check_login, validate_stock},
};

const STOCK_UPDATED: Message = Message::new("Stock updated successfully");

/// Requests without a JSON body read as `{}`.
fn body_or_default<T: Default>(payload: Option<Json<T>>) -> T {
    payload.map(|Json(payload)| payload).unwrap_or_default()
}

pub async fn welcome_handler() -> &'static str {
    "Welcome to the car inventory server with MongoDB!"
}

pub async fn test_handler() -> &'static str {
    "Test route is working"
}

pub async fn list_cars_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CarModel>>, AppError> {
    let cars = state
        .store
        .list_cars()
        .await
        .map_err(AppError::internal("Failed to fetch cars"))?;

    info!(count = cars.len(), "Fetched cars");

    Ok(Json(cars))
}

pub async fn update_car_stock_handler(
    State(state): State<Arc<AppState>>,
    Path((model, fuel)): Path<(String, String)>,
    payload: Option<Json<StockPayload>>,
) -> Result<impl IntoResponse, AppError> {
    let payload = body_or_default(payload);
    info!(%model, %fuel, stock = %payload.stock, "Updating car stock");

    let modified = state
        .store
        .update_car_stock(&model, &fuel, payload.stock)
        .await
        .map_err(AppError::internal("Internal Server Error"))?;

    // an unchanged value also lands here
    if modified != 1 {
        warn!(%model, %fuel, modified, "Car stock update matched nothing");
        return Err(AppError::NotFound("Car or type not found"));
    }

    Ok((StatusCode::OK, Json(STOCK_UPDATED)))
}

pub async fn list_refs_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RefModel>>, AppError> {
    let refs = state
        .store
        .list_refs()
        .await
        .map_err(AppError::internal("Failed to fetch refs"))?;

    Ok(Json(refs))
}

pub async fn update_ref_stock_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Option<Json<StockPayload>>,
) -> Result<impl IntoResponse, AppError> {
    let payload = body_or_default(payload);
    info!(%id, stock = %payload.stock, "Updating ref stock");

    validate_stock(&payload.stock)?;

    let failed = AppError::internal("Failed to update stock");
    let modified = match parse_object_id(&id) {
        Ok(object_id) => state.store.update_ref_stock(object_id, payload.stock).await,
        Err(e) => Err(e),
    }
    .map_err(failed)?;

    if modified != 1 {
        warn!(%id, modified, "Ref stock update matched nothing");
        return Err(AppError::NotFound("Ref code not found"));
    }

    Ok((StatusCode::OK, Json(STOCK_UPDATED)))
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<LoginPayload>>,
) -> Result<impl IntoResponse, AppError> {
    let payload = body_or_default(payload);
    let Some(email) = payload.email.as_deref() else {
        info!("Login attempt without an email");
        return Err(AppError::InvalidCredentials);
    };

    debug!(email, "Login attempt");

    let admin = state
        .store
        .find_admin(email)
        .await
        .map_err(AppError::internal("Login failed"))?;

    check_login(&payload, admin.as_ref()).inspect_err(|_| {
        info!(found = admin.is_some(), "Rejected login");
    })?;

    Ok((StatusCode::OK, Json(Message::new("Login successful"))))
}
