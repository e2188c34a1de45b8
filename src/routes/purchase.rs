use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::purchase::{CheckoutRequest, ReceiptList},
    error::AppResult,
    middleware::{auth::AuthUser, json::AppJson},
    models::Receipt,
    response::{ApiResponse, Meta},
    services::purchase_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/purchase", post(purchase))
        .route("/history", get(history))
}

#[utoipa::path(
    post,
    path = "/api/purchase",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Checkout the cart", body = ApiResponse<Receipt>),
        (status = 400, description = "Invalid cart or insufficient stock"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Purchases"
)]
pub async fn purchase(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<Receipt>>> {
    let receipt = purchase_service::checkout(&state, Some(&user), payload.cart).await?;
    Ok(Json(ApiResponse::success(
        "Checkout success",
        receipt,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/history",
    responses(
        (status = 200, description = "Purchase history, newest first", body = ApiResponse<ReceiptList>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Purchases"
)]
pub async fn history(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ReceiptList>>> {
    let items = purchase_service::list_purchases(&state, &user).await?;
    let meta = Meta::count(items.len());
    Ok(Json(ApiResponse::success(
        "History",
        ReceiptList { items },
        Some(meta),
    )))
}
