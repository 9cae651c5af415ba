//! Coin transfer endpoint

use api_types::coins::SendCoinRequest;
use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    ServerError,
    server::{AuthenticatedAccount, ServerState},
};

/// Handle `POST /api/sendCoin`
pub async fn send_coin(
    Extension(AuthenticatedAccount(sender_id)): Extension<AuthenticatedAccount>,
    State(state): State<ServerState>,
    payload: Result<Json<SendCoinRequest>, JsonRejection>,
) -> Result<StatusCode, ServerError> {
    let Json(payload) = payload.map_err(|rejection| ServerError::Generic(rejection.body_text()))?;

    state
        .engine
        .transfer_to_username(sender_id, &payload.to_user, payload.amount)
        .await?;

    Ok(StatusCode::OK)
}
