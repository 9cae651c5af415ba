//! Merchandise purchase endpoint

use api_types::shop::BuyParams;
use axum::{
    Extension,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};

use crate::{
    ServerError,
    server::{AuthenticatedAccount, ServerState},
};

/// Handle `GET /api/buy/{item}`
pub async fn buy(
    Extension(AuthenticatedAccount(account_id)): Extension<AuthenticatedAccount>,
    State(state): State<ServerState>,
    Path(item): Path<String>,
    params: Result<Query<BuyParams>, QueryRejection>,
) -> Result<StatusCode, ServerError> {
    let Query(params) = params.map_err(|rejection| ServerError::Generic(rejection.body_text()))?;
    let quantity = params.quantity.unwrap_or(1);

    state.engine.purchase(account_id, quantity, &item).await?;

    Ok(StatusCode::OK)
}
