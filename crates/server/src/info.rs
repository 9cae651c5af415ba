//! Account info endpoint

use api_types::info::{CoinHistory, InfoResponse, InventoryItem, ReceivedCoins, SentCoins};
use axum::{Extension, Json, extract::State};

use crate::{
    ServerError,
    server::{AuthenticatedAccount, ServerState},
};

/// Handle `GET /api/info`: balance, inventory and coin history of the caller.
pub async fn get(
    Extension(AuthenticatedAccount(account_id)): Extension<AuthenticatedAccount>,
    State(state): State<ServerState>,
) -> Result<Json<InfoResponse>, ServerError> {
    let info = state.engine.info(account_id).await?;

    Ok(Json(InfoResponse {
        coins: info.balance,
        inventory: info
            .inventory
            .into_iter()
            .map(|row| InventoryItem {
                kind: row.item_name,
                quantity: row.quantity,
            })
            .collect(),
        coin_history: CoinHistory {
            received: info
                .history
                .received
                .into_iter()
                .map(|entry| ReceivedCoins {
                    from_user: entry.from_user,
                    amount: entry.amount,
                })
                .collect(),
            sent: info
                .history
                .sent
                .into_iter()
                .map(|entry| SentCoins {
                    to_user: entry.to_user,
                    amount: entry.amount,
                })
                .collect(),
        },
    }))
}
