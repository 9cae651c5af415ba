use serde::{Deserialize, Serialize};

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AuthRequest {
        pub username: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AuthResponse {
        /// Bearer token for the protected routes.
        pub token: String,
    }
}

pub mod coins {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SendCoinRequest {
        /// Username of the receiver.
        pub to_user: String,
        pub amount: i64,
    }
}

pub mod shop {
    use super::*;

    /// Query string of `GET /api/buy/{item}`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BuyParams {
        /// Units to buy, one when omitted.
        pub quantity: Option<i32>,
    }
}

pub mod info {
    use super::*;

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct InventoryItem {
        #[serde(rename = "type")]
        pub kind: String,
        pub quantity: i64,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ReceivedCoins {
        pub from_user: String,
        pub amount: i64,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SentCoins {
        pub to_user: String,
        pub amount: i64,
    }

    #[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CoinHistory {
        pub received: Vec<ReceivedCoins>,
        pub sent: Vec<SentCoins>,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InfoResponse {
        pub coins: i64,
        pub inventory: Vec<InventoryItem>,
        pub coin_history: CoinHistory,
    }
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub errors: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_uses_wire_field_names() {
        let body = info::InfoResponse {
            coins: 920,
            inventory: vec![info::InventoryItem {
                kind: "t-shirt".to_string(),
                quantity: 1,
            }],
            coin_history: info::CoinHistory {
                received: vec![info::ReceivedCoins {
                    from_user: "bob".to_string(),
                    amount: 30,
                }],
                sent: Vec::new(),
            },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["inventory"][0]["type"], "t-shirt");
        assert_eq!(json["coinHistory"]["received"][0]["fromUser"], "bob");
        assert_eq!(json["coinHistory"]["sent"], serde_json::json!([]));
    }

    #[test]
    fn send_coin_reads_camel_case() {
        let request: coins::SendCoinRequest =
            serde_json::from_str(r#"{"toUser": "bob", "amount": 50}"#).unwrap();
        assert_eq!(request.to_user, "bob");
        assert_eq!(request.amount, 50);
    }
}
