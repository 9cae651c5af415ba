use api_types::ErrorResponse;
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

pub use auth::{AuthConfig, AuthError, Claims, TokenKeys};
pub use server::{ServerState, app, run_with_listener};

mod auth;
mod coins;
mod info;
mod server;
mod shop;

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    Auth(AuthError),
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::ItemNotFound(_)
        | EngineError::InvalidQuantity(_)
        | EngineError::InvalidAmount(_)
        | EngineError::InsufficientFunds(_)
        | EngineError::SelfTransfer
        | EngineError::AccountNotFound(_)
        | EngineError::InvalidUsername(_)
        | EngineError::ExistingAccount(_) => StatusCode::BAD_REQUEST,
        EngineError::TransientConflict(_) => StatusCode::CONFLICT,
        EngineError::DeadlineExceeded(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::StoreUnavailable(_) | EngineError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::StoreUnavailable(reason) => {
            tracing::error!("store unavailable: {reason}");
            "internal server error".to_string()
        }
        EngineError::TransientConflict(reason) => {
            tracing::warn!("transient conflict: {reason}");
            "concurrent update conflict, retry the request".to_string()
        }
        other => other.to_string(),
    }
}

fn status_for_auth_error(err: &AuthError) -> StatusCode {
    match err {
        AuthError::Hashing(_) | AuthError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        AuthError::MissingToken | AuthError::InvalidToken(_) | AuthError::WrongPassword => {
            StatusCode::UNAUTHORIZED
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, errors) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Auth(err) => {
                let status = status_for_auth_error(&err);
                if status.is_server_error() {
                    tracing::error!("auth failure: {err}");
                    (status, "internal server error".to_string())
                } else {
                    (status, err.to_string())
                }
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(ErrorResponse { errors })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<AuthError> for ServerError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn business_failures_map_to_400() {
        for err in [
            EngineError::ItemNotFound("x".to_string()),
            EngineError::InvalidQuantity("x".to_string()),
            EngineError::InvalidAmount("x".to_string()),
            EngineError::InsufficientFunds("x".to_string()),
            EngineError::SelfTransfer,
            EngineError::AccountNotFound("x".to_string()),
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn transient_conflict_maps_to_409() {
        let res =
            ServerError::from(EngineError::TransientConflict("busy".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn deadline_maps_to_503() {
        let res = ServerError::from(EngineError::DeadlineExceeded(Duration::from_secs(5)))
            .into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn store_unavailable_maps_to_500() {
        let res =
            ServerError::from(EngineError::StoreUnavailable("down".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn bad_credentials_map_to_401() {
        let res = ServerError::from(AuthError::WrongPassword).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let res = ServerError::from(AuthError::MissingToken).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
