use std::{future::Future, sync::Arc};

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{AuthConfig, AuthError, ServerError, TokenKeys, auth, coins, info, shop};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub tokens: Arc<TokenKeys>,
}

/// Account id taken from a validated bearer token.
#[derive(Clone, Copy, Debug)]
pub struct AuthenticatedAccount(pub i32);

async fn authorize(
    State(state): State<ServerState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AuthError::MissingToken)?;
    let claims = state.tokens.verify(bearer.token())?;

    request
        .extensions_mut()
        .insert(AuthenticatedAccount(claims.user_id));
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route("/api/info", get(info::get))
        .route("/api/sendCoin", post(coins::send_coin))
        .route("/api/buy/{item}", get(shop::buy))
        .route_layer(middleware::from_fn_with_state(state.clone(), authorize));

    Router::new()
        .route("/api/auth", post(auth::authenticate))
        .merge(protected)
        .with_state(state)
}

/// Build the application router around `engine`.
pub fn app(engine: Engine, auth: &AuthConfig) -> Router {
    router(ServerState {
        engine: Arc::new(engine),
        tokens: Arc::new(TokenKeys::new(auth)),
    })
}

/// Serve on `listener` until `shutdown` resolves.
pub async fn run_with_listener<F>(
    engine: Engine,
    auth: &AuthConfig,
    listener: tokio::net::TcpListener,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(engine, auth))
        .with_graceful_shutdown(shutdown)
        .await
}
