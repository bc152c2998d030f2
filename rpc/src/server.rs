//! Axum-based RPC server.
//!
//! Every call is a `POST /` with an `action`-tagged JSON body. Successful
//! calls answer `200 {"ok": true, ...}`; failures answer
//! `{"ok": false, "error": {"kind", "message"}}` with 400 when the request
//! never reached the ledger and 422 when the ledger rejected it.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use buidl_ledger::SharedLedger;
use serde_json::json;
use tracing::info;

use crate::error::RpcError;
use crate::handlers::{dispatch, RpcContext, RpcRequest, RpcSuccess};

pub struct RpcServer {
    pub bind: SocketAddr,
    context: Arc<RpcContext>,
}

impl RpcServer {
    pub fn new(bind: SocketAddr, ledger: SharedLedger) -> Self {
        Self {
            bind,
            context: Arc::new(RpcContext::new(ledger)),
        }
    }

    pub fn context(&self) -> Arc<RpcContext> {
        Arc::clone(&self.context)
    }

    pub fn router(&self) -> Router {
        router(self.context())
    }

    /// Bind and serve until `shutdown` resolves.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), RpcError> {
        let listener = tokio::net::TcpListener::bind(self.bind)
            .await
            .map_err(|e| RpcError::Server(format!("failed to bind {}: {e}", self.bind)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| RpcError::Server(e.to_string()))?;
        info!(%local_addr, "RPC server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;

        info!("RPC server stopped");
        Ok(())
    }
}

/// Build the router over a shared context.
pub fn router(context: Arc<RpcContext>) -> Router {
    Router::new()
        .route("/", post(handle_rpc))
        .with_state(context)
}

async fn handle_rpc(State(ctx): State<Arc<RpcContext>>, body: Bytes) -> Response {
    let result = serde_json::from_slice::<RpcRequest>(&body)
        .map_err(|e| RpcError::InvalidRequest(e.to_string()))
        .and_then(|request| dispatch(&ctx, request));

    match result {
        Ok(response) => Json(RpcSuccess::from(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = match &self {
            RpcError::Ledger(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RpcError::Amount(_) | RpcError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RpcError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({
            "ok": false,
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            },
        });
        (status, Json(body)).into_response()
    }
}
