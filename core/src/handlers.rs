use crate::auth::Credential;
use crate::errors::AppError;
use axum::{body::Bytes, extract::Path, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use token_ledger::{
    has_metadata, Dispatcher, Env, Invocation, JwtResolver, LedgerEvent, MemoryStore,
    TokenMetadata,
};
use tokio::sync::Mutex;
use utoipa::ToSchema;

/// Ledger behind the HTTP surface. Invocations are serialized on the store lock.
pub struct LedgerState {
    pub dispatcher: Dispatcher<JwtResolver>,
    pub store: Mutex<MemoryStore>,
}

impl LedgerState {
    pub fn new(resolver: JwtResolver) -> Self {
        Self {
            dispatcher: Dispatcher::new(resolver),
            store: Mutex::new(MemoryStore::new()),
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    #[serde(default)]
    #[schema(example = "")]
    pub standard: String,
    #[schema(example = "FabricToken")]
    pub name: String,
    #[schema(example = "FT")]
    pub symbol: String,
    #[schema(example = 2)]
    pub decimals: u16,
    #[schema(example = 10000)]
    pub total_supply: u64,
}

impl From<IssueRequest> for TokenMetadata {
    fn from(req: IssueRequest) -> Self {
        Self {
            standard: req.standard,
            name: req.name,
            symbol: req.symbol,
            decimals: req.decimals,
            total_supply: req.total_supply,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventEnvelope {
    #[schema(example = "Transfer")]
    pub name: String,
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
}

impl From<&LedgerEvent> for EventEnvelope {
    fn from(event: &LedgerEvent) -> Self {
        Self {
            name: event.name().to_string(),
            payload: event.payload(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InvokeResponse {
    #[schema(value_type = Object)]
    pub payload: Option<serde_json::Value>,
    pub events: Vec<EventEnvelope>,
}

impl From<Invocation> for InvokeResponse {
    fn from(invocation: Invocation) -> Self {
        for event in &invocation.events {
            tracing::info!(event = event.name(), payload = %event.payload(), "ledger event");
        }
        Self {
            payload: invocation.payload,
            events: invocation.events.iter().map(EventEnvelope::from).collect(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/init",
    request_body = IssueRequest,
    responses(
        (status = 200, description = "Token issued to the caller", body = InvokeResponse),
        (status = 400, description = "Malformed token description"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 409, description = "Token already issued")
    ),
    security(("bearer_auth" = [])),
    tag = "Ledger"
)]
pub async fn init_handler(
    Extension(ledger): Extension<Arc<LedgerState>>,
    Extension(credential): Extension<Credential>,
    body: Bytes,
) -> Result<Json<InvokeResponse>, AppError> {
    let req: IssueRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid token description: {e}")))?;

    let mut store = ledger.store.lock().await;
    if has_metadata(&Env::new(&mut *store))? {
        return Err(AppError::Conflict("token already issued".into()));
    }

    let invocation = ledger
        .dispatcher
        .init(&mut *store, credential.0.as_bytes(), req.into())?;
    Ok(Json(invocation.into()))
}

#[utoipa::path(
    post,
    path = "/invoke/{function}",
    params(
        ("function" = String, Path, description = "One of info, balance, allowances, transfer, approve, transferFrom")
    ),
    request_body(content = String, content_type = "application/json", description = "JSON arguments of the function"),
    responses(
        (status = 200, description = "Invocation committed", body = InvokeResponse),
        (status = 400, description = "Unknown function or malformed arguments"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Token not issued yet"),
        (status = 422, description = "Rejected by ledger rules")
    ),
    security(("bearer_auth" = [])),
    tag = "Ledger"
)]
pub async fn invoke_handler(
    Extension(ledger): Extension<Arc<LedgerState>>,
    Extension(credential): Extension<Credential>,
    Path(function): Path<String>,
    body: Bytes,
) -> Result<Json<InvokeResponse>, AppError> {
    let mut store = ledger.store.lock().await;
    let invocation = ledger
        .dispatcher
        .invoke_json(&mut *store, credential.0.as_bytes(), &function, &body)?;
    Ok(Json(invocation.into()))
}
