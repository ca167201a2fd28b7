//! Host-facing entry points.
//!
//! A [`Dispatcher`] turns one decoded request plus the caller's credential into
//! one committed [`Env`] run. Hosts own the transport; they hand over the
//! function name and its JSON arguments and get back a payload and the events
//! to publish.

use crate::contract::{Token, TokenTrait};
use crate::env::Env;
use crate::errors::{LedgerError, LedgerResult};
use crate::events::LedgerEvent;
use crate::identity::{IdentityResolver, Principal};
use crate::metadata::TokenMetadata;
use crate::storage::KeyedStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceQuery {
    pub user: Principal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceReply {
    pub user: Principal,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferArgs {
    pub to: Principal,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFromArgs {
    pub from: Principal,
    pub to: Principal,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveArgs {
    pub spender: Principal,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Info,
    Balance(BalanceQuery),
    Allowances(BalanceQuery),
    Transfer(TransferArgs),
    Approve(ApproveArgs),
    TransferFrom(TransferFromArgs),
}

fn parse_args<T: DeserializeOwned>(function: &str, args: &[u8]) -> LedgerResult<T> {
    serde_json::from_slice(args)
        .map_err(|e| LedgerError::MalformedRequest(format!("error parsing {function} args: {e}")))
}

impl Request {
    /// Decode a function name and its JSON arguments.
    pub fn decode(function: &str, args: &[u8]) -> LedgerResult<Self> {
        match function {
            "info" => Ok(Request::Info),
            "balance" => parse_args(function, args).map(Request::Balance),
            "allowances" => parse_args(function, args).map(Request::Allowances),
            "transfer" => parse_args(function, args).map(Request::Transfer),
            "approve" => parse_args(function, args).map(Request::Approve),
            "transferFrom" => parse_args(function, args).map(Request::TransferFrom),
            other => Err(LedgerError::MalformedRequest(format!(
                "Incorrect function name: {other}"
            ))),
        }
    }

    pub fn function(&self) -> &'static str {
        match self {
            Request::Info => "info",
            Request::Balance(_) => "balance",
            Request::Allowances(_) => "allowances",
            Request::Transfer(_) => "transfer",
            Request::Approve(_) => "approve",
            Request::TransferFrom(_) => "transferFrom",
        }
    }

    /// Whether the request changes state and therefore needs a resolved caller.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Request::Transfer(_) | Request::Approve(_) | Request::TransferFrom(_)
        )
    }
}

/// Outcome of a committed invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub payload: Option<serde_json::Value>,
    pub events: Vec<LedgerEvent>,
}

fn to_payload<T: Serialize>(value: &T) -> LedgerResult<Option<serde_json::Value>> {
    serde_json::to_value(value)
        .map(Some)
        .map_err(|e| LedgerError::MalformedRequest(format!("unencodable response: {e}")))
}

pub struct Dispatcher<R> {
    resolver: R,
}

impl<R: IdentityResolver> Dispatcher<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    /// Issue the token, crediting the supply to the credential's principal.
    pub fn init(
        &self,
        store: &mut dyn KeyedStore,
        credential: &[u8],
        metadata: TokenMetadata,
    ) -> LedgerResult<Invocation> {
        let issuer = self.resolver.resolve(credential)?;
        let ((), events) = Env::run(store, |e| Token::initialize(e, &issuer, metadata))?;
        Ok(Invocation {
            payload: None,
            events,
        })
    }

    pub fn invoke(
        &self,
        store: &mut dyn KeyedStore,
        credential: &[u8],
        request: Request,
    ) -> LedgerResult<Invocation> {
        let function = request.function();
        // Resolve before opening the context so identity failures never touch state.
        let caller = if request.is_mutation() {
            Some(self.resolver.resolve(credential)?)
        } else {
            None
        };
        tracing::debug!(function, caller = ?caller.as_ref().map(Principal::as_str), "invoke");

        let (payload, events) = match (request, caller) {
            (Request::Info, _) => Env::run(store, |e| to_payload(&Token::info(e)?))?,
            (Request::Balance(query), _) => Env::run(store, |e| {
                let value = Token::balance(e, &query.user)?;
                to_payload(&BalanceReply {
                    user: query.user.clone(),
                    value,
                })
            })?,
            (Request::Allowances(query), _) => {
                Env::run(store, |e| to_payload(&Token::allowances(e, &query.user)?))?
            }
            (Request::Transfer(args), Some(caller)) => Env::run(store, |e| {
                Token::transfer(e, &caller, &args.to, args.value).map(|()| None)
            })?,
            (Request::Approve(args), Some(caller)) => Env::run(store, |e| {
                Token::approve(e, &caller, &args.spender, args.value).map(|()| None)
            })?,
            (Request::TransferFrom(args), Some(caller)) => Env::run(store, |e| {
                Token::transfer_from(e, &caller, &args.from, &args.to, args.value).map(|()| None)
            })?,
            (_, None) => {
                return Err(LedgerError::Identity(format!(
                    "{function} requires a caller"
                )))
            }
        };

        tracing::debug!(function, events = events.len(), "invocation committed");
        Ok(Invocation { payload, events })
    }

    /// Decode and run a request given in the wire shape.
    pub fn invoke_json(
        &self,
        store: &mut dyn KeyedStore,
        credential: &[u8],
        function: &str,
        args: &[u8],
    ) -> LedgerResult<Invocation> {
        let request = Request::decode(function, args)?;
        self.invoke(store, credential, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::identity::NameResolver;
    use crate::storage::MemoryStore;

    #[test]
    fn test_decode_known_functions() {
        assert_eq!(Request::decode("info", b"").unwrap(), Request::Info);

        let req = Request::decode("transfer", br#"{"to": "testUser2", "value": 100}"#).unwrap();
        assert_eq!(
            req,
            Request::Transfer(TransferArgs {
                to: Principal::new("testUser2").unwrap(),
                value: 100
            })
        );
        assert!(req.is_mutation());

        let req = Request::decode(
            "transferFrom",
            br#"{"from": "testUser", "to": "testUser3", "value": 1000}"#,
        )
        .unwrap();
        assert_eq!(req.function(), "transferFrom");
    }

    #[test]
    fn test_decode_rejects_unknown_function() {
        let err = Request::decode("mint", b"{}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedRequest);
        assert!(err.to_string().contains("Incorrect function name: mint"));
    }

    #[test]
    fn test_decode_rejects_bad_args() {
        let cases: [(&str, &[u8]); 4] = [
            ("transfer", br#"{"to": "x"}"#),
            ("transfer", br#"{"to": "x", "value": -1}"#),
            ("approve", b"not json"),
            ("balance", br#"{"user": ""}"#),
        ];
        for (function, args) in cases {
            let err = Request::decode(function, args).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedRequest, "{function} {args:?}");
        }
    }

    #[test]
    fn test_queries_do_not_need_a_credential() {
        let dispatcher = Dispatcher::new(NameResolver);
        let mut store = MemoryStore::new();

        let out = dispatcher
            .invoke_json(&mut store, b"", "balance", br#"{"user": "nobody"}"#)
            .unwrap();
        assert_eq!(
            out.payload,
            Some(serde_json::json!({"user": "nobody", "value": 0}))
        );
        assert!(out.events.is_empty());
    }

    #[test]
    fn test_mutation_with_bad_credential_fails_before_state() {
        let dispatcher = Dispatcher::new(NameResolver);
        let mut store = MemoryStore::new();

        let err = dispatcher
            .invoke_json(&mut store, b"", "approve", br#"{"spender": "s", "value": 1}"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IdentityError);
        assert!(store.is_empty());
    }
}
