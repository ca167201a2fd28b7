//! Accounting core of a fungible token ledger.
//!
//! Balances and allowances live in a host-provided [`KeyedStore`]; every
//! operation runs inside an [`Env`] that stages its writes and commits them as
//! one batch.

mod allowance;
mod balance;
mod contract;
mod dispatch;
mod env;
mod errors;
mod events;
mod identity;
mod metadata;
mod storage;
mod storage_types;

#[cfg(test)]
mod fuzz_test;

pub use crate::allowance::{
    iter_allowances, read_allowance, read_allowances, write_allowance, Allowance, Allowances,
};
pub use crate::balance::{read_balance, write_balance};
pub use crate::contract::{Token, TokenTrait};
pub use crate::dispatch::{
    ApproveArgs, BalanceQuery, BalanceReply, Dispatcher, Invocation, Request, TransferArgs,
    TransferFromArgs,
};
pub use crate::env::Env;
pub use crate::errors::{ErrorKind, LedgerError, LedgerResult};
pub use crate::events::{ApproveEvent, LedgerEvent, TransferEvent};
pub use crate::identity::{
    Claims, Ed25519KeyResolver, IdentityResolver, JwtResolver, NameResolver, Principal,
    X509CnResolver,
};
pub use crate::metadata::{has_metadata, read_metadata, write_metadata, TokenMetadata};
pub use crate::storage::{Entry, KeyedStore, MemoryStore, ScanIter, StoreError, StoreResult};
pub use crate::storage_types::{DataKey, INDEX_ALLOWANCE, INDEX_BALANCE, KEY_TOKEN};
