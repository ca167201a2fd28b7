use crate::identity::Principal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub from: Principal,
    pub to: Principal,
    pub value: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveEvent {
    pub owner: Principal,
    pub spender: Principal,
    pub value: u64,
}

/// Events emitted by successful operations, delivered to the host on commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerEvent {
    Transfer(TransferEvent),
    Approve(ApproveEvent),
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::Transfer(_) => "Transfer",
            LedgerEvent::Approve(_) => "Approve",
        }
    }

    pub fn payload(&self) -> serde_json::Value {
        // Both payloads are plain structs of strings and integers.
        let value = match self {
            LedgerEvent::Transfer(event) => serde_json::to_value(event),
            LedgerEvent::Approve(event) => serde_json::to_value(event),
        };
        value.unwrap_or(serde_json::Value::Null)
    }
}
