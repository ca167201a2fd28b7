use crate::env::Env;
use crate::errors::{LedgerError, LedgerResult};
use crate::storage::StoreError;
use crate::storage_types::DataKey;
use serde::{Deserialize, Serialize};

/// Token description written once at issuance.
///
/// Stored as JSON so external tooling can read it straight from the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    #[serde(default)]
    pub standard: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u16,
    pub total_supply: u64,
}

pub fn has_metadata(e: &Env) -> LedgerResult<bool> {
    Ok(e.get(&DataKey::Token.to_key())?.is_some())
}

pub fn read_metadata(e: &Env) -> LedgerResult<TokenMetadata> {
    let key = DataKey::Token.to_key();
    let data = e.get(&key)?.ok_or(LedgerError::NotInitialized)?;
    serde_json::from_slice(&data).map_err(|err| {
        LedgerError::StoreIo(StoreError::Corrupt {
            key: String::from_utf8_lossy(&key).into_owned(),
            details: err.to_string(),
        })
    })
}

pub fn write_metadata(e: &mut Env, metadata: &TokenMetadata) -> LedgerResult<()> {
    let data = serde_json::to_vec(metadata)
        .map_err(|err| LedgerError::MalformedRequest(format!("unencodable metadata: {err}")))?;
    e.set(DataKey::Token.to_key(), data);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyedStore, MemoryStore};

    fn fabric_token() -> TokenMetadata {
        TokenMetadata {
            standard: "ERC-20".to_string(),
            name: "FabricToken".to_string(),
            symbol: "FT".to_string(),
            decimals: 2,
            total_supply: 10_000,
        }
    }

    #[test]
    fn test_read_before_issue_is_not_initialized() {
        let mut store = MemoryStore::new();
        let e = Env::new(&mut store);
        assert_eq!(read_metadata(&e).unwrap_err(), LedgerError::NotInitialized);
        assert!(!has_metadata(&e).unwrap());
    }

    #[test]
    fn test_metadata_is_stored_as_json() {
        let mut store = MemoryStore::new();
        Env::run(&mut store, |e| write_metadata(e, &fabric_token())).unwrap();

        let raw = store.get(b"__token").unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(json["totalSupply"], 10_000);
        assert_eq!(json["symbol"], "FT");

        let e = Env::new(&mut store);
        assert_eq!(read_metadata(&e).unwrap(), fabric_token());
    }

    #[test]
    fn test_standard_is_optional_on_input() {
        let token: TokenMetadata = serde_json::from_str(
            r#"{"name":"FabricToken","symbol":"FT","decimals":2,"totalSupply":10000}"#,
        )
        .unwrap();
        assert_eq!(token.standard, "");
        assert_eq!(token.total_supply, 10_000);
    }
}
