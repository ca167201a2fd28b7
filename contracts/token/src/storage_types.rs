use crate::errors::{LedgerError, LedgerResult};
use crate::identity::Principal;
use crate::storage::StoreError;

/// Simple key holding the token metadata record.
pub const KEY_TOKEN: &str = "__token";
/// Composite key namespace for balances.
pub const INDEX_BALANCE: &str = "cn~balance";
/// Composite key namespace for allowances, ordered `(owner, spender)`.
pub const INDEX_ALLOWANCE: &str = "cn~allowance";

const DELIMITER: u8 = 0x00;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllowanceDataKey {
    pub from: Principal,
    pub spender: Principal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataKey {
    Token,
    Balance(Principal),
    Allowance(AllowanceDataKey),
}

impl DataKey {
    /// Encode into a store key.
    pub fn to_key(&self) -> Vec<u8> {
        match self {
            DataKey::Token => KEY_TOKEN.as_bytes().to_vec(),
            DataKey::Balance(addr) => composite_key(INDEX_BALANCE, &[addr.as_str()]),
            DataKey::Allowance(AllowanceDataKey { from, spender }) => {
                composite_key(INDEX_ALLOWANCE, &[from.as_str(), spender.as_str()])
            }
        }
    }
}

/// `0x00 namespace 0x00 (component 0x00)*`
///
/// Components come from [`Principal`], which never contains `0x00`, so the
/// encoding is unambiguous.
pub fn composite_key(namespace: &str, components: &[&str]) -> Vec<u8> {
    let len = 2 + namespace.len() + components.iter().map(|c| c.len() + 1).sum::<usize>();
    let mut key = Vec::with_capacity(len);
    key.push(DELIMITER);
    key.extend_from_slice(namespace.as_bytes());
    key.push(DELIMITER);
    for component in components {
        key.extend_from_slice(component.as_bytes());
        key.push(DELIMITER);
    }
    key
}

/// Scan prefix covering every allowance granted by `owner`.
///
/// The trailing delimiter keeps owner `ab` from matching records of owner `abc`.
pub fn allowance_prefix(owner: &Principal) -> Vec<u8> {
    composite_key(INDEX_ALLOWANCE, &[owner.as_str()])
}

/// Split a composite key into its namespace and components.
pub fn split_composite_key(key: &[u8]) -> LedgerResult<(String, Vec<String>)> {
    let malformed = |details: &str| {
        LedgerError::StoreIteration(StoreError::Corrupt {
            key: String::from_utf8_lossy(key).into_owned(),
            details: details.to_string(),
        })
    };

    let body = key
        .strip_prefix(&[DELIMITER])
        .and_then(|rest| rest.strip_suffix(&[DELIMITER]))
        .ok_or_else(|| malformed("not a composite key"))?;

    let mut parts = body.split(|b| *b == DELIMITER).map(|part| {
        std::str::from_utf8(part)
            .map(str::to_string)
            .map_err(|_| malformed("component is not valid UTF-8"))
    });

    let namespace = parts.next().ok_or_else(|| malformed("missing namespace"))??;
    let components = parts.collect::<LedgerResult<Vec<_>>>()?;
    Ok((namespace, components))
}

// ── Value codec ───────────────────────────────────────────────────────────────

/// Balances and allowances are stored as 8-byte little-endian integers.
pub fn encode_amount(value: u64) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

pub fn decode_amount(key: &[u8], data: &[u8]) -> Result<u64, StoreError> {
    let bytes = <[u8; 8]>::try_from(data).map_err(|_| StoreError::Corrupt {
        key: String::from_utf8_lossy(key).into_owned(),
        details: format!("expected 8 bytes, found {}", data.len()),
    })?;
    Ok(u64::from_le_bytes(bytes))
}
