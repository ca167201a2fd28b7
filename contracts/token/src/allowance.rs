use crate::env::Env;
use crate::errors::{LedgerError, LedgerResult};
use crate::identity::Principal;
use crate::storage::{ScanIter, StoreError};
use crate::storage_types::{
    allowance_prefix, decode_amount, encode_amount, split_composite_key, AllowanceDataKey,
    DataKey, INDEX_ALLOWANCE,
};
use serde::{Deserialize, Serialize};

/// One entry of an owner's allowance list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allowance {
    pub spender: Principal,
    pub value: u64,
}

pub fn read_allowance(e: &Env, from: &Principal, spender: &Principal) -> LedgerResult<u64> {
    let key = DataKey::Allowance(AllowanceDataKey {
        from: from.clone(),
        spender: spender.clone(),
    })
    .to_key();
    match e.get(&key)? {
        Some(data) => Ok(decode_amount(&key, &data)?),
        None => Ok(0),
    }
}

/// Replaces whatever `spender` was allowed before; approvals never accumulate.
pub fn write_allowance(e: &mut Env, from: &Principal, spender: &Principal, amount: u64) {
    let key = DataKey::Allowance(AllowanceDataKey {
        from: from.clone(),
        spender: spender.clone(),
    })
    .to_key();
    e.set(key, encode_amount(amount));
}

/// Lazy iterator over the allowances granted by one owner, in store key order.
///
/// Calling [`iter_allowances`] again restarts the enumeration from the
/// committed state.
pub struct Allowances<'a> {
    inner: ScanIter<'a>,
}

impl Iterator for Allowances<'_> {
    type Item = LedgerResult<Allowance>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.inner.next()?;
        Some(
            entry
                .map_err(LedgerError::StoreIteration)
                .and_then(|(key, value)| decode_entry(&key, &value)),
        )
    }
}

fn decode_entry(key: &[u8], value: &[u8]) -> LedgerResult<Allowance> {
    let (namespace, parts) = split_composite_key(key)?;
    if namespace != INDEX_ALLOWANCE || parts.len() != 2 {
        return Err(LedgerError::StoreIteration(StoreError::Corrupt {
            key: String::from_utf8_lossy(key).into_owned(),
            details: "not an allowance key".to_string(),
        }));
    }
    let spender = Principal::new(parts[1].clone()).map_err(|e| {
        LedgerError::StoreIteration(StoreError::Corrupt {
            key: String::from_utf8_lossy(key).into_owned(),
            details: e.to_string(),
        })
    })?;
    let value = decode_amount(key, value).map_err(LedgerError::StoreIteration)?;
    Ok(Allowance { spender, value })
}

pub fn iter_allowances<'e>(e: &'e Env, owner: &Principal) -> LedgerResult<Allowances<'e>> {
    let inner = e.scan(&allowance_prefix(owner))?;
    Ok(Allowances { inner })
}

/// Every allowance granted by `owner`, or the first failure. Partial results are
/// never returned. An owner with no approvals yields an empty list.
pub fn read_allowances(e: &Env, owner: &Principal) -> LedgerResult<Vec<Allowance>> {
    iter_allowances(e, owner)?.collect()
}
