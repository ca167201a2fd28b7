use crate::env::Env;
use crate::errors::LedgerResult;
use crate::identity::Principal;
use crate::storage_types::{decode_amount, encode_amount, DataKey};

/// Current holding of `addr`. A missing record is a zero balance.
pub fn read_balance(e: &Env, addr: &Principal) -> LedgerResult<u64> {
    let key = DataKey::Balance(addr.clone()).to_key();
    match e.get(&key)? {
        Some(data) => Ok(decode_amount(&key, &data)?),
        None => Ok(0),
    }
}

/// Unconditional overwrite. Conservation is the caller's job.
pub fn write_balance(e: &mut Env, addr: &Principal, amount: u64) {
    let key = DataKey::Balance(addr.clone()).to_key();
    e.set(key, encode_amount(amount));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::storage::{KeyedStore, MemoryStore};

    #[test]
    fn test_missing_balance_is_zero() {
        let mut store = MemoryStore::new();
        let e = Env::new(&mut store);
        assert_eq!(read_balance(&e, &Principal::new("nobody").unwrap()).unwrap(), 0);
    }

    #[test]
    fn test_write_then_read_after_commit() {
        let mut store = MemoryStore::new();
        let alice = Principal::new("alice").unwrap();

        Env::run(&mut store, |e| {
            write_balance(e, &alice, 42);
            Ok(())
        })
        .unwrap();

        let e = Env::new(&mut store);
        assert_eq!(read_balance(&e, &alice).unwrap(), 42);
    }

    #[test]
    fn test_zero_balance_stays_a_record() {
        let mut store = MemoryStore::new();
        let alice = Principal::new("alice").unwrap();
        Env::run(&mut store, |e| {
            write_balance(e, &alice, 0);
            Ok(())
        })
        .unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_corrupt_balance_is_store_io_error() {
        let mut store = MemoryStore::new();
        let alice = Principal::new("alice").unwrap();
        store
            .put(&DataKey::Balance(alice.clone()).to_key(), b"bad")
            .unwrap();

        let e = Env::new(&mut store);
        let err = read_balance(&e, &alice).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreIoError);
    }
}
