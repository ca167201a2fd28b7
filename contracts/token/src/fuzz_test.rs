use crate::contract::{Token, TokenTrait};
use crate::env::Env;
use crate::errors::{ErrorKind, LedgerResult};
use crate::identity::Principal;
use crate::metadata::TokenMetadata;
use crate::storage::MemoryStore;
use proptest::prelude::*;

const SUPPLY: u64 = 10_000;
const NAMES: [&str; 4] = ["A", "B", "C", "D"];

#[derive(Debug, Clone)]
enum Op {
    Transfer { from: usize, to: usize, value: u64 },
    Approve { owner: usize, spender: usize, value: u64 },
    TransferFrom { spender: usize, from: usize, to: usize, value: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let who = 0..NAMES.len();
    prop_oneof![
        (who.clone(), who.clone(), 0..3_000u64)
            .prop_map(|(from, to, value)| Op::Transfer { from, to, value }),
        (who.clone(), who.clone(), 0..3_000u64)
            .prop_map(|(owner, spender, value)| Op::Approve { owner, spender, value }),
        (who.clone(), who.clone(), who, 0..3_000u64).prop_map(|(spender, from, to, value)| {
            Op::TransferFrom { spender, from, to, value }
        }),
    ]
}

fn p(index: usize) -> Principal {
    Principal::new(NAMES[index]).unwrap()
}

fn issued_store(supply: u64) -> MemoryStore {
    let mut store = MemoryStore::new();
    let metadata = TokenMetadata {
        standard: String::new(),
        name: "Fuzz".to_string(),
        symbol: "FZ".to_string(),
        decimals: 0,
        total_supply: supply,
    };
    Env::run(&mut store, |e| Token::initialize(e, &p(0), metadata)).unwrap();
    store
}

fn balances(store: &mut MemoryStore) -> Vec<u64> {
    let e = Env::new(store);
    (0..NAMES.len())
        .map(|i| Token::balance(&e, &p(i)).unwrap())
        .collect()
}

fn allowance(store: &mut MemoryStore, owner: usize, spender: usize) -> u64 {
    let e = Env::new(store);
    Token::allowance(&e, &p(owner), &p(spender)).unwrap()
}

fn apply(store: &mut MemoryStore, op: &Op) -> LedgerResult<()> {
    let result = match *op {
        Op::Transfer { from, to, value } => {
            Env::run(store, |e| Token::transfer(e, &p(from), &p(to), value))
        }
        Op::Approve { owner, spender, value } => {
            Env::run(store, |e| Token::approve(e, &p(owner), &p(spender), value))
        }
        Op::TransferFrom { spender, from, to, value } => {
            Env::run(store, |e| Token::transfer_from(e, &p(spender), &p(from), &p(to), value))
        }
    };
    result.map(|((), _events)| ())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn test_supply_is_conserved(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut store = issued_store(SUPPLY);

        for op in &ops {
            let before = balances(&mut store);
            let result = apply(&mut store, op);
            let after = balances(&mut store);

            match (op, &result) {
                (Op::Transfer { from, to, value }, Ok(()))
                | (Op::TransferFrom { from, to, value, .. }, Ok(())) if from != to => {
                    prop_assert_eq!(after[*from] + value, before[*from]);
                    prop_assert_eq!(after[*to] - value, before[*to]);
                }
                (Op::Approve { .. }, _) | (_, Ok(())) => {
                    prop_assert_eq!(&before, &after);
                }
                (_, Err(_)) => {
                    // Rejected operations leave every balance untouched.
                    prop_assert_eq!(&before, &after);
                }
            }
            prop_assert_eq!(after.iter().sum::<u64>(), SUPPLY);
        }
    }

    #[test]
    fn test_self_transfer_never_changes_state(
        value in any::<u64>(),
        approved in 0..1_000u64,
        holder in 0..NAMES.len(),
        spender in 0..NAMES.len(),
    ) {
        let mut store = issued_store(SUPPLY);
        apply(&mut store, &Op::Transfer { from: 0, to: holder, value: 1_234 }).unwrap();
        apply(&mut store, &Op::Approve { owner: holder, spender, value: approved }).unwrap();

        let before = balances(&mut store);
        let store_len = store.len();

        let moved = apply(&mut store, &Op::Transfer { from: holder, to: holder, value });
        prop_assert!(moved.is_ok());
        let delegated = apply(&mut store, &Op::TransferFrom { spender, from: holder, to: holder, value });
        prop_assert!(delegated.is_ok());

        prop_assert_eq!(balances(&mut store), before);
        prop_assert_eq!(allowance(&mut store, holder, spender), approved);
        prop_assert_eq!(store.len(), store_len);
    }

    #[test]
    fn test_approve_overwrites(v1 in any::<u64>(), v2 in any::<u64>()) {
        let mut store = issued_store(SUPPLY);
        apply(&mut store, &Op::Approve { owner: 0, spender: 1, value: v1 }).unwrap();
        apply(&mut store, &Op::Approve { owner: 0, spender: 1, value: v2 }).unwrap();
        prop_assert_eq!(allowance(&mut store, 0, 1), v2);
    }

    #[test]
    fn test_balance_check_precedes_allowance_check(
        held in 0..1_000u64,
        extra in 1..1_000u64,
        approved in 0..1_000u64,
    ) {
        let value = held + extra;
        let mut store = issued_store(held);
        apply(&mut store, &Op::Approve { owner: 0, spender: 1, value: approved.min(value - 1) }).unwrap();

        let err = apply(&mut store, &Op::TransferFrom { spender: 1, from: 0, to: 2, value }).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
    }

    #[test]
    fn test_transfer_from_decrements_allowance(
        approved in 0..5_000u64,
        value in 0..5_000u64,
    ) {
        let mut store = issued_store(SUPPLY);
        apply(&mut store, &Op::Approve { owner: 0, spender: 1, value: approved }).unwrap();

        let result = apply(&mut store, &Op::TransferFrom { spender: 1, from: 0, to: 2, value });
        if value <= approved && value <= SUPPLY {
            prop_assert!(result.is_ok());
            prop_assert_eq!(allowance(&mut store, 0, 1), approved - value);
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(allowance(&mut store, 0, 1), approved);
        }
    }
}
