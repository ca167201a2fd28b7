use crate::allowance::{read_allowance, read_allowances, write_allowance, Allowance};
use crate::balance::{read_balance, write_balance};
use crate::env::Env;
use crate::errors::{LedgerError, LedgerResult};
use crate::events::{ApproveEvent, LedgerEvent, TransferEvent};
use crate::identity::Principal;
use crate::metadata::{read_metadata, write_metadata, TokenMetadata};

/// Token operations. Every mutating operation reads what it needs, validates,
/// and only then stages its writes, so a rejected call leaves no trace.
pub trait TokenTrait {
    fn initialize(e: &mut Env, issuer: &Principal, metadata: TokenMetadata) -> LedgerResult<()>;
    fn info(e: &Env) -> LedgerResult<TokenMetadata>;
    fn balance(e: &Env, id: &Principal) -> LedgerResult<u64>;
    fn allowance(e: &Env, from: &Principal, spender: &Principal) -> LedgerResult<u64>;
    fn allowances(e: &Env, owner: &Principal) -> LedgerResult<Vec<Allowance>>;
    fn approve(e: &mut Env, from: &Principal, spender: &Principal, amount: u64)
        -> LedgerResult<()>;
    fn transfer(e: &mut Env, from: &Principal, to: &Principal, amount: u64) -> LedgerResult<()>;
    fn transfer_from(
        e: &mut Env,
        spender: &Principal,
        from: &Principal,
        to: &Principal,
        amount: u64,
    ) -> LedgerResult<()>;
}

pub struct Token;

/// Debit/credit check shared by both transfer paths. Returns the new
/// `(from, to)` balances.
fn checked_move(from_balance: u64, to_balance: u64, amount: u64) -> LedgerResult<(u64, u64)> {
    if from_balance < amount {
        return Err(LedgerError::InsufficientBalance {
            have: from_balance,
            need: amount,
        });
    }
    let credited = to_balance
        .checked_add(amount)
        .ok_or(LedgerError::BalanceOverflow {
            balance: to_balance,
            value: amount,
        })?;
    Ok((from_balance - amount, credited))
}

impl TokenTrait for Token {
    /// Writes the metadata and credits the whole supply to `issuer`.
    ///
    /// Calling it twice overwrites the metadata; guarding against that is the
    /// host's responsibility.
    fn initialize(e: &mut Env, issuer: &Principal, metadata: TokenMetadata) -> LedgerResult<()> {
        write_metadata(e, &metadata)?;
        write_balance(e, issuer, metadata.total_supply);
        tracing::info!(
            issuer = %issuer,
            symbol = %metadata.symbol,
            total_supply = metadata.total_supply,
            "token issued"
        );
        Ok(())
    }

    fn info(e: &Env) -> LedgerResult<TokenMetadata> {
        read_metadata(e)
    }

    fn balance(e: &Env, id: &Principal) -> LedgerResult<u64> {
        read_balance(e, id)
    }

    fn allowance(e: &Env, from: &Principal, spender: &Principal) -> LedgerResult<u64> {
        read_allowance(e, from, spender)
    }

    fn allowances(e: &Env, owner: &Principal) -> LedgerResult<Vec<Allowance>> {
        read_allowances(e, owner)
    }

    fn approve(
        e: &mut Env,
        from: &Principal,
        spender: &Principal,
        amount: u64,
    ) -> LedgerResult<()> {
        write_allowance(e, from, spender, amount);
        tracing::debug!(owner = %from, spender = %spender, value = amount, "approve");
        e.publish(LedgerEvent::Approve(ApproveEvent {
            owner: from.clone(),
            spender: spender.clone(),
            value: amount,
        }));
        Ok(())
    }

    fn transfer(e: &mut Env, from: &Principal, to: &Principal, amount: u64) -> LedgerResult<()> {
        // Reads see committed state, so a self-transfer would credit the
        // pre-debit balance and mint tokens.
        if from == to {
            tracing::debug!(account = %from, value = amount, "self-transfer ignored");
            return Ok(());
        }

        let from_balance = read_balance(e, from)?;
        let to_balance = read_balance(e, to)?;
        let (new_from, new_to) = checked_move(from_balance, to_balance, amount).map_err(|err| {
            tracing::warn!(from = %from, to = %to, value = amount, error = %err, "transfer rejected");
            err
        })?;

        write_balance(e, from, new_from);
        write_balance(e, to, new_to);
        tracing::debug!(from = %from, to = %to, value = amount, "transfer");
        e.publish(LedgerEvent::Transfer(TransferEvent {
            from: from.clone(),
            to: to.clone(),
            value: amount,
        }));
        Ok(())
    }

    fn transfer_from(
        e: &mut Env,
        spender: &Principal,
        from: &Principal,
        to: &Principal,
        amount: u64,
    ) -> LedgerResult<()> {
        if from == to {
            tracing::debug!(account = %from, spender = %spender, value = amount, "self-transfer ignored");
            return Ok(());
        }

        let from_balance = read_balance(e, from)?;
        let to_balance = read_balance(e, to)?;
        let allowed = read_allowance(e, from, spender)?;

        // Balance checks come first: an under-funded owner reports
        // InsufficientBalance even when the allowance is also too small.
        let checked = checked_move(from_balance, to_balance, amount).and_then(|moved| {
            if amount > allowed {
                Err(LedgerError::AllowanceExceeded {
                    allowed,
                    need: amount,
                })
            } else {
                Ok(moved)
            }
        });
        let (new_from, new_to) = checked.map_err(|err| {
            tracing::warn!(
                spender = %spender,
                from = %from,
                to = %to,
                value = amount,
                error = %err,
                "transfer_from rejected"
            );
            err
        })?;

        write_balance(e, from, new_from);
        write_balance(e, to, new_to);
        write_allowance(e, from, spender, allowed - amount);
        tracing::debug!(spender = %spender, from = %from, to = %to, value = amount, "transfer_from");
        e.publish(LedgerEvent::Transfer(TransferEvent {
            from: from.clone(),
            to: to.clone(),
            value: amount,
        }));
        Ok(())
    }
}
