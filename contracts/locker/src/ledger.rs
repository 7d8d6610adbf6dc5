use cosmwasm_std::{Addr, StdResult, Storage, Uint128};

use yield_governance::locker::{
    Config, LockedBalance, LockedBalancesResponse, LOCK_DURATION, LOCK_DURATION_EPOCHS,
};
use yield_governance::utils::{get_epoch, get_epoch_start, get_next_epoch_start, EPOCH_LENGTH};

use crate::delegation::{add_delegatee_unlock, checkpoint_delegate, withdraw_delegated_votes};
use crate::epochs::{add_upcoming_supply, remove_upcoming_supply};
use crate::error::ContractError;
use crate::state::{BALANCES, DELEGATES, LOCKED_SUPPLY, USER_LOCKS};

/// Defines which locks are released from an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Release {
    /// Locks withdrawn or relocked by their owner.
    /// After shutdown every remaining lock is released.
    Expired { relock: bool },
    /// Neglected locks processed by a third party once the grace period is over.
    Kick,
    /// Everything at once. Only available after shutdown.
    Emergency,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Released {
    /// Total principal released from the ledger
    pub amount: Uint128,
    /// Part of `amount` owed to the kicker
    pub kick_reward: Uint128,
}

/// Locks `amount` for `account` until the end of the lock duration counted from the current
/// epoch start. Returns the unlock time of the lock.
pub(crate) fn lock_tokens(
    storage: &mut dyn Storage,
    config: &Config,
    account: &Addr,
    amount: Uint128,
    now: u64,
) -> Result<u64, ContractError> {
    if amount.is_zero() {
        return Err(ContractError::ZeroAmount {});
    }
    if config.is_shutdown {
        return Err(ContractError::SystemShutdown {});
    }

    let unlock_time = get_epoch_start(now) + LOCK_DURATION;

    let mut balance = BALANCES.may_load(storage, account)?.unwrap_or_default();
    balance.locked = balance.locked.checked_add(amount)?;
    BALANCES.save(storage, account, &balance)?;

    LOCKED_SUPPLY.update(storage, |supply| -> Result<_, ContractError> {
        Ok(supply.checked_add(amount)?)
    })?;

    let mut locks = USER_LOCKS.may_load(storage, account)?.unwrap_or_default();
    match locks.last_mut() {
        Some(last) if last.unlock_time == unlock_time => {
            last.amount = last.amount.checked_add(amount)?;
        }
        _ => locks.push(LockedBalance {
            amount,
            unlock_time,
        }),
    }
    USER_LOCKS.save(storage, account, &locks)?;

    if let Some(delegatee) = DELEGATES.may_load(storage, account)? {
        add_delegatee_unlock(storage, &delegatee, unlock_time, amount)?;
        checkpoint_delegate(storage, &delegatee, now, amount, Uint128::zero())?;
    }

    add_upcoming_supply(storage, get_epoch(now), amount, get_epoch(unlock_time))?;

    Ok(unlock_time)
}

/// Releases the account's locks selected by `release` starting from the oldest unprocessed
/// one. Locks which are still running at the next epoch boundary are withdrawn early:
/// they leave the upcoming supply and the delegatee's votes, and the account is marked as
/// exited.
pub(crate) fn release_locks(
    storage: &mut dyn Storage,
    config: &Config,
    account: &Addr,
    now: u64,
    release: Release,
) -> Result<Released, ContractError> {
    let mut balance = BALANCES.may_load(storage, account)?.unwrap_or_default();
    if release == Release::Emergency && balance.locked.is_zero() {
        return Err(ContractError::NothingLocked {});
    }

    let expiry_limit = match release {
        Release::Expired { .. } if config.is_shutdown => u64::MAX,
        Release::Expired { relock: true } => now + EPOCH_LENGTH,
        Release::Expired { relock: false } => now,
        Release::Kick => now.saturating_sub(config.kick_reward_epoch_delay * EPOCH_LENGTH),
        Release::Emergency => u64::MAX,
    };

    let locks = USER_LOCKS.may_load(storage, account)?.unwrap_or_default();
    let first = (balance.next_unlock_index as usize).min(locks.len());
    let processed = locks[first..]
        .iter()
        .take_while(|lock| lock.unlock_time <= expiry_limit)
        .collect::<Vec<_>>();

    if processed.is_empty() {
        return Err(ContractError::NoExpiredLocks {});
    }

    let epoch_start = get_epoch_start(now);
    let mut released = Released::default();
    for lock in &processed {
        released.amount = released.amount.checked_add(lock.amount)?;

        if release == Release::Kick {
            let elapsed = epoch_start.saturating_sub(lock.unlock_time) / EPOCH_LENGTH;
            let incentive = config
                .kick_reward_per_epoch
                .checked_mul(elapsed.into())?
                .min(lock.amount);
            released.kick_reward = released.kick_reward.checked_add(incentive)?;
        }
    }

    let upcoming_epoch = get_next_epoch_start(now);
    let early = processed
        .iter()
        .copied()
        .filter(|lock| lock.unlock_time > upcoming_epoch)
        .collect::<Vec<_>>();

    let delegatee = DELEGATES.may_load(storage, account)?;
    if !early.is_empty() {
        let epoch = get_epoch(now);
        for lock in &early {
            remove_upcoming_supply(storage, epoch, lock.amount, get_epoch(lock.unlock_time))?;
        }
        if let Some(delegatee) = &delegatee {
            withdraw_delegated_votes(storage, delegatee, early.iter().copied(), now)?;
        }
        balance.exited_at = Some(epoch);
    } else if let Some(delegatee) = &delegatee {
        checkpoint_delegate(storage, delegatee, now, Uint128::zero(), Uint128::zero())?;
    }

    balance.locked = balance.locked.checked_sub(released.amount)?;
    balance.next_unlock_index = (first + processed.len()) as u32;
    BALANCES.save(storage, account, &balance)?;

    LOCKED_SUPPLY.update(storage, |supply| -> Result<_, ContractError> {
        Ok(supply.checked_sub(released.amount)?)
    })?;

    Ok(released)
}

/// Voting weight of `account` at `epoch`.
/// A lock counts in every epoch after the one it was created in, up to the epoch before it
/// unlocks.
pub(crate) fn balance_at_epoch(
    storage: &dyn Storage,
    account: &Addr,
    epoch: u64,
) -> StdResult<Uint128> {
    let balance = BALANCES.may_load(storage, account)?.unwrap_or_default();
    if matches!(balance.exited_at, Some(exited_at) if epoch > exited_at) {
        return Ok(Uint128::zero());
    }

    let locks = USER_LOCKS.may_load(storage, account)?.unwrap_or_default();
    let mut weight = Uint128::zero();
    for lock in locks.iter().rev() {
        let unlock_epoch = get_epoch(lock.unlock_time);
        if unlock_epoch <= epoch {
            break;
        }
        if unlock_epoch - LOCK_DURATION_EPOCHS < epoch {
            weight = weight.checked_add(lock.amount)?;
        }
    }

    Ok(weight)
}

/// Splits unprocessed locks into the unlockable and still locked parts.
pub(crate) fn locked_balances(
    storage: &dyn Storage,
    account: &Addr,
    now: u64,
) -> StdResult<LockedBalancesResponse> {
    let balance = BALANCES.may_load(storage, account)?.unwrap_or_default();
    let locks = USER_LOCKS.may_load(storage, account)?.unwrap_or_default();

    let mut response = LockedBalancesResponse {
        total: balance.locked,
        unlockable: Uint128::zero(),
        locked: Uint128::zero(),
        locks: vec![],
    };
    for lock in locks.into_iter().skip(balance.next_unlock_index as usize) {
        if lock.unlock_time > now {
            response.locked = response.locked.checked_add(lock.amount)?;
            response.locks.push(lock);
        } else {
            response.unlockable = response.unlockable.checked_add(lock.amount)?;
        }
    }

    Ok(response)
}
