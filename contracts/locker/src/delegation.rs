use cosmwasm_std::{Addr, Order, StdResult, Storage, Uint128};
use cw_storage_plus::Bound;

use yield_governance::locker::{Checkpoint, LockedBalance};
use yield_governance::utils::{get_epoch_start, get_next_epoch_start};

use crate::error::ContractError;
use crate::state::{CHECKPOINTS, DELEGATEE_UNLOCKS};

/// Sum of `delegatee` votes expiring within the (`from`, `to`] time range.
pub(crate) fn unlocks_between(
    storage: &dyn Storage,
    delegatee: &Addr,
    from: u64,
    to: u64,
) -> StdResult<Uint128> {
    if to <= from {
        return Ok(Uint128::zero());
    }

    DELEGATEE_UNLOCKS
        .prefix(delegatee)
        .range(
            storage,
            Some(Bound::exclusive(from)),
            Some(Bound::inclusive(to)),
            Order::Ascending,
        )
        .try_fold(Uint128::zero(), |acc, item| {
            let (_, amount) = item?;
            Ok(acc.checked_add(amount)?)
        })
}

/// Records `delegatee` votes for the upcoming epoch.
/// A checkpoint already written for the upcoming epoch is adjusted in place. Otherwise a new one
/// is appended, carrying over the previous votes minus everything that expired in between.
pub(crate) fn checkpoint_delegate(
    storage: &mut dyn Storage,
    delegatee: &Addr,
    now: u64,
    addition: Uint128,
    deduction: Uint128,
) -> Result<(), ContractError> {
    let upcoming_epoch = get_next_epoch_start(now);
    let mut checkpoints = CHECKPOINTS
        .may_load(storage, delegatee)?
        .unwrap_or_default();

    let votes = match checkpoints.last() {
        Some(last) if last.epoch_start == upcoming_epoch => {
            let votes = last.votes.checked_add(addition)?.checked_sub(deduction)?;
            checkpoints.pop();
            votes
        }
        Some(last) => {
            let unlocks = unlocks_between(storage, delegatee, last.epoch_start, upcoming_epoch)?;
            last.votes
                .checked_sub(unlocks)?
                .checked_add(addition)?
                .checked_sub(deduction)?
        }
        None if addition.is_zero() => return Ok(()),
        None => addition.checked_sub(deduction)?,
    };

    checkpoints.push(Checkpoint {
        epoch_start: upcoming_epoch,
        votes,
    });
    CHECKPOINTS.save(storage, delegatee, &checkpoints)?;

    Ok(())
}

/// Votes of `delegatee` at the epoch containing `timestamp`.
/// Binary search finds the latest checkpoint at or before the epoch, then votes expired since
/// that checkpoint are deducted.
pub(crate) fn votes_at(
    storage: &dyn Storage,
    delegatee: &Addr,
    timestamp: u64,
) -> StdResult<Uint128> {
    let epoch_start = get_epoch_start(timestamp);
    let checkpoints = CHECKPOINTS
        .may_load(storage, delegatee)?
        .unwrap_or_default();

    let idx = checkpoints.partition_point(|checkpoint| checkpoint.epoch_start <= epoch_start);
    if idx == 0 {
        return Ok(Uint128::zero());
    }

    let checkpoint = &checkpoints[idx - 1];
    let unlocks = unlocks_between(storage, delegatee, checkpoint.epoch_start, epoch_start)?;

    Ok(checkpoint.votes.checked_sub(unlocks)?)
}

pub(crate) fn add_delegatee_unlock(
    storage: &mut dyn Storage,
    delegatee: &Addr,
    unlock_time: u64,
    amount: Uint128,
) -> Result<(), ContractError> {
    DELEGATEE_UNLOCKS.update(
        storage,
        (delegatee, unlock_time),
        |unlocks| -> Result<_, ContractError> {
            Ok(unlocks.unwrap_or_default().checked_add(amount)?)
        },
    )?;

    Ok(())
}

pub(crate) fn sub_delegatee_unlock(
    storage: &mut dyn Storage,
    delegatee: &Addr,
    unlock_time: u64,
    amount: Uint128,
) -> Result<(), ContractError> {
    let unlocks = DELEGATEE_UNLOCKS
        .load(storage, (delegatee, unlock_time))?
        .checked_sub(amount)?;
    if unlocks.is_zero() {
        DELEGATEE_UNLOCKS.remove(storage, (delegatee, unlock_time));
    } else {
        DELEGATEE_UNLOCKS.save(storage, (delegatee, unlock_time), &unlocks)?;
    }

    Ok(())
}

/// Moves voting power of the locks which outlive the current epoch from `old_delegatee` to
/// `new_delegatee`. Votes change hands at the next epoch boundary.
/// Returns the moved amount.
pub(crate) fn move_delegated_votes(
    storage: &mut dyn Storage,
    locks: &[LockedBalance],
    old_delegatee: Option<&Addr>,
    new_delegatee: &Addr,
    now: u64,
) -> Result<Uint128, ContractError> {
    let upcoming_epoch = get_next_epoch_start(now);
    let mut moved = Uint128::zero();

    for lock in locks
        .iter()
        .rev()
        .take_while(|lock| lock.unlock_time > upcoming_epoch)
    {
        moved = moved.checked_add(lock.amount)?;
        if let Some(old_delegatee) = old_delegatee {
            sub_delegatee_unlock(storage, old_delegatee, lock.unlock_time, lock.amount)?;
        }
        add_delegatee_unlock(storage, new_delegatee, lock.unlock_time, lock.amount)?;
    }

    if let Some(old_delegatee) = old_delegatee {
        checkpoint_delegate(storage, old_delegatee, now, Uint128::zero(), moved)?;
    }
    checkpoint_delegate(storage, new_delegatee, now, moved, Uint128::zero())?;

    Ok(moved)
}

/// Drops votes of locks withdrawn before their unlock time.
/// Locks which expire at the next epoch boundary are already scheduled to drop off.
pub(crate) fn withdraw_delegated_votes<'a>(
    storage: &mut dyn Storage,
    delegatee: &Addr,
    locks: impl IntoIterator<Item = &'a LockedBalance>,
    now: u64,
) -> Result<(), ContractError> {
    let upcoming_epoch = get_next_epoch_start(now);
    let mut withdrawn = Uint128::zero();

    for lock in locks
        .into_iter()
        .filter(|lock| lock.unlock_time > upcoming_epoch)
    {
        withdrawn = withdrawn.checked_add(lock.amount)?;
        sub_delegatee_unlock(storage, delegatee, lock.unlock_time, lock.amount)?;
    }

    checkpoint_delegate(storage, delegatee, now, Uint128::zero(), withdrawn)
}
