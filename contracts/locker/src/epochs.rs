use cosmwasm_std::{Order, StdResult, Storage, Uint128};
use cw_storage_plus::Bound;

use yield_governance::utils::get_epoch;

use crate::error::ContractError;
use crate::state::{EPOCHS, LAST_EPOCH, SUPPLY_UNLOCKS};

/// Catches the supply index up with the epoch containing `now`.
/// Must run before any state change so every epoch boundary crossed since the last
/// interaction gets its snapshot.
pub(crate) fn advance_to(storage: &mut dyn Storage, now: u64) -> Result<u64, ContractError> {
    checkpoint_epoch(storage, get_epoch(now))
}

/// Writes forward-filled snapshots for every epoch after the last recorded one up to `epoch`
/// inclusive. Scheduled unlocks are deducted while filling.
/// Returns the number of snapshots written.
pub(crate) fn checkpoint_epoch(
    storage: &mut dyn Storage,
    epoch: u64,
) -> Result<u64, ContractError> {
    let last_epoch = LAST_EPOCH.load(storage)?;
    if last_epoch >= epoch {
        return Ok(0);
    }

    let mut supply = EPOCHS.load(storage, last_epoch)?;
    for next_epoch in last_epoch + 1..=epoch {
        let unlocking = SUPPLY_UNLOCKS
            .may_load(storage, next_epoch)?
            .unwrap_or_default();
        supply = supply.checked_sub(unlocking)?;
        EPOCHS.save(storage, next_epoch, &supply)?;
    }
    LAST_EPOCH.save(storage, &epoch)?;

    Ok(epoch - last_epoch)
}

/// Adds `amount` to the voting supply starting from the epoch after `epoch`
/// and schedules its removal at `unlock_epoch`.
pub(crate) fn add_upcoming_supply(
    storage: &mut dyn Storage,
    epoch: u64,
    amount: Uint128,
    unlock_epoch: u64,
) -> Result<(), ContractError> {
    let upcoming_epoch = epoch + 1;
    checkpoint_epoch(storage, upcoming_epoch)?;

    EPOCHS.update(storage, upcoming_epoch, |supply| -> Result<_, ContractError> {
        Ok(supply.unwrap_or_default().checked_add(amount)?)
    })?;
    SUPPLY_UNLOCKS.update(storage, unlock_epoch, |unlocks| -> Result<_, ContractError> {
        Ok(unlocks.unwrap_or_default().checked_add(amount)?)
    })?;

    Ok(())
}

/// Removes `amount` from the voting supply starting from the epoch after `epoch`
/// and cancels its scheduled removal at `unlock_epoch`.
/// Amounts which leave the supply at the next epoch anyway are left untouched.
pub(crate) fn remove_upcoming_supply(
    storage: &mut dyn Storage,
    epoch: u64,
    amount: Uint128,
    unlock_epoch: u64,
) -> Result<(), ContractError> {
    let upcoming_epoch = epoch + 1;
    if unlock_epoch <= upcoming_epoch {
        return Ok(());
    }
    checkpoint_epoch(storage, upcoming_epoch)?;

    let supply = EPOCHS.load(storage, upcoming_epoch)?.checked_sub(amount)?;
    EPOCHS.save(storage, upcoming_epoch, &supply)?;

    let unlocks = SUPPLY_UNLOCKS
        .load(storage, unlock_epoch)?
        .checked_sub(amount)?;
    if unlocks.is_zero() {
        SUPPLY_UNLOCKS.remove(storage, unlock_epoch);
    } else {
        SUPPLY_UNLOCKS.save(storage, unlock_epoch, &unlocks)?;
    }

    Ok(())
}

/// Returns the voting supply effective at `epoch`.
/// Epochs which are not materialized yet are derived from the latest snapshot and the unlock
/// schedule. Epochs before the contract genesis report zero.
pub(crate) fn supply_at_epoch(storage: &dyn Storage, epoch: u64) -> StdResult<Uint128> {
    let last_epoch = LAST_EPOCH.load(storage)?;
    if epoch <= last_epoch {
        return Ok(EPOCHS.may_load(storage, epoch)?.unwrap_or_default());
    }

    let supply = EPOCHS.load(storage, last_epoch)?;
    let unlocking = SUPPLY_UNLOCKS
        .range(
            storage,
            Some(Bound::exclusive(last_epoch)),
            Some(Bound::inclusive(epoch)),
            Order::Ascending,
        )
        .try_fold(Uint128::zero(), |acc, item| -> StdResult<_> {
            let (_, amount) = item?;
            Ok(acc.checked_add(amount)?)
        })?;

    Ok(supply.checked_sub(unlocking)?)
}
