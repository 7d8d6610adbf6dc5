use cosmwasm_std::{Addr, StdResult, Storage, Uint128, Uint256};

use yield_governance::locker::{
    RewardData, UserData, MAX_REWARD_RATE, QUEUED_REWARDS_DENOMINATOR, QUEUED_REWARDS_RATIO,
    REWARD_PRECISION,
};
use yield_governance::utils::EPOCH_LENGTH;

use crate::error::ContractError;
use crate::state::{BALANCES, LOCKED_SUPPLY, REWARD_DATA, REWARD_TOKENS, USER_DATA};

/// Returns the last timestamp at which the stream was emitting rewards.
#[inline]
pub(crate) fn last_time_reward_applicable(reward: &RewardData, now: u64) -> u64 {
    now.min(reward.period_finish)
}

/// Calculates the reward per locked token accumulated up to `now`.
/// Nothing accrues while the locked supply is zero.
pub(crate) fn reward_per_token(
    reward: &RewardData,
    locked_supply: Uint128,
    now: u64,
) -> StdResult<Uint128> {
    if locked_supply.is_zero() {
        return Ok(reward.reward_per_token_stored);
    }

    let elapsed = last_time_reward_applicable(reward, now).saturating_sub(reward.last_update_time);
    let accrued = reward
        .reward_rate
        .full_mul(elapsed)
        .checked_mul(REWARD_PRECISION.into())?
        / Uint256::from(locked_supply);
    let accrued: Uint128 = accrued.try_into()?;

    Ok(reward.reward_per_token_stored.checked_add(accrued)?)
}

/// Calculates rewards earned by a position of `locked` tokens.
pub(crate) fn earned(
    locked: Uint128,
    reward_per_token: Uint128,
    user: &UserData,
) -> StdResult<Uint128> {
    let delta = reward_per_token.checked_sub(user.reward_per_token_paid)?;
    let pending: Uint128 = (locked.full_mul(delta) / Uint256::from(REWARD_PRECISION)).try_into()?;

    Ok(user.rewards.checked_add(pending)?)
}

/// Advances every reward stream up to `now`.
/// If `account` is set its pending rewards are settled against the updated accumulators.
/// Must run before the locked balance of `account` or the locked supply changes.
pub(crate) fn update_reward(
    storage: &mut dyn Storage,
    now: u64,
    account: Option<&Addr>,
) -> Result<(), ContractError> {
    let locked_supply = LOCKED_SUPPLY.load(storage)?;
    let locked = match account {
        Some(account) => {
            BALANCES
                .may_load(storage, account)?
                .unwrap_or_default()
                .locked
        }
        None => Uint128::zero(),
    };

    for token in REWARD_TOKENS.load(storage)? {
        let mut reward = REWARD_DATA.load(storage, &token)?;
        reward.reward_per_token_stored = reward_per_token(&reward, locked_supply, now)?;
        reward.last_update_time = last_time_reward_applicable(&reward, now);
        REWARD_DATA.save(storage, &token, &reward)?;

        if let Some(account) = account {
            let mut user = USER_DATA
                .may_load(storage, (account, &token))?
                .unwrap_or_default();
            user.rewards = earned(locked, reward.reward_per_token_stored, &user)?;
            user.reward_per_token_paid = reward.reward_per_token_stored;
            USER_DATA.save(storage, (account, &token), &user)?;
        }
    }

    Ok(())
}

/// Starts a new stream of `amount` over one epoch length.
/// Whatever is left of an active stream is blended into the new rate.
pub(crate) fn notify_reward(
    reward: &mut RewardData,
    amount: Uint128,
    now: u64,
) -> Result<(), ContractError> {
    let epoch_length = Uint128::from(EPOCH_LENGTH);

    reward.reward_rate = if now >= reward.period_finish {
        amount / epoch_length
    } else {
        let leftover = remaining_reward(reward, now)?;
        amount.checked_add(leftover)? / epoch_length
    };

    if reward.reward_rate >= MAX_REWARD_RATE {
        return Err(ContractError::RewardRateTooHigh {});
    }

    reward.last_update_time = now;
    reward.period_finish = now + EPOCH_LENGTH;

    Ok(())
}

/// Queues `amount` into the stream.
/// The queue is folded into a new stream when the current one is over or when the queued
/// amount is significant compared to what is left of the active stream.
/// Returns true if a new stream was started.
pub(crate) fn queue_new_rewards(
    reward: &mut RewardData,
    amount: Uint128,
    now: u64,
) -> Result<bool, ContractError> {
    let total = amount.checked_add(reward.queued)?;

    let fold = now >= reward.period_finish || {
        let leftover = remaining_reward(reward, now)?;
        total.full_mul(QUEUED_REWARDS_DENOMINATOR) >= leftover.full_mul(QUEUED_REWARDS_RATIO)
    };

    if fold {
        notify_reward(reward, total, now)?;
        reward.queued = Uint128::zero();
    } else {
        reward.queued = total;
    }

    Ok(fold)
}

fn remaining_reward(reward: &RewardData, now: u64) -> StdResult<Uint128> {
    let remaining_time = reward.period_finish.saturating_sub(now);
    Ok(reward.reward_rate.checked_mul(remaining_time.into())?)
}
