use astroport::asset::addr_opt_validate;
use astroport::common::{claim_ownership, drop_ownership_proposal, propose_new_owner};
#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    attr, ensure, ensure_eq, from_json, wasm_execute, Addr, CosmosMsg, DepsMut, Env, MessageInfo,
    Response, StdError, StdResult, Uint128,
};
use cw20::{Cw20ExecuteMsg, Cw20ReceiveMsg};
use cw_utils::nonpayable;

use yield_governance::locker::{
    Cw20HookMsg, ExecuteMsg, RewardData, MAX_KICK_REWARD_PER_EPOCH, MAX_REWARD_TOKENS,
    MIN_KICK_EPOCH_DELAY,
};

use crate::delegation::move_delegated_votes;
use crate::epochs::advance_to;
use crate::error::ContractError;
use crate::ledger::{lock_tokens, release_locks, Release};
use crate::rewards::{notify_reward, queue_new_rewards, update_reward};
use crate::state::{
    BALANCES, CONFIG, DELEGATES, OWNERSHIP_PROPOSAL, REWARD_DATA, REWARD_DISTRIBUTORS,
    REWARD_TOKENS, USER_DATA, USER_LOCKS,
};

/// Exposes all the execute functions available in the contract.
///
/// ## Variants
/// * **ExecuteMsg::Receive(cw20_msg)** Lock staking tokens or fund reward streams.
///
/// * **ExecuteMsg::CheckpointEpoch {}** Materialize total supply snapshots up to the current epoch.
///
/// * **ExecuteMsg::ProcessExpiredLocks { relock }** Withdraw or relock expired locks.
///
/// * **ExecuteMsg::KickExpiredLocks { account }** Process neglected locks of another account for an incentive.
///
/// * **ExecuteMsg::EmergencyWithdraw {}** Withdraw everything after shutdown.
///
/// * **ExecuteMsg::Delegate { to }** Route voting power to another address.
///
/// * **ExecuteMsg::GetReward { account, token, relock }** Claim accrued rewards.
///
/// * **ExecuteMsg::AddReward { token, distributor }** Register a reward token.
///
/// * **ExecuteMsg::ApproveRewardDistributor { token, distributor, approved }** Manage reward distributors.
///
/// * **ExecuteMsg::SetKickIncentive { rate, delay }** Update the kick incentive.
///
/// * **ExecuteMsg::RecoverToken { token, amount }** Recover tokens sent to the contract by mistake.
///
/// * **ExecuteMsg::Shutdown {}** Shut the contract down.
///
/// * **ExecuteMsg::ProposeNewOwner { new_owner, expires_in }** Creates a request to change contract ownership.
///
/// * **ExecuteMsg::DropOwnershipProposal {}** Removes a request to change contract ownership.
///
/// * **ExecuteMsg::ClaimOwnership {}** Claims contract ownership.
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    nonpayable(&info)?;

    // Every epoch boundary crossed since the last interaction gets its snapshot first
    let filled_epochs = advance_to(deps.storage, env.block.time.seconds())?;

    match msg {
        ExecuteMsg::Receive(cw20_msg) => receive_cw20(deps, env, info, cw20_msg),
        ExecuteMsg::CheckpointEpoch {} => Ok(Response::new().add_attributes([
            attr("action", "checkpoint_epoch"),
            attr("filled_epochs", filled_epochs.to_string()),
        ])),
        ExecuteMsg::ProcessExpiredLocks { relock } => {
            process_expired_locks(deps, env, info, relock)
        }
        ExecuteMsg::KickExpiredLocks { account } => kick_expired_locks(deps, env, info, account),
        ExecuteMsg::EmergencyWithdraw {} => emergency_withdraw(deps, env, info),
        ExecuteMsg::Delegate { to } => delegate(deps, env, info, to),
        ExecuteMsg::GetReward {
            account,
            token,
            relock,
        } => get_reward(deps, env, info, account, token, relock.unwrap_or_default()),
        ExecuteMsg::AddReward { token, distributor } => {
            add_reward(deps, env, info, token, distributor)
        }
        ExecuteMsg::ApproveRewardDistributor {
            token,
            distributor,
            approved,
        } => approve_reward_distributor(deps, info, token, distributor, approved),
        ExecuteMsg::SetKickIncentive { rate, delay } => set_kick_incentive(deps, info, rate, delay),
        ExecuteMsg::RecoverToken { token, amount } => recover_token(deps, info, token, amount),
        ExecuteMsg::Shutdown {} => {
            let mut config = CONFIG.load(deps.storage)?;
            ensure_eq!(info.sender, config.owner, ContractError::Unauthorized {});

            config.is_shutdown = true;
            CONFIG.save(deps.storage, &config)?;

            Ok(Response::new().add_attribute("action", "shutdown"))
        }
        ExecuteMsg::ProposeNewOwner {
            new_owner,
            expires_in,
        } => {
            let config = CONFIG.load(deps.storage)?;

            propose_new_owner(
                deps,
                info,
                env,
                new_owner,
                expires_in,
                config.owner,
                OWNERSHIP_PROPOSAL,
            )
            .map_err(Into::into)
        }
        ExecuteMsg::DropOwnershipProposal {} => {
            let config = CONFIG.load(deps.storage)?;

            drop_ownership_proposal(deps, info, config.owner, OWNERSHIP_PROPOSAL)
                .map_err(Into::into)
        }
        ExecuteMsg::ClaimOwnership {} => {
            claim_ownership(deps, info, env, OWNERSHIP_PROPOSAL, |deps, new_owner| {
                CONFIG
                    .update::<_, StdError>(deps.storage, |mut v| {
                        v.owner = new_owner;
                        Ok(v)
                    })
                    .map(|_| ())
            })
            .map_err(Into::into)
        }
    }
}

/// Receives a message of type [`Cw20ReceiveMsg`] and processes it depending on the received template.
/// The contract which called this hook is the token being sent.
fn receive_cw20(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    cw20_msg: Cw20ReceiveMsg,
) -> Result<Response, ContractError> {
    let sender = deps.api.addr_validate(&cw20_msg.sender)?;
    let now = env.block.time.seconds();

    match from_json(&cw20_msg.msg)? {
        Cw20HookMsg::Lock { account } => {
            let config = CONFIG.load(deps.storage)?;
            ensure_eq!(
                info.sender,
                config.staking_token,
                ContractError::Unauthorized {}
            );

            let account = addr_opt_validate(deps.api, &account)?.unwrap_or(sender);

            update_reward(deps.storage, now, Some(&account))?;
            let unlock_time = lock_tokens(deps.storage, &config, &account, cw20_msg.amount, now)?;

            Ok(Response::new().add_attributes([
                attr("action", "lock"),
                attr("account", account),
                attr("amount", cw20_msg.amount),
                attr("unlock_time", unlock_time.to_string()),
            ]))
        }
        Cw20HookMsg::NotifyRewardAmount {} => {
            fund_rewards(deps, now, info.sender, sender, cw20_msg.amount, false)
        }
        Cw20HookMsg::QueueNewRewards {} => {
            fund_rewards(deps, now, info.sender, sender, cw20_msg.amount, true)
        }
    }
}

/// Adds `amount` of `token` to its reward stream.
/// With `queue` set, small amounts are held back until they are significant for the
/// active stream.
fn fund_rewards(
    deps: DepsMut,
    now: u64,
    token: Addr,
    distributor: Addr,
    amount: Uint128,
    queue: bool,
) -> Result<Response, ContractError> {
    ensure!(
        REWARD_DATA.has(deps.storage, &token),
        ContractError::RewardNotFound(token.to_string())
    );
    ensure!(
        REWARD_DISTRIBUTORS
            .may_load(deps.storage, (&token, &distributor))?
            .unwrap_or_default(),
        ContractError::MustBeDistributor {}
    );
    ensure!(!amount.is_zero(), ContractError::NoReward {});

    update_reward(deps.storage, now, None)?;

    let mut reward = REWARD_DATA.load(deps.storage, &token)?;
    let action = if queue {
        queue_new_rewards(&mut reward, amount, now)?;
        "queue_new_rewards"
    } else {
        notify_reward(&mut reward, amount, now)?;
        "notify_reward_amount"
    };
    REWARD_DATA.save(deps.storage, &token, &reward)?;

    Ok(Response::new().add_attributes([
        attr("action", action),
        attr("token", token),
        attr("amount", amount),
        attr("reward_rate", reward.reward_rate),
        attr("queued", reward.queued),
        attr("period_finish", reward.period_finish.to_string()),
    ]))
}

/// Withdraws all expired locks of the sender or locks them again.
fn process_expired_locks(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    relock: bool,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure!(
        !(relock && config.is_shutdown),
        ContractError::SystemShutdown {}
    );

    let now = env.block.time.seconds();
    let account = info.sender;

    update_reward(deps.storage, now, Some(&account))?;
    let released = release_locks(
        deps.storage,
        &config,
        &account,
        now,
        Release::Expired { relock },
    )?;

    let response = Response::new().add_attributes([
        attr("action", "process_expired_locks"),
        attr("account", &account),
        attr("amount", released.amount),
        attr("relocked", relock.to_string()),
    ]);

    if relock {
        let unlock_time = lock_tokens(deps.storage, &config, &account, released.amount, now)?;
        Ok(response.add_attribute("unlock_time", unlock_time.to_string()))
    } else {
        Ok(response.add_message(transfer_msg(
            &config.staking_token,
            &account,
            released.amount,
        )?))
    }
}

/// Processes neglected locks of `account` on behalf of a third party.
/// The sender gets a part of the released amount.
fn kick_expired_locks(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    account: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let account = deps.api.addr_validate(&account)?;
    ensure!(info.sender != account, ContractError::Unauthorized {});
    let now = env.block.time.seconds();

    update_reward(deps.storage, now, Some(&account))?;
    let released = release_locks(deps.storage, &config, &account, now, Release::Kick)?;
    let remainder = released.amount.checked_sub(released.kick_reward)?;

    let mut messages = vec![];
    if !released.kick_reward.is_zero() {
        messages.push(transfer_msg(
            &config.staking_token,
            &info.sender,
            released.kick_reward,
        )?);
    }
    if !remainder.is_zero() {
        messages.push(transfer_msg(&config.staking_token, &account, remainder)?);
    }

    Ok(Response::new().add_messages(messages).add_attributes([
        attr("action", "kick_expired_locks"),
        attr("account", account),
        attr("kicker", info.sender),
        attr("amount", released.amount),
        attr("kick_reward", released.kick_reward),
    ]))
}

/// Withdraws every lock of the sender regardless of expiry. Only available after shutdown.
fn emergency_withdraw(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure!(config.is_shutdown, ContractError::NotShutdown {});

    let now = env.block.time.seconds();
    update_reward(deps.storage, now, Some(&info.sender))?;
    let released = release_locks(deps.storage, &config, &info.sender, now, Release::Emergency)?;

    Ok(Response::new()
        .add_message(transfer_msg(
            &config.staking_token,
            &info.sender,
            released.amount,
        )?)
        .add_attributes([
            attr("action", "emergency_withdraw"),
            attr("account", info.sender),
            attr("amount", released.amount),
            attr("relocked", "false"),
        ]))
}

/// Routes voting power of the sender's running locks to `to` starting from the next epoch.
fn delegate(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    to: String,
) -> Result<Response, ContractError> {
    ensure!(!to.is_empty(), ContractError::NullDelegate {});
    let new_delegatee = deps.api.addr_validate(&to)?;
    let account = info.sender;

    let balance = BALANCES
        .may_load(deps.storage, &account)?
        .unwrap_or_default();
    ensure!(!balance.locked.is_zero(), ContractError::NoLockedBalance {});

    let old_delegatee = DELEGATES.may_load(deps.storage, &account)?;
    ensure!(
        old_delegatee.as_ref() != Some(&new_delegatee),
        ContractError::SameDelegatee {}
    );

    let now = env.block.time.seconds();
    update_reward(deps.storage, now, Some(&account))?;

    DELEGATES.save(deps.storage, &account, &new_delegatee)?;

    let locks = USER_LOCKS
        .may_load(deps.storage, &account)?
        .unwrap_or_default();
    let unprocessed = locks
        .get(balance.next_unlock_index as usize..)
        .unwrap_or_default();
    let moved = move_delegated_votes(
        deps.storage,
        unprocessed,
        old_delegatee.as_ref(),
        &new_delegatee,
        now,
    )?;

    Ok(Response::new().add_attributes([
        attr("action", "delegate"),
        attr("account", account),
        attr(
            "from_delegatee",
            old_delegatee.map(String::from).unwrap_or_default(),
        ),
        attr("to_delegatee", new_delegatee),
        attr("amount", moved),
    ]))
}

/// Pays out accrued rewards of `account`.
/// Staking token rewards are locked instead when the account claims for itself with `relock`.
fn get_reward(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    account: Option<String>,
    token: Option<String>,
    relock: bool,
) -> Result<Response, ContractError> {
    let account = addr_opt_validate(deps.api, &account)?.unwrap_or_else(|| info.sender.clone());
    let relock = relock && account == info.sender;
    let now = env.block.time.seconds();
    let config = CONFIG.load(deps.storage)?;

    update_reward(deps.storage, now, Some(&account))?;

    let tokens = match addr_opt_validate(deps.api, &token)? {
        Some(token) => {
            ensure!(
                REWARD_DATA.has(deps.storage, &token),
                ContractError::RewardNotFound(token.to_string())
            );
            vec![token]
        }
        None => REWARD_TOKENS.load(deps.storage)?,
    };

    let mut response = Response::new().add_attributes([
        attr("action", "get_reward"),
        attr("account", &account),
    ]);

    for token in tokens {
        let mut user = USER_DATA
            .may_load(deps.storage, (&account, &token))?
            .unwrap_or_default();
        if user.rewards.is_zero() {
            continue;
        }

        let amount = user.rewards;
        user.rewards = Uint128::zero();
        USER_DATA.save(deps.storage, (&account, &token), &user)?;

        if relock && token == config.staking_token {
            lock_tokens(deps.storage, &config, &account, amount, now)?;
            response = response.add_attribute("relocked_reward", amount);
        } else {
            response = response.add_message(transfer_msg(&token, &account, amount)?);
        }
        response = response.add_attribute("reward", format!("{amount}{token}"));
    }

    Ok(response)
}

/// Registers a new reward token. Its stream starts empty.
fn add_reward(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    token: String,
    distributor: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_eq!(info.sender, config.owner, ContractError::Unauthorized {});

    let token = deps.api.addr_validate(&token)?;
    let distributor = deps.api.addr_validate(&distributor)?;

    ensure!(
        !REWARD_DATA.has(deps.storage, &token),
        ContractError::RewardAlreadyExists(token.to_string())
    );

    let mut reward_tokens = REWARD_TOKENS.load(deps.storage)?;
    ensure!(
        reward_tokens.len() < MAX_REWARD_TOKENS,
        ContractError::MaxRewardTokens {
            max: MAX_REWARD_TOKENS
        }
    );

    let now = env.block.time.seconds();
    REWARD_DATA.save(
        deps.storage,
        &token,
        &RewardData {
            period_finish: now,
            last_update_time: now,
            ..Default::default()
        },
    )?;
    REWARD_DISTRIBUTORS.save(deps.storage, (&token, &distributor), &true)?;

    reward_tokens.push(token.clone());
    REWARD_TOKENS.save(deps.storage, &reward_tokens)?;

    Ok(Response::new().add_attributes([
        attr("action", "add_reward"),
        attr("token", token),
        attr("distributor", distributor),
    ]))
}

fn approve_reward_distributor(
    deps: DepsMut,
    info: MessageInfo,
    token: String,
    distributor: String,
    approved: bool,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_eq!(info.sender, config.owner, ContractError::Unauthorized {});

    let token = deps.api.addr_validate(&token)?;
    let distributor = deps.api.addr_validate(&distributor)?;
    ensure!(
        REWARD_DATA.has(deps.storage, &token),
        ContractError::RewardNotFound(token.to_string())
    );

    REWARD_DISTRIBUTORS.save(deps.storage, (&token, &distributor), &approved)?;

    Ok(Response::new().add_attributes([
        attr("action", "approve_reward_distributor"),
        attr("token", token),
        attr("distributor", distributor),
        attr("approved", approved.to_string()),
    ]))
}

fn set_kick_incentive(
    deps: DepsMut,
    info: MessageInfo,
    rate: Uint128,
    delay: u64,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    ensure_eq!(info.sender, config.owner, ContractError::Unauthorized {});

    ensure!(
        rate <= MAX_KICK_REWARD_PER_EPOCH,
        ContractError::OverMaxRate {
            max: MAX_KICK_REWARD_PER_EPOCH
        }
    );
    ensure!(
        delay >= MIN_KICK_EPOCH_DELAY,
        ContractError::MinDelay {
            min: MIN_KICK_EPOCH_DELAY
        }
    );

    config.kick_reward_per_epoch = rate;
    config.kick_reward_epoch_delay = delay;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attributes([
        attr("action", "set_kick_incentive"),
        attr("rate", rate),
        attr("delay", delay.to_string()),
    ]))
}

/// Sends tokens which are not accounted by the contract to the owner.
fn recover_token(
    deps: DepsMut,
    info: MessageInfo,
    token: String,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_eq!(info.sender, config.owner, ContractError::Unauthorized {});

    let token = deps.api.addr_validate(&token)?;
    ensure!(
        token != config.staking_token,
        ContractError::CannotWithdrawStakingToken {}
    );
    ensure!(
        !REWARD_DATA.has(deps.storage, &token),
        ContractError::CannotWithdrawRewardToken {}
    );

    Ok(Response::new()
        .add_message(transfer_msg(&token, &config.owner, amount)?)
        .add_attributes([
            attr("action", "recover_token"),
            attr("token", token),
            attr("amount", amount),
        ]))
}

fn transfer_msg(token: &Addr, recipient: &Addr, amount: Uint128) -> StdResult<CosmosMsg> {
    Ok(wasm_execute(
        token,
        &Cw20ExecuteMsg::Transfer {
            recipient: recipient.to_string(),
            amount,
        },
        vec![],
    )?
    .into())
}
