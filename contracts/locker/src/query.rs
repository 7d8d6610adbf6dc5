#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{ensure, to_json_binary, Binary, Deps, Env, Order, StdResult};
use cw20::{BalanceResponse, TokenInfoResponse};
use cw_storage_plus::Bound;
use itertools::Itertools;

use yield_governance::locker::{EarnedData, EpochSnapshot, QueryMsg};
use yield_governance::utils::{get_epoch, get_epoch_start};
use yield_governance::{DEFAULT_LIMIT, MAX_LIMIT};

use crate::delegation::votes_at;
use crate::epochs::supply_at_epoch;
use crate::error::ContractError;
use crate::ledger::{balance_at_epoch, locked_balances};
use crate::rewards::{earned, last_time_reward_applicable, reward_per_token};
use crate::state::{
    BALANCES, CHECKPOINTS, CONFIG, DELEGATEE_UNLOCKS, DELEGATES, EPOCHS, LAST_EPOCH,
    LOCKED_SUPPLY, REWARD_DATA, REWARD_DISTRIBUTORS, REWARD_TOKENS, USER_DATA,
};

/// Expose available contract queries.
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> Result<Binary, ContractError> {
    let now = env.block.time.seconds();
    let current_epoch = get_epoch(now);

    match msg {
        QueryMsg::Config {} => Ok(to_json_binary(&CONFIG.load(deps.storage)?)?),
        QueryMsg::TokenInfo {} => {
            let config = CONFIG.load(deps.storage)?;
            Ok(to_json_binary(&TokenInfoResponse {
                name: config.name,
                symbol: config.symbol,
                decimals: config.decimals,
                total_supply: supply_at_epoch(deps.storage, current_epoch)?,
            })?)
        }
        QueryMsg::Balance { address } => {
            let address = deps.api.addr_validate(&address)?;
            Ok(to_json_binary(&BalanceResponse {
                balance: balance_at_epoch(deps.storage, &address, current_epoch)?,
            })?)
        }
        QueryMsg::BalanceAtEpoch { address, epoch } => {
            ensure!(epoch <= current_epoch, ContractError::FutureLookup {});
            let address = deps.api.addr_validate(&address)?;
            Ok(to_json_binary(&balance_at_epoch(
                deps.storage,
                &address,
                epoch,
            )?)?)
        }
        QueryMsg::TotalSupply {} => Ok(to_json_binary(&supply_at_epoch(
            deps.storage,
            current_epoch,
        )?)?),
        QueryMsg::TotalSupplyAtEpoch { epoch } => {
            ensure!(epoch <= current_epoch, ContractError::FutureLookup {});
            Ok(to_json_binary(&supply_at_epoch(deps.storage, epoch)?)?)
        }
        QueryMsg::PastTotalSupply { timestamp } => {
            ensure!(
                timestamp < get_epoch_start(now),
                ContractError::FutureLookup {}
            );
            Ok(to_json_binary(&supply_at_epoch(
                deps.storage,
                get_epoch(timestamp),
            )?)?)
        }
        QueryMsg::LockedSupply {} => Ok(to_json_binary(&LOCKED_SUPPLY.load(deps.storage)?)?),
        QueryMsg::LockedBalances { address } => {
            let address = deps.api.addr_validate(&address)?;
            Ok(to_json_binary(&locked_balances(
                deps.storage,
                &address,
                now,
            )?)?)
        }
        QueryMsg::AccountBalance { address } => {
            let address = deps.api.addr_validate(&address)?;
            let balance = BALANCES
                .may_load(deps.storage, &address)?
                .unwrap_or_default();
            Ok(to_json_binary(&balance)?)
        }
        QueryMsg::EpochCount {} => {
            let genesis_epoch = CONFIG.load(deps.storage)?.genesis_epoch;
            let last_epoch = LAST_EPOCH.load(deps.storage)?;
            Ok(to_json_binary(&(last_epoch - genesis_epoch + 1))?)
        }
        QueryMsg::Epochs { start_after, limit } => {
            let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
            let snapshots: Vec<_> = EPOCHS
                .range(
                    deps.storage,
                    start_after.map(Bound::exclusive),
                    None,
                    Order::Ascending,
                )
                .take(limit)
                .map_ok(|(epoch, supply)| EpochSnapshot { epoch, supply })
                .try_collect()?;
            Ok(to_json_binary(&snapshots)?)
        }
        QueryMsg::FindEpochId { timestamp } => Ok(to_json_binary(&get_epoch(timestamp))?),
        QueryMsg::Delegates { address } => {
            let address = deps.api.addr_validate(&address)?;
            Ok(to_json_binary(&DELEGATES.may_load(deps.storage, &address)?)?)
        }
        QueryMsg::Votes { address } => {
            let address = deps.api.addr_validate(&address)?;
            Ok(to_json_binary(&votes_at(deps.storage, &address, now)?)?)
        }
        QueryMsg::PastVotes { address, timestamp } => {
            ensure!(
                timestamp < get_epoch_start(now),
                ContractError::FutureLookup {}
            );
            let address = deps.api.addr_validate(&address)?;
            Ok(to_json_binary(&votes_at(deps.storage, &address, timestamp)?)?)
        }
        QueryMsg::NumCheckpoints { address } => {
            let address = deps.api.addr_validate(&address)?;
            let checkpoints = CHECKPOINTS
                .may_load(deps.storage, &address)?
                .unwrap_or_default();
            Ok(to_json_binary(&(checkpoints.len() as u32))?)
        }
        QueryMsg::Checkpoint { address, index } => {
            let delegatee = deps.api.addr_validate(&address)?;
            let checkpoint = CHECKPOINTS
                .may_load(deps.storage, &delegatee)?
                .unwrap_or_default()
                .get(index as usize)
                .cloned()
                .ok_or(ContractError::CheckpointNotFound { address, index })?;
            Ok(to_json_binary(&checkpoint)?)
        }
        QueryMsg::DelegateeUnlocks {
            address,
            unlock_time,
        } => {
            let address = deps.api.addr_validate(&address)?;
            let unlocks = DELEGATEE_UNLOCKS
                .may_load(deps.storage, (&address, unlock_time))?
                .unwrap_or_default();
            Ok(to_json_binary(&unlocks)?)
        }
        QueryMsg::RewardTokens {} => Ok(to_json_binary(&REWARD_TOKENS.load(deps.storage)?)?),
        QueryMsg::RewardData { token } => {
            let token = deps.api.addr_validate(&token)?;
            let reward = REWARD_DATA
                .may_load(deps.storage, &token)?
                .ok_or_else(|| ContractError::RewardNotFound(token.to_string()))?;
            Ok(to_json_binary(&reward)?)
        }
        QueryMsg::RewardPerToken { token } => {
            let token = deps.api.addr_validate(&token)?;
            let reward = REWARD_DATA
                .may_load(deps.storage, &token)?
                .ok_or_else(|| ContractError::RewardNotFound(token.to_string()))?;
            let locked_supply = LOCKED_SUPPLY.load(deps.storage)?;
            Ok(to_json_binary(&reward_per_token(
                &reward,
                locked_supply,
                now,
            )?)?)
        }
        QueryMsg::LastTimeRewardApplicable { token } => {
            let token = deps.api.addr_validate(&token)?;
            let reward = REWARD_DATA
                .may_load(deps.storage, &token)?
                .ok_or_else(|| ContractError::RewardNotFound(token.to_string()))?;
            Ok(to_json_binary(&last_time_reward_applicable(&reward, now))?)
        }
        QueryMsg::UserData { address, token } => {
            let address = deps.api.addr_validate(&address)?;
            let token = deps.api.addr_validate(&token)?;
            let user = USER_DATA
                .may_load(deps.storage, (&address, &token))?
                .unwrap_or_default();
            Ok(to_json_binary(&user)?)
        }
        QueryMsg::ClaimableRewards { address } => {
            let address = deps.api.addr_validate(&address)?;
            let locked = BALANCES
                .may_load(deps.storage, &address)?
                .unwrap_or_default()
                .locked;
            let locked_supply = LOCKED_SUPPLY.load(deps.storage)?;

            let claimable = REWARD_TOKENS
                .load(deps.storage)?
                .into_iter()
                .map(|token| -> StdResult<_> {
                    let reward = REWARD_DATA.load(deps.storage, &token)?;
                    let user = USER_DATA
                        .may_load(deps.storage, (&address, &token))?
                        .unwrap_or_default();
                    let amount = earned(
                        locked,
                        reward_per_token(&reward, locked_supply, now)?,
                        &user,
                    )?;
                    Ok(EarnedData { token, amount })
                })
                .collect::<StdResult<Vec<_>>>()?;
            Ok(to_json_binary(&claimable)?)
        }
        QueryMsg::IsRewardDistributor { token, distributor } => {
            let token = deps.api.addr_validate(&token)?;
            let distributor = deps.api.addr_validate(&distributor)?;
            let approved = REWARD_DISTRIBUTORS
                .may_load(deps.storage, (&token, &distributor))?
                .unwrap_or_default();
            Ok(to_json_binary(&approved)?)
        }
    }
}
