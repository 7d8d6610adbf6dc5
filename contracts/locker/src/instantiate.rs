#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{attr, ensure, DepsMut, Env, MessageInfo, Response, StdError, Uint128};
use cw2::set_contract_version;

use yield_governance::locker::{
    Config, InstantiateMsg, DEFAULT_KICK_REWARD_EPOCH_DELAY, DEFAULT_KICK_REWARD_PER_EPOCH,
};
use yield_governance::utils::get_epoch;

use crate::error::ContractError;
use crate::state::{CONFIG, EPOCHS, LAST_EPOCH, LOCKED_SUPPLY, REWARD_TOKENS};

/// Contract name that is used for migration.
pub const CONTRACT_NAME: &str = env!("CARGO_PKG_NAME");
/// Contract version that is used for migration.
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Creates a new contract with the specified parameters in the [`InstantiateMsg`].
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    ensure!(
        msg.decimals <= 18,
        StdError::generic_err("Decimals must not exceed 18")
    );

    let genesis_epoch = get_epoch(env.block.time.seconds());

    let config = Config {
        owner: deps.api.addr_validate(&msg.owner)?,
        staking_token: deps.api.addr_validate(&msg.staking_token)?,
        name: msg.name,
        symbol: msg.symbol,
        decimals: msg.decimals,
        kick_reward_per_epoch: DEFAULT_KICK_REWARD_PER_EPOCH,
        kick_reward_epoch_delay: DEFAULT_KICK_REWARD_EPOCH_DELAY,
        is_shutdown: false,
        genesis_epoch,
    };
    CONFIG.save(deps.storage, &config)?;

    EPOCHS.save(deps.storage, genesis_epoch, &Uint128::zero())?;
    LAST_EPOCH.save(deps.storage, &genesis_epoch)?;
    LOCKED_SUPPLY.save(deps.storage, &Uint128::zero())?;
    REWARD_TOKENS.save(deps.storage, &vec![])?;

    Ok(Response::new().add_attributes([
        attr("action", "instantiate_locker"),
        attr("staking_token", config.staking_token),
        attr("genesis_epoch", genesis_epoch.to_string()),
    ]))
}
