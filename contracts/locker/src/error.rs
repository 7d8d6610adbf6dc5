use cosmwasm_std::{OverflowError, StdError, Uint128};
use cw_utils::PaymentError;
use thiserror::Error;

/// This enum describes locker contract errors
#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    PaymentError(#[from] PaymentError),

    #[error("{0}")]
    OverflowError(#[from] OverflowError),

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Cannot lock zero amount")]
    ZeroAmount {},

    #[error("Contract is shut down")]
    SystemShutdown {},

    #[error("Contract must be shut down")]
    NotShutdown {},

    #[error("No expired locks")]
    NoExpiredLocks {},

    #[error("Nothing locked")]
    NothingLocked {},

    #[error("Must delegate to someone")]
    NullDelegate {},

    #[error("Nothing to delegate")]
    NoLockedBalance {},

    #[error("Must choose a new delegatee")]
    SameDelegatee {},

    #[error("Epoch is in the future")]
    FutureLookup {},

    #[error("Checkpoint {index} not found for {address}")]
    CheckpointNotFound { address: String, index: u32 },

    #[error("Must be a reward distributor")]
    MustBeDistributor {},

    #[error("No reward")]
    NoReward {},

    #[error("Reward token {0} already exists")]
    RewardAlreadyExists(String),

    #[error("Reward token {0} not found")]
    RewardNotFound(String),

    #[error("Maximum {max} reward tokens allowed")]
    MaxRewardTokens { max: usize },

    #[error("Reward rate is too high")]
    RewardRateTooHigh {},

    #[error("Kick incentive rate is over max rate {max}")]
    OverMaxRate { max: Uint128 },

    #[error("Kick delay must be at least {min} epochs")]
    MinDelay { min: u64 },

    #[error("Cannot withdraw staking token")]
    CannotWithdrawStakingToken {},

    #[error("Cannot withdraw reward token")]
    CannotWithdrawRewardToken {},
}
