use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{to_json_binary, Addr, CosmosMsg, QuerierWrapper, StdResult, Uint128, WasmMsg};
use cw20::{BalanceResponse, Cw20ExecuteMsg, Cw20ReceiveMsg, TokenInfoResponse};

use crate::utils::EPOCH_LENGTH;

/// Number of epochs a lock stays in the ledger before its principal can be withdrawn
pub const LOCK_DURATION_EPOCHS: u64 = 17;
/// Lock duration in seconds
pub const LOCK_DURATION: u64 = LOCK_DURATION_EPOCHS * EPOCH_LENGTH;
/// Default kick incentive in staking token units per epoch elapsed since lock expiry
pub const DEFAULT_KICK_REWARD_PER_EPOCH: Uint128 = Uint128::new(100);
/// Default grace period before a lock can be kicked
pub const DEFAULT_KICK_REWARD_EPOCH_DELAY: u64 = 3;
/// Kick incentive can't exceed 1000 tokens (6 decimals) per epoch
pub const MAX_KICK_REWARD_PER_EPOCH: Uint128 = Uint128::new(1_000_000_000);
/// At least two epochs of grace before anyone can kick a lock
pub const MIN_KICK_EPOCH_DELAY: u64 = 2;
/// Queued rewards are folded into an active stream once they reach 83% of what is left of it
pub const QUEUED_REWARDS_RATIO: u128 = 830;
pub const QUEUED_REWARDS_DENOMINATOR: u128 = 1000;
/// Maximum number of reward tokens the locker streams simultaneously
pub const MAX_REWARD_TOKENS: usize = 5;
/// Upper bound for a reward rate (tokens per second). Equals 1e20.
pub const MAX_REWARD_RATE: Uint128 = Uint128::new(100_000_000_000_000_000_000);
/// Fixed point precision of the reward per token accumulator. Equals 1e18.
pub const REWARD_PRECISION: Uint128 = Uint128::new(1_000_000_000_000_000_000);

/// This structure describes the basic settings for creating a contract.
#[cw_serde]
pub struct InstantiateMsg {
    /// Contract owner
    pub owner: String,
    /// CW20 token that is locked in the contract
    pub staking_token: String,
    /// Name of the vote-locked position token
    pub name: String,
    /// Symbol of the vote-locked position token
    pub symbol: String,
    /// Decimals of the vote-locked position token. Should match the staking token
    pub decimals: u8,
}

/// General contract configuration
#[cw_serde]
pub struct Config {
    /// Address that's allowed to change contract parameters
    pub owner: Addr,
    /// CW20 token that is locked in the contract
    pub staking_token: Addr,
    /// Name of the vote-locked position token
    pub name: String,
    /// Symbol of the vote-locked position token
    pub symbol: String,
    /// Decimals of the vote-locked position token
    pub decimals: u8,
    /// Kick incentive in staking token units paid per epoch elapsed since lock expiry.
    /// Capped by the kicked lock amount
    pub kick_reward_per_epoch: Uint128,
    /// Number of epochs after expiry before a lock can be kicked
    pub kick_reward_epoch_delay: u64,
    /// Whether the contract is shut down. Shutdown is irreversible
    pub is_shutdown: bool,
    /// Epoch in which the contract was instantiated
    pub genesis_epoch: u64,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Receives a message of type [`Cw20ReceiveMsg`] and processes it depending on the received
    /// template.
    Receive(Cw20ReceiveMsg),
    /// Materializes total supply snapshots for all epochs up to the current one.
    /// Permissionless and idempotent.
    CheckpointEpoch {},
    /// Withdraws or relocks all expired locks of the caller.
    /// With `relock` set, locks that expire at the next epoch boundary are processed as well.
    ProcessExpiredLocks { relock: bool },
    /// Processes expired locks of `account` once the kick grace period is over.
    /// The caller receives a kick incentive taken from the released amount.
    KickExpiredLocks { account: String },
    /// Withdraws the whole locked balance of the caller. Only available after shutdown
    EmergencyWithdraw {},
    /// Routes voting power of the caller's locks to `to`
    Delegate { to: String },
    /// Claims accrued rewards for `account` (defaults to the caller).
    /// If `token` is set only that reward token is paid.
    /// If `relock` is set and the caller claims for themselves, staking token rewards
    /// are locked into the caller's position instead of being transferred.
    GetReward {
        account: Option<String>,
        token: Option<String>,
        relock: Option<bool>,
    },
    /// Registers a new reward token with its first distributor
    AddReward { token: String, distributor: String },
    /// Approves or revokes a distributor for an existing reward token
    ApproveRewardDistributor {
        token: String,
        distributor: String,
        approved: bool,
    },
    /// Updates the kick incentive. Rate is expressed in staking token units per epoch
    SetKickIncentive { rate: Uint128, delay: u64 },
    /// Sends tokens which are neither the staking token nor a reward token to the owner
    RecoverToken { token: String, amount: Uint128 },
    /// Shuts the contract down. New locks are rejected, all locks become withdrawable
    Shutdown {},
    /// ProposeNewOwner proposes a new owner for the contract
    ProposeNewOwner {
        /// Newly proposed contract owner
        new_owner: String,
        /// The timestamp when the contract ownership change expires
        expires_in: u64,
    },
    /// DropOwnershipProposal removes the latest contract ownership transfer proposal
    DropOwnershipProposal {},
    /// ClaimOwnership allows the newly proposed owner to claim contract ownership
    ClaimOwnership {},
}

/// This structure describes a CW20 hook message.
#[cw_serde]
pub enum Cw20HookMsg {
    /// Lock staking tokens for `account` (defaults to the token sender)
    Lock { account: Option<String> },
    /// Start or extend the reward stream with the sent tokens.
    /// Sender must be an approved distributor of the reward token
    NotifyRewardAmount {},
    /// Queue the sent tokens into the reward stream.
    /// Small top-ups are accumulated until they are significant for an active stream
    QueueNewRewards {},
}

/// This structure describes the query messages available in the contract.
#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// Config returns the contract configuration
    #[returns(Config)]
    Config {},
    /// Token info of the vote-locked position. Total supply is the current voting supply
    #[returns(TokenInfoResponse)]
    TokenInfo {},
    /// Voting weight of an address at the current epoch
    #[returns(BalanceResponse)]
    Balance { address: String },
    /// Voting weight of an address at a given epoch
    #[returns(Uint128)]
    BalanceAtEpoch { address: String, epoch: u64 },
    /// Total voting supply at the current epoch
    #[returns(Uint128)]
    TotalSupply {},
    /// Total voting supply at a given epoch
    #[returns(Uint128)]
    TotalSupplyAtEpoch { epoch: u64 },
    /// Total voting supply at the epoch containing `timestamp`.
    /// Only finished epochs can be queried
    #[returns(Uint128)]
    PastTotalSupply { timestamp: u64 },
    /// Sum of all locks which are not processed yet. Rewards are streamed against it
    #[returns(Uint128)]
    LockedSupply {},
    /// Locked balance breakdown of an address
    #[returns(LockedBalancesResponse)]
    LockedBalances { address: String },
    /// Raw ledger balance of an address
    #[returns(Balances)]
    AccountBalance { address: String },
    /// Number of materialized epoch snapshots
    #[returns(u64)]
    EpochCount {},
    /// Paginated list of materialized epoch snapshots
    #[returns(Vec<EpochSnapshot>)]
    Epochs {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    /// Epoch id for a timestamp
    #[returns(u64)]
    FindEpochId { timestamp: u64 },
    /// Current delegatee of an address
    #[returns(Option<Addr>)]
    Delegates { address: String },
    /// Votes delegated to an address at the current epoch
    #[returns(Uint128)]
    Votes { address: String },
    /// Votes delegated to an address at the epoch containing `timestamp`.
    /// Only finished epochs can be queried
    #[returns(Uint128)]
    PastVotes { address: String, timestamp: u64 },
    /// Number of vote checkpoints of a delegatee
    #[returns(u32)]
    NumCheckpoints { address: String },
    /// Vote checkpoint of a delegatee at a given index
    #[returns(Checkpoint)]
    Checkpoint { address: String, index: u32 },
    /// Amount of a delegatee's votes that expire at `unlock_time`
    #[returns(Uint128)]
    DelegateeUnlocks { address: String, unlock_time: u64 },
    /// List of registered reward tokens
    #[returns(Vec<Addr>)]
    RewardTokens {},
    /// Stream state of a reward token
    #[returns(RewardData)]
    RewardData { token: String },
    /// Current reward per locked token of a reward token
    #[returns(Uint128)]
    RewardPerToken { token: String },
    /// Timestamp up to which a reward token is streamed at the moment
    #[returns(u64)]
    LastTimeRewardApplicable { token: String },
    /// Reward accounting of an address for a reward token
    #[returns(UserData)]
    UserData { address: String, token: String },
    /// Claimable rewards of an address for every reward token
    #[returns(Vec<EarnedData>)]
    ClaimableRewards { address: String },
    /// Whether `distributor` is allowed to fund `token` rewards
    #[returns(bool)]
    IsRewardDistributor { token: String, distributor: String },
}

/// A single lock in the ledger
#[cw_serde]
pub struct LockedBalance {
    /// Amount of staking tokens
    pub amount: Uint128,
    /// Timestamp at which the lock can be withdrawn
    pub unlock_time: u64,
}

/// Aggregated ledger balance of an account
#[cw_serde]
#[derive(Default)]
pub struct Balances {
    /// Sum of all locks which were not processed yet
    pub locked: Uint128,
    /// Index of the oldest unprocessed lock
    pub next_unlock_index: u32,
    /// Epoch in which the account withdrew unexpired locks after shutdown
    pub exited_at: Option<u64>,
}

/// Total voting supply effective at an epoch
#[cw_serde]
pub struct EpochSnapshot {
    pub epoch: u64,
    pub supply: Uint128,
}

/// Votes of a delegatee effective from `epoch_start`
#[cw_serde]
pub struct Checkpoint {
    /// Timestamp of the epoch start
    pub epoch_start: u64,
    pub votes: Uint128,
}

/// Stream state of a reward token
#[cw_serde]
#[derive(Default)]
pub struct RewardData {
    /// Timestamp when the current stream ends
    pub period_finish: u64,
    /// Last time the accumulator was updated
    pub last_update_time: u64,
    /// Tokens streamed per second
    pub reward_rate: Uint128,
    /// Accumulated reward per locked token scaled by [`REWARD_PRECISION`]
    pub reward_per_token_stored: Uint128,
    /// Rewards waiting to be folded into the stream
    pub queued: Uint128,
}

/// Reward accounting of an account for a single reward token
#[cw_serde]
#[derive(Default)]
pub struct UserData {
    /// Accumulator value at the last account update
    pub reward_per_token_paid: Uint128,
    /// Accrued but unclaimed rewards
    pub rewards: Uint128,
}

#[cw_serde]
pub struct EarnedData {
    pub token: Addr,
    pub amount: Uint128,
}

#[cw_serde]
pub struct LockedBalancesResponse {
    /// All unprocessed locks
    pub total: Uint128,
    /// Unprocessed locks which already expired
    pub unlockable: Uint128,
    /// Locks which are still locked
    pub locked: Uint128,
    /// Details of the locks which are still locked
    pub locks: Vec<LockedBalance>,
}

/// Queries current votes delegated to `account`.
pub fn query_votes(
    querier: QuerierWrapper,
    locker: &Addr,
    account: impl Into<String>,
) -> StdResult<Uint128> {
    querier.query_wasm_smart(
        locker,
        &QueryMsg::Votes {
            address: account.into(),
        },
    )
}

/// Queries votes delegated to `account` at a finished epoch containing `timestamp`.
pub fn query_past_votes(
    querier: QuerierWrapper,
    locker: &Addr,
    account: impl Into<String>,
    timestamp: u64,
) -> StdResult<Uint128> {
    querier.query_wasm_smart(
        locker,
        &QueryMsg::PastVotes {
            address: account.into(),
            timestamp,
        },
    )
}

/// Queries current total voting supply.
pub fn query_total_supply(querier: QuerierWrapper, locker: &Addr) -> StdResult<Uint128> {
    querier.query_wasm_smart(locker, &QueryMsg::TotalSupply {})
}

/// Builds a message which sends `amount` of `reward_token` to the locker as a new reward stream.
/// Sender of the resulting message must be an approved distributor.
pub fn notify_reward_msg(
    reward_token: &Addr,
    locker: &Addr,
    amount: Uint128,
) -> StdResult<CosmosMsg> {
    reward_send_msg(
        reward_token,
        locker,
        amount,
        &Cw20HookMsg::NotifyRewardAmount {},
    )
}

/// Builds a message which queues `amount` of `reward_token` into the locker's reward stream.
pub fn queue_rewards_msg(
    reward_token: &Addr,
    locker: &Addr,
    amount: Uint128,
) -> StdResult<CosmosMsg> {
    reward_send_msg(reward_token, locker, amount, &Cw20HookMsg::QueueNewRewards {})
}

fn reward_send_msg(
    reward_token: &Addr,
    locker: &Addr,
    amount: Uint128,
    hook: &Cw20HookMsg,
) -> StdResult<CosmosMsg> {
    Ok(WasmMsg::Execute {
        contract_addr: reward_token.to_string(),
        msg: to_json_binary(&Cw20ExecuteMsg::Send {
            contract: locker.to_string(),
            amount,
            msg: to_json_binary(hook)?,
        })?,
        funds: vec![],
    }
    .into())
}
