use astroport::common::OwnershipProposal;
use cosmwasm_std::{Addr, Uint128};
use cw_storage_plus::{Item, Map};

use yield_governance::locker::{Balances, Checkpoint, Config, LockedBalance, RewardData, UserData};

/// Stores the contract config.
pub const CONFIG: Item<Config> = Item::new("config");
/// Contains a proposal to change contract ownership
pub const OWNERSHIP_PROPOSAL: Item<OwnershipProposal> = Item::new("ownership_proposal");

/// Sum of all unprocessed locks. Reward streams are distributed against it
pub const LOCKED_SUPPLY: Item<Uint128> = Item::new("locked_supply");
/// Aggregated ledger balance per account
pub const BALANCES: Map<&Addr, Balances> = Map::new("balances");
/// Locks per account ordered by unlock time.
/// Processed locks are kept, see [`Balances::next_unlock_index`]
pub const USER_LOCKS: Map<&Addr, Vec<LockedBalance>> = Map::new("user_locks");

/// Voting supply snapshots. Key epoch id -> supply effective at that epoch
pub const EPOCHS: Map<u64, Uint128> = Map::new("epochs");
/// Latest materialized epoch in [`EPOCHS`]
pub const LAST_EPOCH: Item<u64> = Item::new("last_epoch");
/// Amount leaving the voting supply at an epoch. Key epoch id -> amount
pub const SUPPLY_UNLOCKS: Map<u64, Uint128> = Map::new("supply_unlocks");

/// Delegatee per account
pub const DELEGATES: Map<&Addr, Addr> = Map::new("delegates");
/// Vote checkpoints per delegatee ordered by epoch start
pub const CHECKPOINTS: Map<&Addr, Vec<Checkpoint>> = Map::new("checkpoints");
/// Delegated votes expiring at a given time. Key (delegatee, unlock time) -> amount
pub const DELEGATEE_UNLOCKS: Map<(&Addr, u64), Uint128> = Map::new("delegatee_unlocks");

/// Registered reward tokens in the order they were added
pub const REWARD_TOKENS: Item<Vec<Addr>> = Item::new("reward_tokens");
/// Stream state per reward token
pub const REWARD_DATA: Map<&Addr, RewardData> = Map::new("reward_data");
/// Key (reward token, distributor) -> approved
pub const REWARD_DISTRIBUTORS: Map<(&Addr, &Addr), bool> = Map::new("reward_distributors");
/// Key (account, reward token) -> reward accounting
pub const USER_DATA: Map<(&Addr, &Addr), UserData> = Map::new("user_data");
