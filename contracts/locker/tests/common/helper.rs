#![allow(dead_code)]

use anyhow::Result as AnyResult;
use cosmwasm_std::{to_json_binary, Addr, BlockInfo, StdResult, Timestamp, Uint128};
use cw20::{BalanceResponse, Cw20ExecuteMsg, Cw20QueryMsg, MinterResponse};
use cw_multi_test::{no_init, AppBuilder, AppResponse, BasicApp, Executor};

use yield_governance::locker::{
    Balances, Checkpoint, Config, Cw20HookMsg, EarnedData, ExecuteMsg, InstantiateMsg,
    LockedBalancesResponse, QueryMsg, RewardData,
};
use yield_governance::utils::{get_epoch, EPOCH_LENGTH};

use crate::common::contracts::{locker_contract, token_contract};

/// Epoch in which the locker is instantiated
pub const GENESIS_EPOCH: u64 = 2600;

pub struct Helper {
    pub app: BasicApp,
    pub owner: Addr,
    pub token_code_id: u64,
    pub staking_token: Addr,
    pub reward_token: Addr,
    pub distributor: Addr,
    pub locker: Addr,
}

impl Helper {
    pub fn new() -> Self {
        let mut app = AppBuilder::new()
            .with_block(BlockInfo {
                height: 1,
                time: Timestamp::from_seconds(GENESIS_EPOCH * EPOCH_LENGTH),
                chain_id: "cw-multitest-1".to_string(),
            })
            .build(no_init);
        let owner = Addr::unchecked("owner");
        let distributor = Addr::unchecked("distributor");

        let token_code_id = app.store_code(token_contract());
        let locker_code_id = app.store_code(locker_contract());

        let staking_token = init_token(&mut app, token_code_id, &owner, "STK");
        let reward_token = init_token(&mut app, token_code_id, &owner, "RWD");

        let locker = app
            .instantiate_contract(
                locker_code_id,
                owner.clone(),
                &InstantiateMsg {
                    owner: owner.to_string(),
                    staking_token: staking_token.to_string(),
                    name: "Vote Locked STK".to_string(),
                    symbol: "vlSTK".to_string(),
                    decimals: 6,
                },
                &[],
                "Locker",
                None,
            )
            .unwrap();

        Self {
            app,
            owner,
            token_code_id,
            staking_token,
            reward_token,
            distributor,
            locker,
        }
    }

    /// Instantiates one more CW20 token with the owner as minter.
    pub fn create_token(&mut self, symbol: &str) -> Addr {
        init_token(&mut self.app, self.token_code_id, &self.owner, symbol)
    }

    pub fn mint(&mut self, token: &Addr, recipient: &Addr, amount: u128) -> AnyResult<AppResponse> {
        self.app.execute_contract(
            self.owner.clone(),
            token.clone(),
            &Cw20ExecuteMsg::Mint {
                recipient: recipient.to_string(),
                amount: amount.into(),
            },
            &[],
        )
    }

    fn send(
        &mut self,
        token: &Addr,
        sender: &Addr,
        amount: u128,
        hook: &Cw20HookMsg,
    ) -> AnyResult<AppResponse> {
        self.mint(token, sender, amount)?;
        self.app.execute_contract(
            sender.clone(),
            token.clone(),
            &Cw20ExecuteMsg::Send {
                contract: self.locker.to_string(),
                amount: amount.into(),
                msg: to_json_binary(hook)?,
            },
            &[],
        )
    }

    /// Mints staking tokens to `user` and locks them.
    pub fn lock(&mut self, user: &Addr, amount: u128) -> AnyResult<AppResponse> {
        let token = self.staking_token.clone();
        self.send(&token, user, amount, &Cw20HookMsg::Lock { account: None })
    }

    pub fn lock_for(
        &mut self,
        sender: &Addr,
        account: &Addr,
        amount: u128,
    ) -> AnyResult<AppResponse> {
        let token = self.staking_token.clone();
        self.send(
            &token,
            sender,
            amount,
            &Cw20HookMsg::Lock {
                account: Some(account.to_string()),
            },
        )
    }

    pub fn notify_reward(
        &mut self,
        token: &Addr,
        distributor: &Addr,
        amount: u128,
    ) -> AnyResult<AppResponse> {
        self.send(token, distributor, amount, &Cw20HookMsg::NotifyRewardAmount {})
    }

    pub fn queue_rewards(
        &mut self,
        token: &Addr,
        distributor: &Addr,
        amount: u128,
    ) -> AnyResult<AppResponse> {
        self.send(token, distributor, amount, &Cw20HookMsg::QueueNewRewards {})
    }

    pub fn execute(&mut self, sender: &Addr, msg: &ExecuteMsg) -> AnyResult<AppResponse> {
        self.app
            .execute_contract(sender.clone(), self.locker.clone(), msg, &[])
    }

    pub fn checkpoint_epoch(&mut self, sender: &Addr) -> AnyResult<AppResponse> {
        self.execute(sender, &ExecuteMsg::CheckpointEpoch {})
    }

    pub fn process_expired_locks(&mut self, user: &Addr, relock: bool) -> AnyResult<AppResponse> {
        self.execute(user, &ExecuteMsg::ProcessExpiredLocks { relock })
    }

    pub fn kick(&mut self, kicker: &Addr, account: &Addr) -> AnyResult<AppResponse> {
        self.execute(
            kicker,
            &ExecuteMsg::KickExpiredLocks {
                account: account.to_string(),
            },
        )
    }

    pub fn emergency_withdraw(&mut self, user: &Addr) -> AnyResult<AppResponse> {
        self.execute(user, &ExecuteMsg::EmergencyWithdraw {})
    }

    pub fn delegate(&mut self, user: &Addr, to: &str) -> AnyResult<AppResponse> {
        self.execute(user, &ExecuteMsg::Delegate { to: to.to_string() })
    }

    pub fn get_reward(&mut self, user: &Addr, relock: bool) -> AnyResult<AppResponse> {
        self.execute(
            user,
            &ExecuteMsg::GetReward {
                account: None,
                token: None,
                relock: Some(relock),
            },
        )
    }

    pub fn add_reward(&mut self, token: &Addr, distributor: &Addr) -> AnyResult<AppResponse> {
        let owner = self.owner.clone();
        self.execute(
            &owner,
            &ExecuteMsg::AddReward {
                token: token.to_string(),
                distributor: distributor.to_string(),
            },
        )
    }

    pub fn shutdown(&mut self, sender: &Addr) -> AnyResult<AppResponse> {
        self.execute(sender, &ExecuteMsg::Shutdown {})
    }

    pub fn timetravel(&mut self, time: u64) {
        self.app.update_block(|block| {
            block.time = block.time.plus_seconds(time);
            block.height += time / 5;
        })
    }

    pub fn next_epochs(&mut self, epochs: u64) {
        self.timetravel(epochs * EPOCH_LENGTH)
    }

    pub fn now(&self) -> u64 {
        self.app.block_info().time.seconds()
    }

    pub fn current_epoch(&self) -> u64 {
        get_epoch(self.now())
    }

    pub fn token_balance(&self, token: &Addr, user: &Addr) -> u128 {
        let resp: BalanceResponse = self
            .app
            .wrap()
            .query_wasm_smart(
                token,
                &Cw20QueryMsg::Balance {
                    address: user.to_string(),
                },
            )
            .unwrap();
        resp.balance.u128()
    }

    pub fn config(&self) -> StdResult<Config> {
        self.app
            .wrap()
            .query_wasm_smart(&self.locker, &QueryMsg::Config {})
    }

    pub fn balance(&self, user: &Addr) -> StdResult<u128> {
        let resp: BalanceResponse = self.app.wrap().query_wasm_smart(
            &self.locker,
            &QueryMsg::Balance {
                address: user.to_string(),
            },
        )?;
        Ok(resp.balance.u128())
    }

    pub fn balance_at_epoch(&self, user: &Addr, epoch: u64) -> StdResult<Uint128> {
        self.app.wrap().query_wasm_smart(
            &self.locker,
            &QueryMsg::BalanceAtEpoch {
                address: user.to_string(),
                epoch,
            },
        )
    }

    pub fn total_supply(&self) -> StdResult<Uint128> {
        self.app
            .wrap()
            .query_wasm_smart(&self.locker, &QueryMsg::TotalSupply {})
    }

    pub fn total_supply_at_epoch(&self, epoch: u64) -> StdResult<Uint128> {
        self.app
            .wrap()
            .query_wasm_smart(&self.locker, &QueryMsg::TotalSupplyAtEpoch { epoch })
    }

    pub fn past_total_supply(&self, timestamp: u64) -> StdResult<Uint128> {
        self.app
            .wrap()
            .query_wasm_smart(&self.locker, &QueryMsg::PastTotalSupply { timestamp })
    }

    pub fn locked_supply(&self) -> StdResult<Uint128> {
        self.app
            .wrap()
            .query_wasm_smart(&self.locker, &QueryMsg::LockedSupply {})
    }

    pub fn locked_balances(&self, user: &Addr) -> StdResult<LockedBalancesResponse> {
        self.app.wrap().query_wasm_smart(
            &self.locker,
            &QueryMsg::LockedBalances {
                address: user.to_string(),
            },
        )
    }

    pub fn account_balance(&self, user: &Addr) -> StdResult<Balances> {
        self.app.wrap().query_wasm_smart(
            &self.locker,
            &QueryMsg::AccountBalance {
                address: user.to_string(),
            },
        )
    }

    pub fn epoch_count(&self) -> StdResult<u64> {
        self.app
            .wrap()
            .query_wasm_smart(&self.locker, &QueryMsg::EpochCount {})
    }

    pub fn votes(&self, user: &Addr) -> StdResult<u128> {
        let votes: Uint128 = self.app.wrap().query_wasm_smart(
            &self.locker,
            &QueryMsg::Votes {
                address: user.to_string(),
            },
        )?;
        Ok(votes.u128())
    }

    pub fn past_votes(&self, user: &Addr, timestamp: u64) -> StdResult<Uint128> {
        self.app.wrap().query_wasm_smart(
            &self.locker,
            &QueryMsg::PastVotes {
                address: user.to_string(),
                timestamp,
            },
        )
    }

    pub fn delegates(&self, user: &Addr) -> StdResult<Option<Addr>> {
        self.app.wrap().query_wasm_smart(
            &self.locker,
            &QueryMsg::Delegates {
                address: user.to_string(),
            },
        )
    }

    pub fn num_checkpoints(&self, user: &Addr) -> StdResult<u32> {
        self.app.wrap().query_wasm_smart(
            &self.locker,
            &QueryMsg::NumCheckpoints {
                address: user.to_string(),
            },
        )
    }

    pub fn checkpoint(&self, user: &Addr, index: u32) -> StdResult<Checkpoint> {
        self.app.wrap().query_wasm_smart(
            &self.locker,
            &QueryMsg::Checkpoint {
                address: user.to_string(),
                index,
            },
        )
    }

    pub fn reward_data(&self, token: &Addr) -> StdResult<RewardData> {
        self.app.wrap().query_wasm_smart(
            &self.locker,
            &QueryMsg::RewardData {
                token: token.to_string(),
            },
        )
    }

    pub fn claimable_rewards(&self, user: &Addr) -> StdResult<Vec<EarnedData>> {
        self.app.wrap().query_wasm_smart(
            &self.locker,
            &QueryMsg::ClaimableRewards {
                address: user.to_string(),
            },
        )
    }
}

fn init_token(app: &mut BasicApp, code_id: u64, owner: &Addr, symbol: &str) -> Addr {
    app.instantiate_contract(
        code_id,
        owner.clone(),
        &cw20_base::msg::InstantiateMsg {
            name: format!("{symbol} token"),
            symbol: symbol.to_string(),
            decimals: 6,
            initial_balances: vec![],
            mint: Some(MinterResponse {
                minter: owner.to_string(),
                cap: None,
            }),
            marketing: None,
        },
        &[],
        symbol,
        None,
    )
    .unwrap()
}
