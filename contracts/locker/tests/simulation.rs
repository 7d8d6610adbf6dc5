use anyhow::Result;
use cosmwasm_std::Addr;
use cw_multi_test::AppResponse;
use proptest::prelude::*;

use crate::common::helper::Helper;

mod common;

#[derive(Clone, Debug)]
enum Event {
    Lock(u128),
    ProcessExpiredLocks(bool),
    Kick(String),
    Delegate(String),
    GetReward,
}

use Event::*;

struct Simulator {
    helper: Helper,
}

impl Simulator {
    fn new() -> Self {
        let mut helper = Helper::new();
        let reward_token = helper.reward_token.clone();
        let distributor = helper.distributor.clone();
        helper.add_reward(&reward_token, &distributor).unwrap();

        Self { helper }
    }

    fn lock(&mut self, user: &Addr, amount: u128) -> Result<AppResponse> {
        let resp = self.helper.lock(user, amount)?;
        // Every locker routes votes to itself from the very first lock
        if self.helper.delegates(user)?.is_none() {
            self.helper.delegate(user, user.as_str())?;
        }
        Ok(resp)
    }

    fn next_epoch(&mut self) -> Result<AppResponse> {
        self.helper.next_epochs(1);
        // Keeps a reward stream running so accrual is exercised
        let reward_token = self.helper.reward_token.clone();
        let distributor = self.helper.distributor.clone();
        self.helper
            .queue_rewards(&reward_token, &distributor, 1_000_000)
    }

    fn event_router(&mut self, user: &str, event: Event) {
        println!("User {} Event {:?}", user, event);
        let user = Addr::unchecked(user);
        let result = match event {
            Lock(amount) => self.lock(&user, amount),
            ProcessExpiredLocks(relock) => self.helper.process_expired_locks(&user, relock),
            Kick(account) => self.helper.kick(&user, &Addr::unchecked(account)),
            Delegate(to) => self.helper.delegate(&user, &to),
            GetReward => self.helper.get_reward(&user, false),
        };
        if let Err(err) = result {
            dbg!(err.root_cause().to_string());
        }
    }

    fn check_invariants(&self, users: &[String]) {
        let mut locked = 0u128;
        let mut balances = 0u128;
        let mut votes = 0u128;

        for user in users {
            let user = Addr::unchecked(user);
            let account = self.helper.account_balance(&user).unwrap();
            let unprocessed = self.helper.locked_balances(&user).unwrap();
            assert_eq!(account.locked, unprocessed.total);
            assert_eq!(
                unprocessed.total,
                unprocessed.locked + unprocessed.unlockable
            );

            locked += account.locked.u128();
            balances += self.helper.balance(&user).unwrap();
            votes += self.helper.votes(&user).unwrap();
        }

        assert_eq!(self.helper.locked_supply().unwrap().u128(), locked);
        let total_supply = self.helper.total_supply().unwrap().u128();
        assert_eq!(total_supply, balances);
        assert_eq!(total_supply, votes);
    }

    fn check_rewards(&self, users: &[String], funded: u128) {
        let reward_token = self.helper.reward_token.clone();
        let claimable: u128 = users
            .iter()
            .map(|user| {
                let user = Addr::unchecked(user);
                let earned = self
                    .helper
                    .claimable_rewards(&user)
                    .unwrap()
                    .into_iter()
                    .map(|earned| earned.amount.u128())
                    .sum::<u128>();
                earned + self.helper.token_balance(&reward_token, &user)
            })
            .sum();
        assert!(claimable <= funded, "{claimable} > {funded}");
    }
}

const MAX_PERIOD: usize = 30;
const MAX_EVENTS: usize = 100;
const USERS: [&str; 4] = ["alice", "bob", "carol", "dave"];

fn events_strategy() -> impl Strategy<Value = Event> {
    let users = USERS.iter().map(|user| user.to_string()).collect::<Vec<_>>();
    prop_oneof![
        4 => (1u128..=10_000u128).prop_map(Lock),
        3 => any::<bool>().prop_map(ProcessExpiredLocks),
        1 => prop::sample::select(users.clone()).prop_map(Kick),
        2 => prop::sample::select(users).prop_map(Delegate),
        1 => Just(GetReward),
    ]
}

fn generate_cases() -> impl Strategy<Value = Vec<(usize, String, Event)>> {
    let users = USERS.iter().map(|user| user.to_string()).collect::<Vec<_>>();
    prop::collection::vec(
        (
            1..=MAX_PERIOD,
            prop::sample::select(users),
            events_strategy(),
        ),
        0..MAX_EVENTS,
    )
}

fn run_simulation(events_tuples: Vec<(usize, String, Event)>) {
    let users = USERS.iter().map(|user| user.to_string()).collect::<Vec<_>>();
    let mut events: Vec<Vec<(String, Event)>> = vec![vec![]; MAX_PERIOD + 1];
    for (period, user, event) in events_tuples {
        events[period].push((user, event));
    }

    let mut simulator = Simulator::new();
    let mut funded = 0u128;

    for period_events in events.into_iter().skip(1) {
        for (user, event) in period_events {
            simulator.event_router(&user, event);
            simulator.check_invariants(&users);
        }

        simulator.next_epoch().unwrap();
        funded += 1_000_000;
        simulator.check_invariants(&users);
        simulator.check_rewards(&users, funded);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn run_simulations(case in generate_cases()) {
        run_simulation(case);
    }
}

#[test]
fn exact_simulation() {
    let case = vec![
        (1, "alice", Lock(1000)),
        (1, "bob", Lock(500)),
        (2, "bob", Delegate("alice".to_string())),
        (5, "carol", Lock(300)),
        (5, "alice", Delegate("carol".to_string())),
        (17, "bob", ProcessExpiredLocks(true)),
        (18, "alice", ProcessExpiredLocks(false)),
        (18, "carol", GetReward),
        (26, "dave", Kick("carol".to_string())),
        (27, "bob", Delegate("bob".to_string())),
        (29, "alice", Lock(42)),
    ];

    run_simulation(
        case.into_iter()
            .map(|(period, user, event)| (period, user.to_string(), event))
            .collect(),
    );
}
