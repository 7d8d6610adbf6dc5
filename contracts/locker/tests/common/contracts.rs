use cosmwasm_std::Empty;
use cw_multi_test::{Contract, ContractWrapper};

pub fn locker_contract() -> Box<dyn Contract<Empty>> {
    Box::new(ContractWrapper::new_with_empty(
        yield_locker::execute::execute,
        yield_locker::instantiate::instantiate,
        yield_locker::query::query,
    ))
}

pub fn token_contract() -> Box<dyn Contract<Empty>> {
    Box::new(ContractWrapper::new_with_empty(
        cw20_base::contract::execute,
        cw20_base::contract::instantiate,
        cw20_base::contract::query,
    ))
}
