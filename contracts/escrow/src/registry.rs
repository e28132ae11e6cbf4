//! Client side of the asset registry holding the property titles.
//!
//! Only the calls the escrow makes are declared here; any registry contract
//! exposing functions with these names and argument lists can back a sale.

use soroban_sdk::{contractclient, xdr::ScErrorType, Address, Env, Error};

use crate::types::EscrowError;

#[contractclient(name = "AssetRegistryClient")]
pub trait AssetRegistry {
    fn owner_of(env: Env, token_id: u64) -> Address;

    fn transfer_from(env: Env, spender: Address, from: Address, to: Address, token_id: u64);
}

/// Current owner of `token_id`, or `None` if the registry rejects the id.
///
/// Only a contract error from the registry means "unknown token". A trap,
/// a missing contract or a malformed reply is `RegistryUnavailable`.
pub fn owner_of(
    env: &Env,
    registry: &Address,
    token_id: u64,
) -> Result<Option<Address>, EscrowError> {
    match AssetRegistryClient::new(env, registry).try_owner_of(&token_id) {
        Ok(Ok(owner)) => Ok(Some(owner)),
        Err(Ok(err)) if is_contract_error(&err) => Ok(None),
        _ => Err(EscrowError::RegistryUnavailable),
    }
}

/// Move `token_id` with the escrow contract acting as spender.
pub fn move_asset(
    env: &Env,
    registry: &Address,
    from: &Address,
    to: &Address,
    token_id: u64,
) -> Result<(), EscrowError> {
    let spender = env.current_contract_address();
    match AssetRegistryClient::new(env, registry).try_transfer_from(&spender, from, to, &token_id)
    {
        Ok(Ok(())) => Ok(()),
        Err(Ok(err)) if is_contract_error(&err) => Err(EscrowError::AssetTransferFailed),
        _ => Err(EscrowError::RegistryUnavailable),
    }
}

fn is_contract_error(err: &Error) -> bool {
    err.is_type(ScErrorType::Contract)
}
