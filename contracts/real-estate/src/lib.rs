//! Real Estate Registry Contract
//!
//! Unique-asset ledger for tokenized property titles. Every token id names
//! exactly one property. The registry tracks its current owner, a metadata
//! URI, and at most one approved custodian that may move the token on the
//! owner's behalf (the escrow contract, during a sale).

#![no_std]

use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, symbol_short, Address, Env, String,
};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[contracterror]
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum RegistryError {
    TokenNotFound = 1,
    NotOwner = 2,
    NotApproved = 3,
}

/// Storage keys for the registry.
#[contracttype]
#[derive(Clone, Debug)]
pub enum DataKey {
    /// Number of tokens minted so far; also the last assigned id.
    TotalSupply,
    Owner(u64),
    Approved(u64),
    TokenUri(u64),
    Balance(Address),
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

#[contract]
pub struct RealEstate;

#[contractimpl]
impl RealEstate {
    /// Mint a new property token.
    ///
    /// # Arguments
    /// * `owner` - Address receiving the token (must authorize)
    /// * `token_uri` - Location of the property metadata document
    ///
    /// # Returns
    /// The sequential token id, starting at 1
    ///
    /// # Events
    /// Emits `mint` with `(token_id, owner)`
    pub fn mint(env: Env, owner: Address, token_uri: String) -> u64 {
        owner.require_auth();

        let token_id = Self::total_supply(env.clone()) + 1;

        env.storage()
            .persistent()
            .set(&DataKey::Owner(token_id), &owner);
        env.storage()
            .persistent()
            .set(&DataKey::TokenUri(token_id), &token_uri);
        env.storage()
            .instance()
            .set(&DataKey::TotalSupply, &token_id);
        Self::credit(&env, &owner);

        env.events()
            .publish((symbol_short!("mint"),), (token_id, owner));

        token_id
    }

    /// Current owner of `token_id`.
    pub fn owner_of(env: Env, token_id: u64) -> Result<Address, RegistryError> {
        env.storage()
            .persistent()
            .get(&DataKey::Owner(token_id))
            .ok_or(RegistryError::TokenNotFound)
    }

    /// Metadata URI recorded at mint time.
    pub fn token_uri(env: Env, token_id: u64) -> Result<String, RegistryError> {
        env.storage()
            .persistent()
            .get(&DataKey::TokenUri(token_id))
            .ok_or(RegistryError::TokenNotFound)
    }

    /// Number of tokens held by `owner`.
    pub fn balance_of(env: Env, owner: Address) -> u64 {
        env.storage()
            .persistent()
            .get(&DataKey::Balance(owner))
            .unwrap_or(0)
    }

    pub fn total_supply(env: Env) -> u64 {
        env.storage()
            .instance()
            .get(&DataKey::TotalSupply)
            .unwrap_or(0)
    }

    /// Authorize `operator` to move `token_id` on the owner's behalf.
    ///
    /// Replaces any previous approval for the token.
    ///
    /// # Arguments
    /// * `caller` - Current owner of the token (must authorize)
    /// * `operator` - Custodian allowed to call `transfer_from`
    /// * `token_id` - Token being approved
    ///
    /// # Events
    /// Emits `approve` with `(token_id, caller, operator)`
    pub fn approve(
        env: Env,
        caller: Address,
        operator: Address,
        token_id: u64,
    ) -> Result<(), RegistryError> {
        caller.require_auth();

        let owner = Self::owner_of(env.clone(), token_id)?;
        if owner != caller {
            return Err(RegistryError::NotOwner);
        }

        env.storage()
            .persistent()
            .set(&DataKey::Approved(token_id), &operator);

        env.events()
            .publish((symbol_short!("approve"),), (token_id, caller, operator));

        Ok(())
    }

    /// Address currently approved to move `token_id`, if any.
    pub fn get_approved(env: Env, token_id: u64) -> Option<Address> {
        env.storage().persistent().get(&DataKey::Approved(token_id))
    }

    /// Move `token_id` from `from` to `to`.
    ///
    /// The spender must be the owner or the approved custodian. Any
    /// outstanding approval is cleared by the transfer.
    ///
    /// # Events
    /// Emits `transfer` with `(token_id, from, to)`
    pub fn transfer_from(
        env: Env,
        spender: Address,
        from: Address,
        to: Address,
        token_id: u64,
    ) -> Result<(), RegistryError> {
        spender.require_auth();

        let owner = Self::owner_of(env.clone(), token_id)?;
        if owner != from {
            return Err(RegistryError::NotOwner);
        }

        if spender != owner {
            let approved: Option<Address> =
                env.storage().persistent().get(&DataKey::Approved(token_id));
            if approved.as_ref() != Some(&spender) {
                return Err(RegistryError::NotApproved);
            }
        }

        env.storage()
            .persistent()
            .remove(&DataKey::Approved(token_id));
        env.storage()
            .persistent()
            .set(&DataKey::Owner(token_id), &to);
        Self::debit(&env, &from);
        Self::credit(&env, &to);

        env.events()
            .publish((symbol_short!("transfer"),), (token_id, from, to));

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn credit(env: &Env, owner: &Address) {
        let key = DataKey::Balance(owner.clone());
        let current: u64 = env.storage().persistent().get(&key).unwrap_or(0);
        env.storage().persistent().set(&key, &(current + 1));
    }

    fn debit(env: &Env, owner: &Address) {
        let key = DataKey::Balance(owner.clone());
        let current: u64 = env.storage().persistent().get(&key).unwrap_or(0);
        env.storage()
            .persistent()
            .set(&key, &current.saturating_sub(1));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use soroban_sdk::{testutils::Address as _, Address, Env, String};

    const PROPERTY_URI: &str =
        "https://ipfs.io/ipfs/QmQVcpsjrA6cr1iJjZAodYwmPekYgbnXGo4DFubJiLc2EB/1.json";

    fn setup() -> (Env, RealEstateClient<'static>) {
        let env = Env::default();
        env.mock_all_auths();

        let contract_id = env.register(RealEstate, ());
        let client = RealEstateClient::new(&env, &contract_id);

        (env, client)
    }

    #[test]
    fn test_mint_assigns_sequential_ids() {
        let (env, client) = setup();
        let owner = Address::generate(&env);
        let uri = String::from_str(&env, PROPERTY_URI);

        assert_eq!(client.total_supply(), 0);
        assert_eq!(client.mint(&owner, &uri), 1);
        assert_eq!(client.mint(&owner, &uri), 2);

        assert_eq!(client.total_supply(), 2);
        assert_eq!(client.balance_of(&owner), 2);
        assert_eq!(client.owner_of(&1), owner);
        assert_eq!(client.token_uri(&1), uri);
    }

    #[test]
    fn test_unknown_token() {
        let (_env, client) = setup();
        assert_eq!(client.try_owner_of(&42), Err(Ok(RegistryError::TokenNotFound)));
        assert_eq!(client.try_token_uri(&42), Err(Ok(RegistryError::TokenNotFound)));
        assert!(client.get_approved(&42).is_none());
    }

    #[test]
    fn test_approve_requires_owner() {
        let (env, client) = setup();
        let owner = Address::generate(&env);
        let stranger = Address::generate(&env);
        let custodian = Address::generate(&env);
        let id = client.mint(&owner, &String::from_str(&env, PROPERTY_URI));

        assert_eq!(
            client.try_approve(&stranger, &custodian, &id),
            Err(Ok(RegistryError::NotOwner))
        );

        client.approve(&owner, &custodian, &id);
        assert_eq!(client.get_approved(&id), Some(custodian));
    }

    #[test]
    fn test_custodian_transfer_clears_approval() {
        let (env, client) = setup();
        let owner = Address::generate(&env);
        let custodian = Address::generate(&env);
        let id = client.mint(&owner, &String::from_str(&env, PROPERTY_URI));

        client.approve(&owner, &custodian, &id);
        client.transfer_from(&custodian, &owner, &custodian, &id);

        assert_eq!(client.owner_of(&id), custodian);
        assert!(client.get_approved(&id).is_none());
        assert_eq!(client.balance_of(&owner), 0);
        assert_eq!(client.balance_of(&custodian), 1);

        // The previous owner lost control over the token
        assert_eq!(
            client.try_transfer_from(&owner, &custodian, &owner, &id),
            Err(Ok(RegistryError::NotApproved))
        );
    }

    #[test]
    fn test_owner_transfers_directly() {
        let (env, client) = setup();
        let owner = Address::generate(&env);
        let buyer = Address::generate(&env);
        let id = client.mint(&owner, &String::from_str(&env, PROPERTY_URI));

        client.transfer_from(&owner, &owner, &buyer, &id);
        assert_eq!(client.owner_of(&id), buyer);
    }

    #[test]
    fn test_transfer_without_approval() {
        let (env, client) = setup();
        let owner = Address::generate(&env);
        let stranger = Address::generate(&env);
        let id = client.mint(&owner, &String::from_str(&env, PROPERTY_URI));

        assert_eq!(
            client.try_transfer_from(&stranger, &owner, &stranger, &id),
            Err(Ok(RegistryError::NotApproved))
        );
        assert_eq!(client.owner_of(&id), owner);
    }

    #[test]
    fn test_transfer_from_wrong_owner() {
        let (env, client) = setup();
        let owner = Address::generate(&env);
        let other = Address::generate(&env);
        let id = client.mint(&owner, &String::from_str(&env, PROPERTY_URI));

        assert_eq!(
            client.try_transfer_from(&other, &other, &owner, &id),
            Err(Ok(RegistryError::NotOwner))
        );
    }
}
