//! Real-Estate Escrow Contract
//!
//! Holds a tokenized property title in custody while a sale from the fixed
//! seller to a per-listing buyer is inspected, approved and funded. The title
//! moves to the buyer and the purchase price moves to the seller in a single
//! `finalize_sale` call, and only once every condition holds. A deal that
//! falls through is closed with `cancel_sale`, which hands the title back to
//! the seller and settles the earnest.
//!
//! Funds are pooled: the contract's balance of the payment token backs every
//! listing, and anyone may top it up with a plain token transfer.

#![no_std]

mod access;
pub mod registry;
mod types;


pub use access::{authorize, Operation};
pub use types::{Config, DataKey, EscrowError, Listing, ListingStatus};

use soroban_sdk::{contract, contractimpl, log, symbol_short, token, Address, Env};

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

#[contract]
pub struct Escrow;

#[contractimpl]
impl Escrow {
    /// Initialize the contract with its collaborators and fixed roles.
    ///
    /// # Arguments
    /// * `asset_registry` - Registry contract holding the property titles
    /// * `payment_token` - Token contract the purchase price is paid in
    /// * `seller` - Only address allowed to list, finalize and cancel
    /// * `inspector` - Only address allowed to record inspection results
    /// * `lender` - Third approving party of every sale
    pub fn initialize(
        env: Env,
        asset_registry: Address,
        payment_token: Address,
        seller: Address,
        inspector: Address,
        lender: Address,
    ) -> Result<(), EscrowError> {
        if env.storage().instance().has(&DataKey::Config) {
            return Err(EscrowError::AlreadyInitialized);
        }

        let config = Config {
            asset_registry: asset_registry.clone(),
            payment_token,
            seller: seller.clone(),
            inspector: inspector.clone(),
            lender: lender.clone(),
        };
        env.storage().instance().set(&DataKey::Config, &config);

        env.events().publish(
            (symbol_short!("esc_init"),),
            (asset_registry, seller, inspector, lender),
        );

        Ok(())
    }

    /// List a property for sale to `buyer`.
    ///
    /// Pulls the title into the contract's custody right away, so the buyer
    /// can check it is escrowed before putting money down. The seller must
    /// have approved this contract on the registry beforehand.
    ///
    /// # Arguments
    /// * `caller` - Must be the seller (must authorize)
    /// * `token_id` - Registry id of the property
    /// * `buyer` - Only address allowed to deposit earnest for this listing
    /// * `purchase_price` - Total price, must be positive
    /// * `escrow_amount` - Expected earnest, between 0 and the price
    ///
    /// # Events
    /// Emits `listed` with `(token_id, buyer, purchase_price, escrow_amount)`
    pub fn list(
        env: Env,
        caller: Address,
        token_id: u64,
        buyer: Address,
        purchase_price: i128,
        escrow_amount: i128,
    ) -> Result<(), EscrowError> {
        let config = Self::load_config(&env)?;
        authorize(Operation::List, &caller, &config, None)?;
        caller.require_auth();

        if env.storage().persistent().has(&DataKey::Listing(token_id)) {
            return Err(EscrowError::AlreadyListed);
        }

        if purchase_price <= 0 || escrow_amount < 0 || escrow_amount > purchase_price {
            return Err(EscrowError::InvalidAmount);
        }

        if registry::owner_of(&env, &config.asset_registry, token_id)?.as_ref()
            != Some(&config.seller)
        {
            return Err(EscrowError::AssetNotOwned);
        }

        let custodian = env.current_contract_address();
        registry::move_asset(
            &env,
            &config.asset_registry,
            &config.seller,
            &custodian,
            token_id,
        )?;

        let listing = Listing {
            token_id,
            buyer: buyer.clone(),
            purchase_price,
            escrow_amount,
            inspection_passed: false,
            earnest_deposited: 0,
            status: ListingStatus::Active,
            listed_at: env.ledger().timestamp(),
        };
        Self::save_listing(&env, &listing);

        env.events().publish(
            (symbol_short!("listed"),),
            (token_id, buyer, purchase_price, escrow_amount),
        );

        Ok(())
    }

    /// Put earnest money down on a listing.
    ///
    /// Transfers `amount` of the payment token from the buyer into the pool.
    /// Deposits accumulate; nothing caps them at `escrow_amount`.
    pub fn deposit_earnest(
        env: Env,
        caller: Address,
        token_id: u64,
        amount: i128,
    ) -> Result<(), EscrowError> {
        let config = Self::load_config(&env)?;
        let mut listing = Self::load_listing(&env, token_id)?;
        authorize(Operation::DepositEarnest, &caller, &config, Some(&listing))?;
        caller.require_auth();
        Self::ensure_active(&listing)?;

        if amount <= 0 {
            return Err(EscrowError::InvalidAmount);
        }

        let token_client = token::Client::new(&env, &config.payment_token);
        if token_client.balance(&caller) < amount {
            return Err(EscrowError::InsufficientFunds);
        }

        listing.earnest_deposited = listing
            .earnest_deposited
            .checked_add(amount)
            .ok_or(EscrowError::MathOverflow)?;

        Self::pay(&token_client, &caller, &env.current_contract_address(), amount)?;

        Self::save_listing(&env, &listing);

        env.events()
            .publish((symbol_short!("deposit"),), (token_id, caller, amount));

        Ok(())
    }

    /// Record the inspection result. Last write wins.
    pub fn update_inspection_status(
        env: Env,
        caller: Address,
        token_id: u64,
        passed: bool,
    ) -> Result<(), EscrowError> {
        let config = Self::load_config(&env)?;
        authorize(Operation::UpdateInspection, &caller, &config, None)?;
        caller.require_auth();

        let mut listing = Self::load_listing(&env, token_id)?;
        Self::ensure_active(&listing)?;

        listing.inspection_passed = passed;
        Self::save_listing(&env, &listing);

        env.events()
            .publish((symbol_short!("inspected"),), (token_id, passed));

        Ok(())
    }

    /// Sign off on the sale as buyer, seller or lender.
    ///
    /// Approvals cannot be withdrawn.
    pub fn approve_sale(env: Env, caller: Address, token_id: u64) -> Result<(), EscrowError> {
        let config = Self::load_config(&env)?;
        let listing = Self::load_listing(&env, token_id)?;
        authorize(Operation::Approve, &caller, &config, Some(&listing))?;
        caller.require_auth();
        Self::ensure_active(&listing)?;

        env.storage()
            .persistent()
            .set(&DataKey::Approval(token_id, caller.clone()), &true);

        env.events()
            .publish((symbol_short!("approved"),), (token_id, caller));

        Ok(())
    }

    /// Complete the sale.
    ///
    /// Requires a passed inspection, approval from buyer, seller and lender,
    /// and a pooled balance covering the purchase price. Pays the seller,
    /// hands the title to the buyer and closes the listing.
    ///
    /// # Events
    /// Emits `sold` with `(token_id, buyer, purchase_price)`
    pub fn finalize_sale(env: Env, caller: Address, token_id: u64) -> Result<(), EscrowError> {
        let config = Self::load_config(&env)?;
        authorize(Operation::Finalize, &caller, &config, None)?;
        caller.require_auth();

        let mut listing = Self::load_listing(&env, token_id)?;
        Self::ensure_active(&listing)?;

        let custodian = env.current_contract_address();
        let token_client = token::Client::new(&env, &config.payment_token);
        let balance = token_client.balance(&custodian);

        let approved = Self::all_approved(&env, &config, &listing);
        if !listing.inspection_passed || !approved || balance < listing.purchase_price {
            log!(
                &env,
                "finalize blocked: token {}, inspection {}, approved {}, balance {}",
                token_id,
                listing.inspection_passed,
                approved,
                balance
            );
            return Err(EscrowError::ConditionNotMet);
        }

        listing.status = ListingStatus::Sold;
        Self::save_listing(&env, &listing);

        Self::pay(&token_client, &custodian, &config.seller, listing.purchase_price)?;
        registry::move_asset(
            &env,
            &config.asset_registry,
            &custodian,
            &listing.buyer,
            token_id,
        )?;

        env.events().publish(
            (symbol_short!("sold"),),
            (token_id, listing.buyer, listing.purchase_price),
        );

        Ok(())
    }

    /// Call the sale off.
    ///
    /// The earnest deposited for this listing goes back to the buyer when the
    /// inspection has not passed, and to the seller as compensation when it
    /// has. Either way the title returns to the seller.
    ///
    /// # Events
    /// Emits `cancelled` with `(token_id, earnest_recipient, earnest)`
    pub fn cancel_sale(env: Env, caller: Address, token_id: u64) -> Result<(), EscrowError> {
        let config = Self::load_config(&env)?;
        authorize(Operation::Cancel, &caller, &config, None)?;
        caller.require_auth();

        let mut listing = Self::load_listing(&env, token_id)?;
        Self::ensure_active(&listing)?;

        let custodian = env.current_contract_address();
        let token_client = token::Client::new(&env, &config.payment_token);
        let earnest = listing.earnest_deposited;

        // The pool is shared, so another sale may already have drawn on it.
        let balance = token_client.balance(&custodian);
        if balance < earnest {
            log!(
                &env,
                "cancel blocked: token {}, earnest {}, balance {}",
                token_id,
                earnest,
                balance
            );
            return Err(EscrowError::ConditionNotMet);
        }

        let recipient = if listing.inspection_passed {
            config.seller.clone()
        } else {
            listing.buyer.clone()
        };

        listing.status = ListingStatus::Cancelled;
        Self::save_listing(&env, &listing);

        if earnest > 0 {
            Self::pay(&token_client, &custodian, &recipient, earnest)?;
        }
        registry::move_asset(
            &env,
            &config.asset_registry,
            &custodian,
            &config.seller,
            token_id,
        )?;

        env.events()
            .publish((symbol_short!("cancelled"),), (token_id, recipient, earnest));

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn asset_registry(env: Env) -> Result<Address, EscrowError> {
        Ok(Self::load_config(&env)?.asset_registry)
    }

    pub fn payment_token(env: Env) -> Result<Address, EscrowError> {
        Ok(Self::load_config(&env)?.payment_token)
    }

    pub fn seller(env: Env) -> Result<Address, EscrowError> {
        Ok(Self::load_config(&env)?.seller)
    }

    pub fn inspector(env: Env) -> Result<Address, EscrowError> {
        Ok(Self::load_config(&env)?.inspector)
    }

    pub fn lender(env: Env) -> Result<Address, EscrowError> {
        Ok(Self::load_config(&env)?.lender)
    }

    /// True once `token_id` has been listed, including after it closed.
    pub fn is_listed(env: Env, token_id: u64) -> bool {
        env.storage().persistent().has(&DataKey::Listing(token_id))
    }

    pub fn buyer(env: Env, token_id: u64) -> Result<Address, EscrowError> {
        Ok(Self::load_listing(&env, token_id)?.buyer)
    }

    pub fn purchase_price(env: Env, token_id: u64) -> Result<i128, EscrowError> {
        Ok(Self::load_listing(&env, token_id)?.purchase_price)
    }

    pub fn escrow_amount(env: Env, token_id: u64) -> Result<i128, EscrowError> {
        Ok(Self::load_listing(&env, token_id)?.escrow_amount)
    }

    pub fn inspection_passed(env: Env, token_id: u64) -> Result<bool, EscrowError> {
        Ok(Self::load_listing(&env, token_id)?.inspection_passed)
    }

    pub fn earnest_deposited(env: Env, token_id: u64) -> Result<i128, EscrowError> {
        Ok(Self::load_listing(&env, token_id)?.earnest_deposited)
    }

    pub fn status(env: Env, token_id: u64) -> Result<ListingStatus, EscrowError> {
        Ok(Self::load_listing(&env, token_id)?.status)
    }

    /// Whether `party` has approved the sale of `token_id`.
    pub fn approval(env: Env, token_id: u64, party: Address) -> bool {
        env.storage()
            .persistent()
            .get(&DataKey::Approval(token_id, party))
            .unwrap_or(false)
    }

    pub fn get_listing(env: Env, token_id: u64) -> Option<Listing> {
        env.storage().persistent().get(&DataKey::Listing(token_id))
    }

    /// Pooled balance of the payment token held by the contract.
    pub fn get_balance(env: Env) -> Result<i128, EscrowError> {
        let config = Self::load_config(&env)?;
        let token_client = token::Client::new(&env, &config.payment_token);
        Ok(token_client.balance(&env.current_contract_address()))
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

impl Escrow {
    fn load_config(env: &Env) -> Result<Config, EscrowError> {
        env.storage()
            .instance()
            .get(&DataKey::Config)
            .ok_or(EscrowError::NotInitialized)
    }

    fn load_listing(env: &Env, token_id: u64) -> Result<Listing, EscrowError> {
        env.storage()
            .persistent()
            .get(&DataKey::Listing(token_id))
            .ok_or(EscrowError::NotListed)
    }

    fn save_listing(env: &Env, listing: &Listing) {
        env.storage()
            .persistent()
            .set(&DataKey::Listing(listing.token_id), listing);
    }

    fn ensure_active(listing: &Listing) -> Result<(), EscrowError> {
        if listing.is_active() {
            Ok(())
        } else {
            Err(EscrowError::ListingClosed)
        }
    }

    fn pay(
        token_client: &token::Client,
        from: &Address,
        to: &Address,
        amount: i128,
    ) -> Result<(), EscrowError> {
        match token_client.try_transfer(from, to, &amount) {
            Ok(Ok(())) => Ok(()),
            _ => Err(EscrowError::PaymentFailed),
        }
    }

    fn all_approved(env: &Env, config: &Config, listing: &Listing) -> bool {
        [&listing.buyer, &config.seller, &config.lender]
            .into_iter()
            .all(|party| Self::approval(env.clone(), listing.token_id, party.clone()))
    }
}
