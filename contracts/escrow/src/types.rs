//! Error codes, configuration and listing records of the escrow contract.

use soroban_sdk::{contracterror, contracttype, Address};

/// Codes start at 101 so they never overlap the token or registry
/// contract codes that a failed cross-contract call would carry.
#[contracterror]
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum EscrowError {
    AlreadyInitialized = 101,
    NotInitialized = 102,
    Unauthorized = 103,
    /// Inspection, approvals or funding are not in place.
    ConditionNotMet = 104,
    AlreadyListed = 105,
    NotListed = 106,
    ListingClosed = 107,
    InvalidAmount = 108,
    AssetNotOwned = 109,
    /// The registry refused to move the title.
    AssetTransferFailed = 110,
    MathOverflow = 111,
    /// The payer holds less than the amount being paid.
    InsufficientFunds = 112,
    /// The payment token rejected a transfer.
    PaymentFailed = 113,
    /// The registry call trapped or returned something unreadable.
    RegistryUnavailable = 114,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ListingStatus {
    Active = 0,
    Sold = 1,
    Cancelled = 2,
}

/// Fixed parties and collaborators, set once at `initialize`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub asset_registry: Address,
    /// Token the purchase price is paid in.
    pub payment_token: Address,
    pub seller: Address,
    pub inspector: Address,
    pub lender: Address,
}

/// Sale record for one property held in custody.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Listing {
    pub token_id: u64,
    pub buyer: Address,
    pub purchase_price: i128,
    /// Earnest the buyer is expected to put down.
    pub escrow_amount: i128,
    pub inspection_passed: bool,
    /// Sum of the buyer's deposits for this listing. Bounds the cancel payout.
    pub earnest_deposited: i128,
    pub status: ListingStatus,
    pub listed_at: u64,
}

impl Listing {
    pub fn is_active(&self) -> bool {
        self.status == ListingStatus::Active
    }
}

#[contracttype]
#[derive(Clone, Debug)]
pub enum DataKey {
    Config,
    Listing(u64),
    Approval(u64, Address),
}
