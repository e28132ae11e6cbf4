//! Role checks for escrow operations.
//!
//! Kept free of storage access so the role table can be tested on its own.
//! The caller still has to `require_auth` before anything is written.

use soroban_sdk::Address;

use crate::types::{Config, EscrowError, Listing};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    List,
    DepositEarnest,
    UpdateInspection,
    Approve,
    Finalize,
    Cancel,
}

/// Decide whether `caller` may perform `op`.
///
/// `DepositEarnest` and `Approve` depend on the listing's buyer and fail with
/// `NotListed` when no listing is given. The other operations only look at
/// the fixed roles in `config`.
pub fn authorize(
    op: Operation,
    caller: &Address,
    config: &Config,
    listing: Option<&Listing>,
) -> Result<(), EscrowError> {
    let allowed = match op {
        Operation::List | Operation::Finalize | Operation::Cancel => *caller == config.seller,
        Operation::UpdateInspection => *caller == config.inspector,
        Operation::DepositEarnest => {
            let listing = listing.ok_or(EscrowError::NotListed)?;
            *caller == listing.buyer
        }
        Operation::Approve => {
            let listing = listing.ok_or(EscrowError::NotListed)?;
            *caller == listing.buyer || *caller == config.seller || *caller == config.lender
        }
    };

    if allowed {
        Ok(())
    } else {
        Err(EscrowError::Unauthorized)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::ListingStatus;
    use soroban_sdk::{testutils::Address as _, Env};

    struct Parties {
        config: Config,
        listing: Listing,
        buyer: Address,
        stranger: Address,
    }

    fn parties(env: &Env) -> Parties {
        let buyer = Address::generate(env);
        let config = Config {
            asset_registry: Address::generate(env),
            payment_token: Address::generate(env),
            seller: Address::generate(env),
            inspector: Address::generate(env),
            lender: Address::generate(env),
        };
        let listing = Listing {
            token_id: 1,
            buyer: buyer.clone(),
            purchase_price: 10,
            escrow_amount: 5,
            inspection_passed: false,
            earnest_deposited: 0,
            status: ListingStatus::Active,
            listed_at: 0,
        };

        Parties {
            config,
            listing,
            buyer,
            stranger: Address::generate(env),
        }
    }

    #[test]
    fn test_seller_only_operations() {
        let env = Env::default();
        let p = parties(&env);

        for op in [Operation::List, Operation::Finalize, Operation::Cancel] {
            assert_eq!(authorize(op, &p.config.seller, &p.config, None), Ok(()));
            for other in [&p.buyer, &p.config.inspector, &p.config.lender, &p.stranger] {
                assert_eq!(
                    authorize(op, other, &p.config, Some(&p.listing)),
                    Err(EscrowError::Unauthorized)
                );
            }
        }
    }

    #[test]
    fn test_inspection_is_inspector_only() {
        let env = Env::default();
        let p = parties(&env);

        assert_eq!(
            authorize(Operation::UpdateInspection, &p.config.inspector, &p.config, None),
            Ok(())
        );
        for other in [&p.buyer, &p.config.seller, &p.config.lender] {
            assert_eq!(
                authorize(Operation::UpdateInspection, other, &p.config, Some(&p.listing)),
                Err(EscrowError::Unauthorized)
            );
        }
    }

    #[test]
    fn test_deposit_is_listing_buyer_only() {
        let env = Env::default();
        let p = parties(&env);

        assert_eq!(
            authorize(Operation::DepositEarnest, &p.buyer, &p.config, Some(&p.listing)),
            Ok(())
        );
        assert_eq!(
            authorize(Operation::DepositEarnest, &p.config.lender, &p.config, Some(&p.listing)),
            Err(EscrowError::Unauthorized)
        );
        assert_eq!(
            authorize(Operation::DepositEarnest, &p.buyer, &p.config, None),
            Err(EscrowError::NotListed)
        );
    }

    #[test]
    fn test_approve_parties() {
        let env = Env::default();
        let p = parties(&env);

        for party in [&p.buyer, &p.config.seller, &p.config.lender] {
            assert_eq!(
                authorize(Operation::Approve, party, &p.config, Some(&p.listing)),
                Ok(())
            );
        }
        for other in [&p.config.inspector, &p.stranger] {
            assert_eq!(
                authorize(Operation::Approve, other, &p.config, Some(&p.listing)),
                Err(EscrowError::Unauthorized)
            );
        }
    }
}
