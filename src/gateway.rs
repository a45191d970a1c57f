use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{AccountId, AssetKind, CollateralRef, CollectionId};

/// asset movement failures, surfaced to callers verbatim
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("please approve NFT first")]
    NotApproved,

    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: u128, requested: u128 },

    #[error("insufficient allowance: allowance {allowance}, requested {requested}")]
    InsufficientAllowance { allowance: u128, requested: u128 },

    #[error("insufficient collateral: available {available}, requested {requested}")]
    InsufficientCollateral { available: u64, requested: u64 },
}

/// one leg of a fungible transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FungibleTransfer {
    pub asset: AssetKind,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: u128,
}

/// abstracts custody: moving collateral and principal between parties
///
/// the engine never touches balances directly; it validates, asks the
/// gateway to move assets, and only then writes ledger state. Batch
/// transfers are all-or-nothing, which is what makes every lifecycle
/// transition atomic.
pub trait AssetTransferGateway {
    /// pull collateral from its owner into engine escrow; requires the
    /// owner to have authorized the engine beforehand
    fn escrow_collateral(
        &mut self,
        owner: &str,
        collateral: &CollateralRef,
    ) -> Result<(), TransferError>;

    /// hand escrowed collateral to a recipient
    fn release_collateral(
        &mut self,
        collateral: &CollateralRef,
        to: &str,
    ) -> Result<(), TransferError>;

    /// move a fungible amount between accounts
    fn transfer_fungible(
        &mut self,
        asset: &AssetKind,
        from: &str,
        to: &str,
        amount: u128,
    ) -> Result<(), TransferError>;

    /// execute several fungible legs atomically: either every leg lands
    /// or no balance changes at all
    fn transfer_fungible_batch(&mut self, legs: &[FungibleTransfer]) -> Result<(), TransferError>;
}

/// in-memory gateway with explicit balances, allowances and approvals
///
/// stands in for token-standard custody in tests and examples; the
/// allowance rules mirror ERC20 pulls (native transfers skip allowance
/// since value arrives attached to the call).
#[derive(Debug, Default, Clone)]
pub struct InMemoryGateway {
    fungible: HashMap<(AccountId, AssetKind), u128>,
    allowances: HashMap<(AccountId, AssetKind), u128>,
    collateral: HashMap<(CollectionId, u64, AccountId), u64>,
    operators: HashSet<(AccountId, CollectionId)>,
}

/// internal account holding escrowed collateral
const ESCROW: &str = "__escrow__";

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint_fungible(&mut self, account: &str, asset: &AssetKind, amount: u128) {
        *self
            .fungible
            .entry((account.to_string(), asset.clone()))
            .or_insert(0) += amount;
    }

    /// allowance granted by `owner` for the engine to pull `asset`
    pub fn set_allowance(&mut self, owner: &str, asset: &AssetKind, amount: u128) {
        self.allowances
            .insert((owner.to_string(), asset.clone()), amount);
    }

    pub fn mint_collateral(&mut self, owner: &str, collection: &str, item: u64, quantity: u64) {
        *self
            .collateral
            .entry((collection.to_string(), item, owner.to_string()))
            .or_insert(0) += quantity;
    }

    /// collection-level operator approval, the "approve NFT first" step
    pub fn approve_collateral(&mut self, owner: &str, collection: &str) {
        self.operators
            .insert((owner.to_string(), collection.to_string()));
    }

    pub fn revoke_collateral_approval(&mut self, owner: &str, collection: &str) {
        self.operators
            .remove(&(owner.to_string(), collection.to_string()));
    }

    pub fn balance_of(&self, account: &str, asset: &AssetKind) -> u128 {
        self.fungible
            .get(&(account.to_string(), asset.clone()))
            .copied()
            .unwrap_or(0)
    }

    pub fn allowance_of(&self, owner: &str, asset: &AssetKind) -> u128 {
        self.allowances
            .get(&(owner.to_string(), asset.clone()))
            .copied()
            .unwrap_or(0)
    }

    pub fn collateral_balance_of(&self, account: &str, collection: &str, item: u64) -> u64 {
        self.collateral
            .get(&(collection.to_string(), item, account.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn move_collateral(
        &mut self,
        collateral: &CollateralRef,
        from: &str,
        to: &str,
    ) -> Result<(), TransferError> {
        let from_key = (collateral.collection.clone(), collateral.item, from.to_string());
        let available = self.collateral.get(&from_key).copied().unwrap_or(0);
        if available < collateral.quantity {
            return Err(TransferError::InsufficientCollateral {
                available,
                requested: collateral.quantity,
            });
        }
        *self.collateral.get_mut(&from_key).unwrap() -= collateral.quantity;
        *self
            .collateral
            .entry((collateral.collection.clone(), collateral.item, to.to_string()))
            .or_insert(0) += collateral.quantity;
        Ok(())
    }

    /// apply one leg against working copies of the balance maps
    fn apply_leg(
        fungible: &mut HashMap<(AccountId, AssetKind), u128>,
        allowances: &mut HashMap<(AccountId, AssetKind), u128>,
        leg: &FungibleTransfer,
    ) -> Result<(), TransferError> {
        let from_key = (leg.from.clone(), leg.asset.clone());
        let available = fungible.get(&from_key).copied().unwrap_or(0);
        if available < leg.amount {
            return Err(TransferError::InsufficientBalance {
                available,
                requested: leg.amount,
            });
        }

        // token pulls consume allowance; native value arrives attached
        if !leg.asset.is_native() {
            let allowance = allowances.get(&from_key).copied().unwrap_or(0);
            if allowance < leg.amount {
                return Err(TransferError::InsufficientAllowance {
                    allowance,
                    requested: leg.amount,
                });
            }
            *allowances.get_mut(&from_key).unwrap() -= leg.amount;
        }

        *fungible.get_mut(&from_key).unwrap() -= leg.amount;
        *fungible
            .entry((leg.to.clone(), leg.asset.clone()))
            .or_insert(0) += leg.amount;
        Ok(())
    }
}

impl AssetTransferGateway for InMemoryGateway {
    fn escrow_collateral(
        &mut self,
        owner: &str,
        collateral: &CollateralRef,
    ) -> Result<(), TransferError> {
        let key = (owner.to_string(), collateral.collection.clone());
        if !self.operators.contains(&key) {
            return Err(TransferError::NotApproved);
        }
        self.move_collateral(collateral, owner, ESCROW)
    }

    fn release_collateral(
        &mut self,
        collateral: &CollateralRef,
        to: &str,
    ) -> Result<(), TransferError> {
        self.move_collateral(collateral, ESCROW, to)
    }

    fn transfer_fungible(
        &mut self,
        asset: &AssetKind,
        from: &str,
        to: &str,
        amount: u128,
    ) -> Result<(), TransferError> {
        self.transfer_fungible_batch(&[FungibleTransfer {
            asset: asset.clone(),
            from: from.to_string(),
            to: to.to_string(),
            amount,
        }])
    }

    fn transfer_fungible_batch(&mut self, legs: &[FungibleTransfer]) -> Result<(), TransferError> {
        // run every leg against working copies, commit only if all pass
        let mut fungible = self.fungible.clone();
        let mut allowances = self.allowances.clone();
        for leg in legs {
            Self::apply_leg(&mut fungible, &mut allowances, leg)?;
        }
        self.fungible = fungible;
        self.allowances = allowances;
        Ok(())
    }
}
