//! Stand-ins for the external collaborators, used by the integration tests.
//!
//! - `TestCollateral`: minimal CEP-18 token with an owner and minters. Used
//!   both as plain collateral (USDC/DAI style) and as a lending-market receipt.
//! - `MockLendingMarket`: supplies and withdraws 1:1 against a receipt token
//!   and can grow a holder's receipt balance to simulate accrued interest.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use crate::errors::ProtocolError;
use crate::interfaces::Cep18TokenContractRef;

/// Minimal CEP-18 token for tests
#[odra::module]
pub struct TestCollateral {
    name: Var<String>,
    symbol: Var<String>,
    decimals: Var<u8>,
    total_supply: Var<U256>,
    balances: Mapping<Address, U256>,
    allowances: Mapping<(Address, Address), U256>,
    owner: Var<Address>,
    minters: Mapping<Address, bool>,
}

#[odra::module]
impl TestCollateral {
    pub fn init(&mut self, name: String, symbol: String, decimals: u8) {
        self.name.set(name);
        self.symbol.set(symbol);
        self.decimals.set(decimals);
        self.total_supply.set(U256::zero());
        self.owner.set(self.env().caller());
    }

    pub fn name(&self) -> String {
        self.name.get_or_default()
    }

    pub fn symbol(&self) -> String {
        self.symbol.get_or_default()
    }

    pub fn decimals(&self) -> u8 {
        self.decimals.get_or_default()
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply.get_or_default()
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get_or_default(&account)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances.get_or_default(&(owner, spender))
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) {
        let sender = self.env().caller();
        self.move_balance(sender, recipient, amount);
    }

    pub fn approve(&mut self, spender: Address, amount: U256) {
        let owner = self.env().caller();
        self.allowances.set(&(owner, spender), amount);
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) {
        let spender = self.env().caller();
        let allowance = self.allowance(owner, spender);
        if allowance < amount {
            self.env().revert(ProtocolError::InsufficientAllowance);
        }
        self.allowances.set(&(owner, spender), allowance - amount);
        self.move_balance(owner, recipient, amount);
    }

    /// Owner or minter only.
    pub fn mint(&mut self, to: Address, amount: U256) {
        let caller = self.env().caller();
        if self.owner.get() != Some(caller) && !self.is_minter(caller) {
            self.env().revert(ProtocolError::NotMinter);
        }
        let balance = self.balance_of(to);
        self.balances.set(&to, balance + amount);
        let supply = self.total_supply();
        self.total_supply.set(supply + amount);
    }

    /// Minter only.
    pub fn burn_from(&mut self, from: Address, amount: U256) {
        if !self.is_minter(self.env().caller()) {
            self.env().revert(ProtocolError::NotMinter);
        }
        let balance = self.balance_of(from);
        if balance < amount {
            self.env().revert(ProtocolError::InsufficientTokenBalance);
        }
        self.balances.set(&from, balance - amount);
        let supply = self.total_supply();
        self.total_supply.set(supply - amount);
    }

    pub fn set_minter(&mut self, minter: Address, enabled: bool) {
        if self.owner.get() != Some(self.env().caller()) {
            self.env().revert(ProtocolError::MissingRole);
        }
        self.minters.set(&minter, enabled);
    }

    pub fn is_minter(&self, account: Address) -> bool {
        self.minters.get_or_default(&account)
    }

    fn move_balance(&mut self, from: Address, to: Address, amount: U256) {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            self.env().revert(ProtocolError::InsufficientTokenBalance);
        }
        self.balances.set(&from, from_balance - amount);
        let to_balance = self.balance_of(to);
        self.balances.set(&to, to_balance + amount);
    }
}

/// Lending market stand-in: one receipt token per reserve, 1:1 with the underlying.
#[odra::module]
pub struct MockLendingMarket {
    /// Underlying asset -> receipt token
    reserves: Mapping<Address, Option<Address>>,
}

#[odra::module]
impl MockLendingMarket {
    /// Register `receipt` as the receipt token of `asset`. The market must be a
    /// minter on the receipt.
    pub fn register_reserve(&mut self, asset: Address, receipt: Address) {
        self.reserves.set(&asset, Some(receipt));
    }

    pub fn receipt_of(&self, asset: Address) -> Option<Address> {
        self.reserves.get(&asset).flatten()
    }

    pub fn supply(&mut self, asset: Address, amount: U256, on_behalf_of: Address) {
        let receipt = self.reserve(asset);
        let this = self.env().self_address();
        Cep18TokenContractRef::new(self.env(), asset).transfer_from(self.env().caller(), this, amount);
        TestCollateralContractRef::new(self.env(), receipt).mint(on_behalf_of, amount);
    }

    pub fn withdraw(&mut self, asset: Address, amount: U256, to: Address) -> U256 {
        let receipt = self.reserve(asset);
        TestCollateralContractRef::new(self.env(), receipt).burn_from(self.env().caller(), amount);
        Cep18TokenContractRef::new(self.env(), asset).transfer(to, amount);
        amount
    }

    /// Simulate interest: pull `amount` of the underlying from the caller and
    /// credit the same amount of receipt to `holder`.
    pub fn accrue_yield(&mut self, asset: Address, holder: Address, amount: U256) {
        let receipt = self.reserve(asset);
        let this = self.env().self_address();
        Cep18TokenContractRef::new(self.env(), asset).transfer_from(self.env().caller(), this, amount);
        TestCollateralContractRef::new(self.env(), receipt).mint(holder, amount);
    }

    fn reserve(&self, asset: Address) -> Address {
        self.receipt_of(asset)
            .unwrap_or_else(|| self.env().revert(ProtocolError::UnsupportedAsset))
    }
}
