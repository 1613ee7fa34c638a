//! External contract interfaces.
//!
//! Collateral tokens and the lending market live outside the protocol; they
//! are reached through these traits. Protocol modules talk to each other
//! through the contract refs Odra generates for every module.

use odra::prelude::*;
use odra::casper_types::U256;

/// CEP-18 token interface (collateral and receipt tokens).
///
/// Argument names follow the CEP-18 standard entry points.
#[odra::external_contract]
pub trait Cep18Token {
    fn transfer(&mut self, recipient: Address, amount: U256);
    fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256);
    fn approve(&mut self, spender: Address, amount: U256);
    fn allowance(&self, owner: Address, spender: Address) -> U256;
    fn balance_of(&self, account: Address) -> U256;
    fn total_supply(&self) -> U256;
}

/// Lending market the Backing supplies collateral to.
///
/// Supplying credits the receipt token of the reserve to `on_behalf_of`;
/// the receipt balance then grows with accrued interest.
#[odra::external_contract]
pub trait LendingMarket {
    fn supply(&mut self, asset: Address, amount: U256, on_behalf_of: Address);
    /// Returns the amount of `asset` actually sent to `to`.
    fn withdraw(&mut self, asset: Address, amount: U256, to: Address) -> U256;
}
