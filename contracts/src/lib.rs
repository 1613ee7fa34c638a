//! yUSD Contracts
//!
//! Yield-bearing stablecoin protocol on Casper.
//!
//! ## Architecture
//!
//! - **AccessController**: Roles, pause switch, blacklist and its activation windows
//! - **Stablecoin (yUSD)**: CEP-18 token minted 1:1 against two collateral pairs
//! - **Backing**: Supplies collateral to a lending market and compounds the yield
//! - **StakingVault (syUSD)**: Share vault over yUSD with cooldown-gated exit
//!
//! ## Flow
//!
//! 1. Users mint yUSD with plain or yield-bearing collateral
//! 2. Idle collateral is forwarded to the Backing and supplied to the market
//! 3. `compound` mints yUSD against accrued yield, split between treasury and vault
//! 4. Stakers hold syUSD, whose value grows with every compound

#![cfg_attr(target_arch = "wasm32", no_std)]

#[cfg(target_arch = "wasm32")]
extern crate alloc;

// Re-export odra for downstream usage
pub use odra;

// Core module declarations
pub mod constants;
pub mod errors;
pub mod interfaces;
pub mod math;
pub mod types;

// Contract modules
pub mod access_control;
pub mod backing;
pub mod stablecoin;
pub mod staking_vault;

// Test stand-ins for external collaborators
#[cfg(feature = "mocks")]
pub mod mocks;
