//! Fixed-point helpers shared by the token, backing and vault modules.
//!
//! Everything here is pure: inputs in, `Result` out. Contracts turn an `Err`
//! into a revert.

use odra::casper_types::U256;
use crate::constants::{BPS_SCALE, TOKEN_DECIMALS};
use crate::errors::ProtocolError;

/// Computes `(a * b) / d`, rounding up when `round_up` is set.
pub fn mul_div(a: U256, b: U256, d: U256, round_up: bool) -> Result<U256, ProtocolError> {
    if d.is_zero() {
        return Err(ProtocolError::MathOverflow);
    }

    let product = a.checked_mul(b).ok_or(ProtocolError::MathOverflow)?;
    let quotient = product / d;

    if round_up && !(product % d).is_zero() {
        quotient
            .checked_add(U256::one())
            .ok_or(ProtocolError::MathOverflow)
    } else {
        Ok(quotient)
    }
}

/// `10^(18 - decimals)`: the factor turning one collateral unit into token units.
pub fn scale_factor(decimals: u8) -> Result<U256, ProtocolError> {
    if decimals > TOKEN_DECIMALS {
        return Err(ProtocolError::UnsupportedDecimals);
    }
    Ok(U256::from(10u64).pow(U256::from(TOKEN_DECIMALS - decimals)))
}

/// Normalize a collateral amount to 18-decimal token units.
pub fn collateral_to_token(amount: U256, decimals: u8) -> Result<U256, ProtocolError> {
    amount
        .checked_mul(scale_factor(decimals)?)
        .ok_or(ProtocolError::MathOverflow)
}

/// Convert token units back to collateral units. Any remainder is rejected.
pub fn token_to_collateral(token_amount: U256, decimals: u8) -> Result<U256, ProtocolError> {
    let factor = scale_factor(decimals)?;
    if !(token_amount % factor).is_zero() {
        return Err(ProtocolError::DustRemainder);
    }
    Ok(token_amount / factor)
}

/// Check that an order's collateral and token amounts match exactly after
/// decimal scaling.
pub fn verify_order_ratio(
    collateral_amount: U256,
    token_amount: U256,
    decimals: u8,
) -> Result<(), ProtocolError> {
    if collateral_amount.is_zero() || token_amount.is_zero() {
        return Err(ProtocolError::ZeroAmount);
    }

    let expected = token_to_collateral(token_amount, decimals)?;
    if expected != collateral_amount {
        return Err(ProtocolError::InvalidRatio);
    }
    Ok(())
}

/// Split a yield amount into `(team, vault)`.
///
/// The team share is floored; the vault receives the remainder, so the two
/// parts always add up to `total`.
pub fn split_yield(total: U256, team_share_bps: u32) -> Result<(U256, U256), ProtocolError> {
    if team_share_bps > BPS_SCALE {
        return Err(ProtocolError::InvalidBps);
    }

    let team = mul_div(
        total,
        U256::from(team_share_bps),
        U256::from(BPS_SCALE),
        false,
    )?;
    Ok((team, total - team))
}

/// Shares for a given asset amount: `assets * total_supply / total_assets`.
///
/// An empty vault bootstraps 1:1. A vault with shares but no assets mints nothing.
pub fn convert_to_shares(
    assets: U256,
    total_assets: U256,
    total_supply: U256,
    round_up: bool,
) -> Result<U256, ProtocolError> {
    if total_supply.is_zero() {
        return Ok(assets);
    }
    if total_assets.is_zero() {
        return Ok(U256::zero());
    }
    mul_div(assets, total_supply, total_assets, round_up)
}

/// Assets for a given share amount: `shares * total_assets / total_supply`.
pub fn convert_to_assets(
    shares: U256,
    total_assets: U256,
    total_supply: U256,
    round_up: bool,
) -> Result<U256, ProtocolError> {
    if total_supply.is_zero() {
        return Ok(shares);
    }
    mul_div(shares, total_assets, total_supply, round_up)
}

/// Portion of a linearly vesting reward still locked at `now`.
pub fn unvested_amount(
    vesting_amount: U256,
    vesting_start: u64,
    vesting_period: u64,
    now: u64,
) -> U256 {
    if vesting_period == 0 || vesting_amount.is_zero() {
        return U256::zero();
    }

    let elapsed = now.saturating_sub(vesting_start);
    if elapsed >= vesting_period {
        return U256::zero();
    }

    let remaining = vesting_period - elapsed;
    // remaining < vesting_period, so this never overflows past vesting_amount
    vesting_amount * U256::from(remaining) / U256::from(vesting_period)
}
