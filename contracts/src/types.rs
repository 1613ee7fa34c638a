//! Common types used across the yUSD protocol.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::ProtocolError;

/// A collateral asset together with its lending-market receipt token.
///
/// Both tokens share the same decimals: the receipt grows 1:1 with the
/// underlying supplied plus accrued interest.
#[odra::odra_type]
#[derive(Copy)]
pub struct CollateralPair {
    /// Plain collateral token (e.g. USDC)
    pub asset: Address,
    /// Yield-bearing receipt token (e.g. aUSDC)
    pub yield_asset: Address,
    /// Decimals shared by both tokens
    pub decimals: u8,
}

impl CollateralPair {
    pub fn contains(&self, token: Address) -> bool {
        self.asset == token || self.yield_asset == token
    }
}

/// Resolved view of a single supported collateral token.
#[odra::odra_type]
pub struct CollateralAsset {
    pub address: Address,
    pub decimals: u8,
    pub is_yield_bearing: bool,
    /// The plain asset of the pair this token belongs to
    pub underlying: Address,
}

/// Mint or redeem request.
#[odra::odra_type]
pub struct MintRedeemOrder {
    /// Account providing collateral (mint) or yUSD (redeem); must be the caller
    pub benefactor: Address,
    /// Account receiving yUSD (mint) or collateral (redeem)
    pub beneficiary: Address,
    /// Collateral token, plain or yield-bearing
    pub asset: Address,
    /// Collateral amount in the asset's own decimals
    pub collateral_amount: U256,
    /// yUSD amount (18 decimals)
    pub token_amount: U256,
}

/// Account restriction level.
#[odra::odra_type]
#[derive(Copy, Default)]
pub enum BlacklistMode {
    #[default]
    None = 0,
    /// Blocks minting and vault deposits; outbound transfers still allowed
    Soft = 1,
    /// Blocks every movement in and out
    Full = 2,
}

impl BlacklistMode {
    pub fn blocks_deposits(&self) -> bool {
        *self != BlacklistMode::None
    }

    pub fn blocks_transfers(&self) -> bool {
        *self == BlacklistMode::Full
    }
}

/// Per-block mint and redeem limits.
///
/// The block is identified by its timestamp, which is constant within a
/// block and strictly increasing between blocks.
#[odra::odra_type]
#[derive(Default)]
pub struct RateLimitWindow {
    pub max_mint_per_block: U256,
    pub max_redeem_per_block: U256,
    /// Block the counters below belong to
    pub current_block: u64,
    pub minted_in_block: U256,
    pub redeemed_in_block: U256,
}

impl RateLimitWindow {
    pub fn new(max_mint_per_block: U256, max_redeem_per_block: U256) -> Self {
        Self {
            max_mint_per_block,
            max_redeem_per_block,
            ..Default::default()
        }
    }

    fn roll(&mut self, block: u64) {
        if block != self.current_block {
            self.current_block = block;
            self.minted_in_block = U256::zero();
            self.redeemed_in_block = U256::zero();
        }
    }

    pub fn record_mint(&mut self, block: u64, amount: U256) -> Result<(), ProtocolError> {
        self.roll(block);
        let minted = self
            .minted_in_block
            .checked_add(amount)
            .ok_or(ProtocolError::MathOverflow)?;
        if minted > self.max_mint_per_block {
            return Err(ProtocolError::MintCapExceeded);
        }
        self.minted_in_block = minted;
        Ok(())
    }

    /// Exempt callers are counted but never rejected.
    pub fn record_redeem(
        &mut self,
        block: u64,
        amount: U256,
        exempt: bool,
    ) -> Result<(), ProtocolError> {
        self.roll(block);
        let redeemed = self
            .redeemed_in_block
            .checked_add(amount)
            .ok_or(ProtocolError::MathOverflow)?;
        if !exempt && redeemed > self.max_redeem_per_block {
            return Err(ProtocolError::RedeemCapExceeded);
        }
        self.redeemed_in_block = redeemed;
        Ok(())
    }
}

/// Pending address change (collateral spender, lending market).
#[odra::odra_type]
#[derive(Copy)]
pub struct AddressProposal {
    pub proposed: Address,
    pub proposed_at: u64,
}

/// Pending amount change (redeem cap).
#[odra::odra_type]
#[derive(Copy)]
pub struct AmountProposal {
    pub value: U256,
    pub proposed_at: u64,
}

/// Pending team share change.
#[odra::odra_type]
#[derive(Copy)]
pub struct BpsProposal {
    pub bps: u32,
    pub proposed_at: u64,
}

/// Check that a proposal made at `proposed_at` may execute at `now`.
///
/// `expiry`, when set, closes the window that many time units after the proposal.
pub fn ensure_timelock(
    proposed_at: u64,
    now: u64,
    delay: u64,
    expiry: Option<u64>,
) -> Result<(), ProtocolError> {
    let elapsed = now.saturating_sub(proposed_at);
    if elapsed < delay {
        return Err(ProtocolError::TimelockNotElapsed);
    }
    match expiry {
        Some(expiry) if elapsed > expiry => Err(ProtocolError::ProposalExpired),
        _ => Ok(()),
    }
}

/// Backing position summary.
#[odra::odra_type]
pub struct BackingPosition {
    /// Principal across both pairs, normalized to 18 decimals
    pub total_supplied_principal: U256,
    /// Block time of the last supply, withdraw or compound
    pub last_action: u64,
}

/// Pending vault exit.
#[odra::odra_type]
pub struct Cooldown {
    pub owner: Address,
    /// yUSD owed once the cooldown ends
    pub underlying_amount: U256,
    pub cooldown_end: u64,
}

impl Cooldown {
    pub fn is_elapsed(&self, now: u64) -> bool {
        now >= self.cooldown_end
    }
}
