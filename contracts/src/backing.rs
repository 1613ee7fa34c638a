//! Backing Contract
//!
//! Holds the protocol's lending-market position. Collateral forwarded by the
//! yUSD token is supplied to the market, and the Backing remembers how much
//! of the resulting receipt balance is principal. Everything above principal
//! is yield: `compound` mints yUSD against it and splits the mint between the
//! treasury and the staking vault.
//!
//! ## Principal
//!
//! Principal is kept per pair in the pair's own decimals and only moves on
//! user-attributed flows (supply, withdraw) and on compounding. Tokens sent
//! here directly never touch it, so they are paid out as yield at the next
//! compound instead of inflating the backing figure.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use crate::access_control::{AccessControllerContractRef, ROLE_ADMIN, ROLE_COLLATERAL_MANAGER};
use crate::constants::{BACKING_PROPOSAL_DELAY, BPS_SCALE};
use crate::errors::{OrRevert, ProtocolError};
use crate::interfaces::{Cep18TokenContractRef, LendingMarketContractRef};
use crate::math;
use crate::stablecoin::StablecoinContractRef;
use crate::staking_vault::StakingVaultContractRef;
use crate::types::{ensure_timelock, AddressProposal, BackingPosition, BpsProposal, CollateralPair};

pub mod events {
    use odra::prelude::*;
    use odra::casper_types::U256;

    #[odra::event]
    pub struct Supplied {
        pub asset: Address,
        pub plain_amount: U256,
        pub yield_amount: U256,
        pub credited: U256,
        pub principal_added: U256,
    }

    #[odra::event]
    pub struct Compounded {
        pub total_yield: U256,
        pub team_amount: U256,
        pub vault_amount: U256,
    }

    #[odra::event]
    pub struct WithdrawnToToken {
        pub asset: Address,
        pub withdrawn: U256,
        pub principal_released: U256,
    }

    #[odra::event]
    pub struct MarketProposed {
        pub proposed: Address,
        pub proposed_at: u64,
    }

    #[odra::event]
    pub struct MarketChanged {
        pub previous: Address,
        pub current: Address,
    }

    #[odra::event]
    pub struct TeamShareProposed {
        pub bps: u32,
        pub proposed_at: u64,
    }

    #[odra::event]
    pub struct TeamShareChanged {
        pub bps: u32,
    }

    #[odra::event]
    pub struct TreasuryChanged {
        pub treasury: Address,
    }
}

/// Backing Contract
#[odra::module(events = [
    events::Supplied,
    events::Compounded,
    events::WithdrawnToToken,
    events::MarketProposed,
    events::MarketChanged,
    events::TeamShareProposed,
    events::TeamShareChanged,
    events::TreasuryChanged
])]
pub struct Backing {
    access_controller: Var<Address>,
    /// yUSD token (collateral source and yield minter)
    token: Var<Address>,
    market: Var<Address>,
    vault: Var<Address>,
    treasury: Var<Address>,
    primary: Var<CollateralPair>,
    secondary: Var<CollateralPair>,
    /// Principal per pair, keyed by the plain asset, in asset units
    principal: Mapping<Address, U256>,
    last_action: Var<u64>,
    team_share_bps: Var<u32>,
    market_proposal: Var<Option<AddressProposal>>,
    team_share_proposal: Var<Option<BpsProposal>>,
    locked: Var<bool>,
}

#[odra::module]
impl Backing {
    /// Initialize the backing. Collateral pairs are read from the token.
    pub fn init(
        &mut self,
        access_controller: Address,
        token: Address,
        market: Address,
        vault: Address,
        treasury: Address,
        team_share_bps: u32,
    ) {
        if team_share_bps > BPS_SCALE {
            self.env().revert(ProtocolError::InvalidBps);
        }

        let token_ref = StablecoinContractRef::new(self.env(), token);
        self.primary.set(token_ref.primary_pair());
        self.secondary.set(token_ref.secondary_pair());

        self.access_controller.set(access_controller);
        self.token.set(token);
        self.market.set(market);
        self.vault.set(vault);
        self.treasury.set(treasury);
        self.team_share_bps.set(team_share_bps);
        let now = self.env().get_block_time();
        self.last_action.set(now);
        self.locked.set(false);
    }

    // ========== Token Flow ==========

    /// Take collateral forwarded by the token and supply the plain part to the market.
    ///
    /// `principal` is what the token had accounted for; any extra it forwarded
    /// is left out of principal and shows up as yield.
    pub fn supply_from_token(
        &mut self,
        asset: Address,
        plain_amount: U256,
        yield_amount: U256,
        principal: U256,
        min_out: U256,
    ) {
        let token = self.token_address();
        if self.env().caller() != token {
            self.env().revert(ProtocolError::NotToken);
        }
        let pair = self.pair_for(asset);
        let this = self.env().self_address();

        let mut receipt = Cep18TokenContractRef::new(self.env(), pair.yield_asset);
        let balance_before = receipt.balance_of(this);

        if !plain_amount.is_zero() {
            let mut plain = Cep18TokenContractRef::new(self.env(), pair.asset);
            plain.transfer_from(token, this, plain_amount);

            let market = self.market_address();
            plain.approve(market, plain_amount);
            LendingMarketContractRef::new(self.env(), market).supply(pair.asset, plain_amount, this);
        }
        if !yield_amount.is_zero() {
            receipt.transfer_from(token, this, yield_amount);
        }

        let balance_after = receipt.balance_of(this);
        let credited = balance_after.saturating_sub(balance_before);
        if credited < min_out {
            self.env().revert(ProtocolError::SlippageExceeded);
        }

        let current = self.principal_of(pair.asset);
        self.principal.set(&pair.asset, current + principal);
        self.touch();

        self.env().emit_event(events::Supplied {
            asset: pair.asset,
            plain_amount,
            yield_amount,
            credited,
            principal_added: principal,
        });
    }

    // ========== Yield ==========

    /// Mint yUSD against the yield accrued on both pairs and split it between
    /// the treasury and the vault. Returns the total yield in yUSD units.
    pub fn compound(&mut self) -> U256 {
        self.lock();
        self.require_role(ROLE_COLLATERAL_MANAGER);

        let this = self.env().self_address();
        let mut total_yield = U256::zero();
        for pair in self.pairs() {
            let balance = Cep18TokenContractRef::new(self.env(), pair.yield_asset).balance_of(this);
            let principal = self.principal_of(pair.asset);
            if balance <= principal {
                continue;
            }

            self.principal.set(&pair.asset, balance);
            let normalized =
                math::collateral_to_token(balance - principal, pair.decimals).or_revert(&self.env());
            total_yield += normalized;
        }

        if total_yield.is_zero() {
            self.unlock();
            return total_yield;
        }

        let (team_amount, vault_amount) =
            math::split_yield(total_yield, self.team_share_bps()).or_revert(&self.env());
        self.touch();

        let mut token = StablecoinContractRef::new(self.env(), self.token_address());
        token.mint_yield(self.treasury_address(), team_amount);
        let vault = self.vault_address();
        token.mint_yield(vault, vault_amount);
        if !vault_amount.is_zero() {
            StakingVaultContractRef::new(self.env(), vault).notify_rewards(vault_amount);
        }

        self.env().emit_event(events::Compounded {
            total_yield,
            team_amount,
            vault_amount,
        });
        self.unlock();
        total_yield
    }

    /// Yield currently claimable by `compound`, in yUSD units.
    pub fn pending_yield(&self) -> U256 {
        let this = self.env().self_address();
        let mut total = U256::zero();
        for pair in self.pairs() {
            let balance = Cep18TokenContractRef::new(self.env(), pair.yield_asset).balance_of(this);
            let delta = balance.saturating_sub(self.principal_of(pair.asset));
            total += math::collateral_to_token(delta, pair.decimals).or_revert(&self.env());
        }
        total
    }

    // ========== Withdrawals ==========

    /// Pull `amount` of `asset` out of the market back into the token.
    pub fn withdraw_to_token(&mut self, asset: Address, amount: U256) {
        self.require_role(ROLE_COLLATERAL_MANAGER);
        if amount.is_zero() {
            self.env().revert(ProtocolError::ZeroAmount);
        }
        let pair = self.pair_for(asset);
        self.withdraw_pair(&pair, amount);
    }

    /// Unwind the whole position of both pairs back into the token.
    pub fn admin_withdraw(&mut self) {
        self.require_role(ROLE_ADMIN);
        let this = self.env().self_address();
        for pair in self.pairs() {
            let balance = Cep18TokenContractRef::new(self.env(), pair.yield_asset).balance_of(this);
            if balance.is_zero() {
                continue;
            }
            self.withdraw_pair(&pair, balance);
        }
    }

    // ========== Admin Functions ==========

    pub fn propose_market(&mut self, market: Address) {
        self.require_role(ROLE_ADMIN);
        let proposed_at = self.env().get_block_time();
        self.market_proposal.set(Some(AddressProposal {
            proposed: market,
            proposed_at,
        }));
        self.env().emit_event(events::MarketProposed {
            proposed: market,
            proposed_at,
        });
    }

    /// Switch to the proposed market. The current position must be unwound first.
    pub fn accept_proposed_market(&mut self) {
        self.require_role(ROLE_ADMIN);
        let proposal = self
            .pending_market()
            .unwrap_or_else(|| self.env().revert(ProtocolError::NoPendingProposal));
        ensure_timelock(
            proposal.proposed_at,
            self.env().get_block_time(),
            BACKING_PROPOSAL_DELAY,
            None,
        )
        .or_revert(&self.env());
        if !self.total_supplied_principal().is_zero() {
            self.env().revert(ProtocolError::PositionNotEmpty);
        }

        let previous = self.market_address();
        self.market.set(proposal.proposed);
        self.market_proposal.set(None);
        self.env().emit_event(events::MarketChanged {
            previous,
            current: proposal.proposed,
        });
    }

    pub fn propose_team_share_bps(&mut self, bps: u32) {
        self.require_role(ROLE_ADMIN);
        if bps > BPS_SCALE {
            self.env().revert(ProtocolError::InvalidBps);
        }
        let proposed_at = self.env().get_block_time();
        self.team_share_proposal.set(Some(BpsProposal { bps, proposed_at }));
        self.env()
            .emit_event(events::TeamShareProposed { bps, proposed_at });
    }

    pub fn accept_proposed_team_share_bps(&mut self) {
        self.require_role(ROLE_ADMIN);
        let proposal = self
            .pending_team_share_bps()
            .unwrap_or_else(|| self.env().revert(ProtocolError::NoPendingProposal));
        ensure_timelock(
            proposal.proposed_at,
            self.env().get_block_time(),
            BACKING_PROPOSAL_DELAY,
            None,
        )
        .or_revert(&self.env());

        self.team_share_bps.set(proposal.bps);
        self.team_share_proposal.set(None);
        self.env()
            .emit_event(events::TeamShareChanged { bps: proposal.bps });
    }

    pub fn set_treasury(&mut self, treasury: Address) {
        self.require_role(ROLE_ADMIN);
        self.treasury.set(treasury);
        self.env().emit_event(events::TreasuryChanged { treasury });
    }

    // ========== Views ==========

    /// Principal of both pairs normalized to 18 decimals.
    pub fn total_supplied_principal(&self) -> U256 {
        let mut total = U256::zero();
        for pair in self.pairs() {
            total += math::collateral_to_token(self.principal_of(pair.asset), pair.decimals)
                .or_revert(&self.env());
        }
        total
    }

    /// Principal of one pair in the asset's own decimals.
    pub fn principal_of(&self, asset: Address) -> U256 {
        self.principal.get_or_default(&asset)
    }

    pub fn position(&self) -> BackingPosition {
        BackingPosition {
            total_supplied_principal: self.total_supplied_principal(),
            last_action: self.last_action.get_or_default(),
        }
    }

    pub fn team_share_bps(&self) -> u32 {
        self.team_share_bps.get_or_default()
    }

    pub fn pending_market(&self) -> Option<AddressProposal> {
        self.market_proposal.get().flatten()
    }

    pub fn pending_team_share_bps(&self) -> Option<BpsProposal> {
        self.team_share_proposal.get().flatten()
    }

    pub fn market(&self) -> Option<Address> {
        self.market.get()
    }

    pub fn treasury(&self) -> Option<Address> {
        self.treasury.get()
    }

    pub fn vault(&self) -> Option<Address> {
        self.vault.get()
    }

    pub fn token(&self) -> Option<Address> {
        self.token.get()
    }

    // ========== Internal Functions ==========

    /// Withdraw from the market to the token and release principal by what arrived.
    ///
    /// At most the pair's principal is re-credited on the token. Anything above it
    /// lands there unaccounted and is forwarded again on the next supply.
    fn withdraw_pair(&mut self, pair: &CollateralPair, amount: U256) {
        let token = self.token_address();
        let plain = Cep18TokenContractRef::new(self.env(), pair.asset);
        let before = plain.balance_of(token);

        let withdrawn = LendingMarketContractRef::new(self.env(), self.market_address())
            .withdraw(pair.asset, amount, token);
        let received = plain.balance_of(token).saturating_sub(before);
        if received != withdrawn {
            self.env().revert(ProtocolError::CollateralTransferFailed);
        }

        let principal = self.principal_of(pair.asset);
        let released = principal.min(received);
        self.principal.set(&pair.asset, principal - released);
        self.touch();

        if !released.is_zero() {
            StablecoinContractRef::new(self.env(), token).return_collateral(pair.asset, released);
        }

        self.env().emit_event(events::WithdrawnToToken {
            asset: pair.asset,
            withdrawn: received,
            principal_released: released,
        });
    }

    fn pairs(&self) -> [CollateralPair; 2] {
        [
            self.primary.get_or_revert_with(ProtocolError::NotInitialized),
            self.secondary.get_or_revert_with(ProtocolError::NotInitialized),
        ]
    }

    /// Pair whose plain asset is `asset`.
    fn pair_for(&self, asset: Address) -> CollateralPair {
        self.pairs()
            .into_iter()
            .find(|pair| pair.asset == asset)
            .unwrap_or_else(|| self.env().revert(ProtocolError::UnsupportedAsset))
    }

    fn access(&self) -> AccessControllerContractRef {
        let address = self
            .access_controller
            .get_or_revert_with(ProtocolError::NotInitialized);
        AccessControllerContractRef::new(self.env(), address)
    }

    fn token_address(&self) -> Address {
        self.token.get_or_revert_with(ProtocolError::NotInitialized)
    }

    fn market_address(&self) -> Address {
        self.market.get_or_revert_with(ProtocolError::NotInitialized)
    }

    fn vault_address(&self) -> Address {
        self.vault.get_or_revert_with(ProtocolError::NotInitialized)
    }

    fn treasury_address(&self) -> Address {
        self.treasury.get_or_revert_with(ProtocolError::NotInitialized)
    }

    fn touch(&mut self) {
        let now = self.env().get_block_time();
        self.last_action.set(now);
    }

    fn require_role(&self, role_id: u8) {
        if !self.access().has_role(role_id, self.env().caller()) {
            self.env().revert(ProtocolError::MissingRole);
        }
    }

    fn lock(&mut self) {
        if self.locked.get_or_default() {
            self.env().revert(ProtocolError::Reentrancy);
        }
        self.locked.set(true);
    }

    fn unlock(&mut self) {
        self.locked.set(false);
    }
}
