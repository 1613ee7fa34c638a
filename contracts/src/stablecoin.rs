//! yUSD Stablecoin Contract
//!
//! CEP-18 token minted 1:1 against two collateral pairs. Each pair is a plain
//! stable asset and its lending-market receipt token; both are accepted for
//! mint and redeem. Collateral held here is tracked per asset as "accounted"
//! collateral, which is what redemptions pay out of and what the Backing is
//! credited with as principal when idle collateral is forwarded to it.
//!
//! Tokens that arrive without going through `mint` are never accounted: they
//! are forwarded to the Backing with the next supply and surface there as
//! yield.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use crate::access_control::{
    AccessControllerContractRef, ROLE_ADMIN, ROLE_COLLATERAL_MANAGER, ROLE_GATEKEEPER,
};
use crate::backing::BackingContractRef;
use crate::constants::{
    COLLATERAL_SPENDER_DELAY, MIN_REDEEM_CAP, REDEEM_CAP_DELAY, REDEEM_CAP_EXPIRY,
    TOKEN_DECIMALS,
};
use crate::errors::{OrRevert, ProtocolError};
use crate::interfaces::Cep18TokenContractRef;
use crate::math;
use crate::types::{
    ensure_timelock, AddressProposal, AmountProposal, CollateralAsset, CollateralPair,
    MintRedeemOrder, RateLimitWindow,
};

const TOKEN_NAME: &str = "yUSD";
const TOKEN_SYMBOL: &str = "yUSD";

pub mod events {
    use odra::prelude::*;
    use odra::casper_types::U256;

    #[odra::event]
    pub struct Transfer {
        pub from: Address,
        pub to: Address,
        pub amount: U256,
    }

    #[odra::event]
    pub struct Approval {
        pub owner: Address,
        pub spender: Address,
        pub amount: U256,
    }

    #[odra::event]
    pub struct Mint {
        pub benefactor: Address,
        pub beneficiary: Address,
        pub asset: Address,
        pub collateral_amount: U256,
        pub token_amount: U256,
    }

    #[odra::event]
    pub struct Redeem {
        pub benefactor: Address,
        pub beneficiary: Address,
        pub asset: Address,
        pub collateral_amount: U256,
        pub token_amount: U256,
    }

    #[odra::event]
    pub struct CollateralSupplied {
        pub asset: Address,
        pub plain_amount: U256,
        pub yield_amount: U256,
        pub principal: U256,
    }

    #[odra::event]
    pub struct CollateralReturned {
        pub asset: Address,
        pub amount: U256,
    }

    #[odra::event]
    pub struct YieldMinted {
        pub to: Address,
        pub amount: U256,
    }

    #[odra::event]
    pub struct CollateralSpenderProposed {
        pub proposed: Address,
        pub proposed_at: u64,
    }

    #[odra::event]
    pub struct CollateralSpenderChanged {
        pub previous: Option<Address>,
        pub current: Address,
    }

    #[odra::event]
    pub struct MaxMintPerBlockChanged {
        pub max_mint_per_block: U256,
    }

    #[odra::event]
    pub struct MaxRedeemPerBlockProposed {
        pub max_redeem_per_block: U256,
        pub proposed_at: u64,
    }

    #[odra::event]
    pub struct MaxRedeemPerBlockChanged {
        pub max_redeem_per_block: U256,
    }

    #[odra::event]
    pub struct RedeemCapExemptionSet {
        pub account: Address,
        pub exempt: bool,
    }
}

/// yUSD Stablecoin Contract
#[odra::module(events = [
    events::Transfer,
    events::Approval,
    events::Mint,
    events::Redeem,
    events::CollateralSupplied,
    events::CollateralReturned,
    events::YieldMinted,
    events::CollateralSpenderProposed,
    events::CollateralSpenderChanged,
    events::MaxMintPerBlockChanged,
    events::MaxRedeemPerBlockProposed,
    events::MaxRedeemPerBlockChanged,
    events::RedeemCapExemptionSet
])]
pub struct Stablecoin {
    name: Var<String>,
    symbol: Var<String>,
    decimals: Var<u8>,
    total_supply: Var<U256>,
    balances: Mapping<Address, U256>,
    /// Allowance mapping (owner, spender) -> amount
    allowances: Mapping<(Address, Address), U256>,
    access_controller: Var<Address>,
    primary: Var<CollateralPair>,
    secondary: Var<CollateralPair>,
    /// Collateral attributed to mints, per token (plain and yield-bearing)
    accounted: Mapping<Address, U256>,
    rate_limit: Var<RateLimitWindow>,
    /// Contract allowed to pull collateral (the Backing)
    collateral_spender: Var<Option<Address>>,
    spender_proposal: Var<Option<AddressProposal>>,
    redeem_cap_proposal: Var<Option<AmountProposal>>,
    redeem_cap_exempt: Mapping<Address, bool>,
    locked: Var<bool>,
}

#[odra::module]
impl Stablecoin {
    /// Initialize the stablecoin with its two collateral pairs and per-block caps.
    pub fn init(
        &mut self,
        access_controller: Address,
        primary: CollateralPair,
        secondary: CollateralPair,
        max_mint_per_block: U256,
        max_redeem_per_block: U256,
    ) {
        for pair in [&primary, &secondary] {
            if pair.decimals > TOKEN_DECIMALS {
                self.env().revert(ProtocolError::UnsupportedDecimals);
            }
            if pair.asset == pair.yield_asset {
                self.env().revert(ProtocolError::InvalidAddress);
            }
        }
        if primary.contains(secondary.asset) || primary.contains(secondary.yield_asset) {
            self.env().revert(ProtocolError::InvalidAddress);
        }

        self.name.set(String::from(TOKEN_NAME));
        self.symbol.set(String::from(TOKEN_SYMBOL));
        self.decimals.set(TOKEN_DECIMALS);
        self.total_supply.set(U256::zero());
        self.access_controller.set(access_controller);
        self.primary.set(primary);
        self.secondary.set(secondary);
        self.rate_limit
            .set(RateLimitWindow::new(max_mint_per_block, max_redeem_per_block));
        self.collateral_spender.set(None);
        self.locked.set(false);
    }

    // ========== CEP-18 Standard Functions ==========

    pub fn name(&self) -> String {
        self.name.get_or_default()
    }

    pub fn symbol(&self) -> String {
        self.symbol.get_or_default()
    }

    pub fn decimals(&self) -> u8 {
        self.decimals.get().unwrap_or(TOKEN_DECIMALS)
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

    /// Transfer tokens to recipient
    pub fn transfer(&mut self, recipient: Address, amount: U256) {
        let sender = self.env().caller();
        self.transfer_internal(sender, recipient, amount);
    }

    /// Approve spender to spend tokens
    pub fn approve(&mut self, spender: Address, amount: U256) {
        let owner = self.env().caller();
        self.approve_internal(owner, spender, amount);
    }

    /// Transfer tokens from owner to recipient (requires allowance)
    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) {
        let spender = self.env().caller();

        let current_allowance = self.allowance(owner, spender);
        if current_allowance < amount {
            self.env().revert(ProtocolError::InsufficientAllowance);
        }

        self.transfer_internal(owner, recipient, amount);
        self.approve_internal(owner, spender, current_allowance - amount);
    }

    // ========== Mint / Redeem ==========

    /// Mint yUSD against collateral pulled from the benefactor.
    pub fn mint(&mut self, order: MintRedeemOrder) {
        self.lock();
        self.require_not_paused();
        self.require_benefactor(&order);

        let access = self.access();
        if access.blacklist_mode(order.benefactor).blocks_deposits()
            || access.blacklist_mode(order.beneficiary).blocks_deposits()
        {
            self.env().revert(ProtocolError::Blacklisted);
        }

        let asset = self.resolve_asset(order.asset);
        math::verify_order_ratio(order.collateral_amount, order.token_amount, asset.decimals)
            .or_revert(&self.env());

        let mut window = self.rate_limit.get_or_default();
        window
            .record_mint(self.env().get_block_time(), order.token_amount)
            .or_revert(&self.env());
        self.rate_limit.set(window);

        let accounted = self.accounted_collateral(order.asset);
        self.accounted
            .set(&order.asset, accounted + order.collateral_amount);
        self.mint_internal(order.beneficiary, order.token_amount);

        Cep18TokenContractRef::new(self.env(), order.asset).transfer_from(
            order.benefactor,
            self.env().self_address(),
            order.collateral_amount,
        );

        self.env().emit_event(events::Mint {
            benefactor: order.benefactor,
            beneficiary: order.beneficiary,
            asset: order.asset,
            collateral_amount: order.collateral_amount,
            token_amount: order.token_amount,
        });
        self.unlock();
    }

    /// Burn the benefactor's yUSD and pay out the collateral named in the order.
    pub fn redeem(&mut self, order: MintRedeemOrder) {
        self.lock();
        self.require_not_paused();
        self.require_benefactor(&order);

        let access = self.access();
        if access.blacklist_mode(order.benefactor).blocks_transfers()
            || access.blacklist_mode(order.beneficiary).blocks_transfers()
        {
            self.env().revert(ProtocolError::Blacklisted);
        }

        let asset = self.resolve_asset(order.asset);
        math::verify_order_ratio(order.collateral_amount, order.token_amount, asset.decimals)
            .or_revert(&self.env());

        let exempt = self.is_redeem_cap_exempt(order.benefactor);
        let mut window = self.rate_limit.get_or_default();
        window
            .record_redeem(self.env().get_block_time(), order.token_amount, exempt)
            .or_revert(&self.env());
        self.rate_limit.set(window);

        let accounted = self.accounted_collateral(order.asset);
        if accounted < order.collateral_amount {
            self.env().revert(ProtocolError::InsufficientCollateral);
        }
        if self.balance_of(order.benefactor) < order.token_amount {
            self.env().revert(ProtocolError::InsufficientTokenBalance);
        }

        self.accounted
            .set(&order.asset, accounted - order.collateral_amount);
        self.burn_internal(order.benefactor, order.token_amount);

        Cep18TokenContractRef::new(self.env(), order.asset)
            .transfer(order.beneficiary, order.collateral_amount);

        self.env().emit_event(events::Redeem {
            benefactor: order.benefactor,
            beneficiary: order.beneficiary,
            asset: order.asset,
            collateral_amount: order.collateral_amount,
            token_amount: order.token_amount,
        });
        self.unlock();
    }

    // ========== Backing Flow ==========

    /// Forward every collateral balance held here to the collateral spender.
    ///
    /// Only accounted collateral is reported as principal. `min_out_primary`
    /// and `min_out_secondary` bound the yield-bearing balance the spender
    /// must end up credited with for each pair.
    pub fn supply_to_backing(&mut self, min_out_primary: U256, min_out_secondary: U256) {
        self.lock();
        self.require_not_paused();
        self.require_role(ROLE_COLLATERAL_MANAGER);

        let spender = self.active_spender();
        let this = self.env().self_address();
        let pairs = [
            (self.primary_pair(), min_out_primary),
            (self.secondary_pair(), min_out_secondary),
        ];

        for (pair, min_out) in pairs {
            let mut plain = Cep18TokenContractRef::new(self.env(), pair.asset);
            let mut receipt = Cep18TokenContractRef::new(self.env(), pair.yield_asset);
            let plain_amount = plain.balance_of(this);
            let yield_amount = receipt.balance_of(this);
            if plain_amount.is_zero() && yield_amount.is_zero() {
                continue;
            }

            let principal = self.accounted_collateral(pair.asset)
                + self.accounted_collateral(pair.yield_asset);
            self.accounted.set(&pair.asset, U256::zero());
            self.accounted.set(&pair.yield_asset, U256::zero());

            plain.approve(spender, plain_amount);
            receipt.approve(spender, yield_amount);
            BackingContractRef::new(self.env(), spender).supply_from_token(
                pair.asset,
                plain_amount,
                yield_amount,
                principal,
                min_out,
            );

            self.env().emit_event(events::CollateralSupplied {
                asset: pair.asset,
                plain_amount,
                yield_amount,
                principal,
            });
        }
        self.unlock();
    }

    /// Mint yUSD against compounded yield (collateral spender only).
    pub fn mint_yield(&mut self, to: Address, amount: U256) {
        self.require_collateral_spender();
        if amount.is_zero() {
            return;
        }
        self.mint_internal(to, amount);
        self.env().emit_event(events::YieldMinted { to, amount });
    }

    /// Re-credit collateral the spender has sent back to this contract.
    pub fn return_collateral(&mut self, asset: Address, amount: U256) {
        self.require_collateral_spender();
        let resolved = self.resolve_asset(asset);
        if resolved.is_yield_bearing {
            self.env().revert(ProtocolError::UnsupportedAsset);
        }

        let accounted = self.accounted_collateral(asset);
        self.accounted.set(&asset, accounted + amount);
        self.env()
            .emit_event(events::CollateralReturned { asset, amount });
    }

    // ========== Admin Functions ==========

    /// Set the first collateral spender. Later changes go through the timelock.
    pub fn initialize_collateral_spender(&mut self, spender: Address) {
        self.require_role(ROLE_ADMIN);
        if self.collateral_spender().is_some() {
            self.env().revert(ProtocolError::AlreadyInitialized);
        }

        self.collateral_spender.set(Some(spender));
        self.env().emit_event(events::CollateralSpenderChanged {
            previous: None,
            current: spender,
        });
    }

    pub fn propose_new_collateral_spender(&mut self, spender: Address) {
        self.require_role(ROLE_COLLATERAL_MANAGER);
        let proposed_at = self.env().get_block_time();
        self.spender_proposal.set(Some(AddressProposal {
            proposed: spender,
            proposed_at,
        }));
        self.env().emit_event(events::CollateralSpenderProposed {
            proposed: spender,
            proposed_at,
        });
    }

    /// Called by the proposed spender itself once the delay has passed.
    pub fn accept_proposed_collateral_spender(&mut self) {
        let proposal = self
            .pending_collateral_spender()
            .unwrap_or_else(|| self.env().revert(ProtocolError::NoPendingProposal));
        if self.env().caller() != proposal.proposed {
            self.env().revert(ProtocolError::NotProposedSpender);
        }
        ensure_timelock(
            proposal.proposed_at,
            self.env().get_block_time(),
            COLLATERAL_SPENDER_DELAY,
            None,
        )
        .or_revert(&self.env());

        let previous = self.collateral_spender();
        self.collateral_spender.set(Some(proposal.proposed));
        self.spender_proposal.set(None);
        self.env().emit_event(events::CollateralSpenderChanged {
            previous,
            current: proposal.proposed,
        });
    }

    pub fn set_max_mint_per_block(&mut self, max_mint_per_block: U256) {
        self.require_role(ROLE_ADMIN);
        self.update_mint_cap(max_mint_per_block);
    }

    /// Emergency stop for minting.
    pub fn disable_mint(&mut self) {
        self.require_role(ROLE_GATEKEEPER);
        self.update_mint_cap(U256::zero());
    }

    pub fn propose_max_redeem_per_block(&mut self, max_redeem_per_block: U256) {
        self.require_role(ROLE_ADMIN);
        if max_redeem_per_block < U256::from(MIN_REDEEM_CAP) {
            self.env().revert(ProtocolError::BelowRedeemFloor);
        }

        let proposed_at = self.env().get_block_time();
        self.redeem_cap_proposal.set(Some(AmountProposal {
            value: max_redeem_per_block,
            proposed_at,
        }));
        self.env().emit_event(events::MaxRedeemPerBlockProposed {
            max_redeem_per_block,
            proposed_at,
        });
    }

    /// Apply the pending redeem cap. Only valid between 14 and 16 days after the proposal.
    pub fn execute_max_redeem_per_block_change(&mut self) {
        self.require_role(ROLE_ADMIN);
        let proposal = self
            .pending_max_redeem_per_block()
            .unwrap_or_else(|| self.env().revert(ProtocolError::NoPendingProposal));
        ensure_timelock(
            proposal.proposed_at,
            self.env().get_block_time(),
            REDEEM_CAP_DELAY,
            Some(REDEEM_CAP_EXPIRY),
        )
        .or_revert(&self.env());

        let mut window = self.rate_limit.get_or_default();
        window.max_redeem_per_block = proposal.value;
        self.rate_limit.set(window);
        self.redeem_cap_proposal.set(None);
        self.env().emit_event(events::MaxRedeemPerBlockChanged {
            max_redeem_per_block: proposal.value,
        });
    }

    pub fn set_redeem_cap_exempt(&mut self, account: Address, exempt: bool) {
        self.require_role(ROLE_ADMIN);
        self.redeem_cap_exempt.set(&account, exempt);
        self.env()
            .emit_event(events::RedeemCapExemptionSet { account, exempt });
    }

    // ========== Views ==========

    pub fn primary_pair(&self) -> CollateralPair {
        self.primary
            .get_or_revert_with(ProtocolError::NotInitialized)
    }

    pub fn secondary_pair(&self) -> CollateralPair {
        self.secondary
            .get_or_revert_with(ProtocolError::NotInitialized)
    }

    /// Resolve a token address to its collateral description, if supported.
    pub fn collateral_asset(&self, asset: Address) -> Option<CollateralAsset> {
        [self.primary_pair(), self.secondary_pair()]
            .into_iter()
            .find(|pair| pair.contains(asset))
            .map(|pair| CollateralAsset {
                address: asset,
                decimals: pair.decimals,
                is_yield_bearing: pair.yield_asset == asset,
                underlying: pair.asset,
            })
    }

    pub fn supported_assets(&self) -> Vec<CollateralAsset> {
        let mut assets = Vec::new();
        for pair in [self.primary_pair(), self.secondary_pair()] {
            for (address, is_yield_bearing) in [(pair.asset, false), (pair.yield_asset, true)] {
                assets.push(CollateralAsset {
                    address,
                    decimals: pair.decimals,
                    is_yield_bearing,
                    underlying: pair.asset,
                });
            }
        }
        assets
    }

    pub fn accounted_collateral(&self, asset: Address) -> U256 {
        self.accounted.get_or_default(&asset)
    }

    pub fn collateral_spender(&self) -> Option<Address> {
        self.collateral_spender.get().flatten()
    }

    pub fn pending_collateral_spender(&self) -> Option<AddressProposal> {
        self.spender_proposal.get().flatten()
    }

    pub fn pending_max_redeem_per_block(&self) -> Option<AmountProposal> {
        self.redeem_cap_proposal.get().flatten()
    }

    pub fn rate_limit(&self) -> RateLimitWindow {
        self.rate_limit.get_or_default()
    }

    pub fn max_mint_per_block(&self) -> U256 {
        self.rate_limit().max_mint_per_block
    }

    pub fn max_redeem_per_block(&self) -> U256 {
        self.rate_limit().max_redeem_per_block
    }

    pub fn is_redeem_cap_exempt(&self, account: Address) -> bool {
        self.redeem_cap_exempt.get_or_default(&account)
    }

    pub fn access_controller(&self) -> Option<Address> {
        self.access_controller.get()
    }

    // ========== Internal Functions ==========

    fn access(&self) -> AccessControllerContractRef {
        let address = self
            .access_controller
            .get_or_revert_with(ProtocolError::NotInitialized);
        AccessControllerContractRef::new(self.env(), address)
    }

    fn transfer_internal(&mut self, from: Address, to: Address, amount: U256) {
        let access = self.access();
        if access.blacklist_mode(from).blocks_transfers()
            || access.blacklist_mode(to).blocks_transfers()
        {
            self.env().revert(ProtocolError::Blacklisted);
        }

        let from_balance = self.balance_of(from);
        if from_balance < amount {
            self.env().revert(ProtocolError::InsufficientTokenBalance);
        }
        self.balances.set(&from, from_balance - amount);
        let to_balance = self.balance_of(to);
        self.balances.set(&to, to_balance + amount);

        self.env().emit_event(events::Transfer { from, to, amount });
    }

    fn approve_internal(&mut self, owner: Address, spender: Address, amount: U256) {
        self.allowances.set(&(owner, spender), amount);
        self.env().emit_event(events::Approval {
            owner,
            spender,
            amount,
        });
    }

    fn mint_internal(&mut self, to: Address, amount: U256) {
        let balance = self.balance_of(to);
        self.balances.set(&to, balance + amount);
        let supply = self.total_supply();
        self.total_supply.set(supply + amount);
    }

    fn burn_internal(&mut self, from: Address, amount: U256) {
        let balance = self.balance_of(from);
        if balance < amount {
            self.env().revert(ProtocolError::InsufficientTokenBalance);
        }
        self.balances.set(&from, balance - amount);
        let supply = self.total_supply();
        self.total_supply.set(supply - amount);
    }

    fn update_mint_cap(&mut self, max_mint_per_block: U256) {
        let mut window = self.rate_limit.get_or_default();
        window.max_mint_per_block = max_mint_per_block;
        self.rate_limit.set(window);
        self.env()
            .emit_event(events::MaxMintPerBlockChanged { max_mint_per_block });
    }

    fn resolve_asset(&self, asset: Address) -> CollateralAsset {
        self.collateral_asset(asset)
            .unwrap_or_else(|| self.env().revert(ProtocolError::UnsupportedAsset))
    }

    fn active_spender(&self) -> Address {
        self.collateral_spender()
            .unwrap_or_else(|| self.env().revert(ProtocolError::NotInitialized))
    }

    fn require_collateral_spender(&self) {
        if self.collateral_spender() != Some(self.env().caller()) {
            self.env().revert(ProtocolError::NotCollateralSpender);
        }
    }

    fn require_benefactor(&self, order: &MintRedeemOrder) {
        if self.env().caller() != order.benefactor {
            self.env().revert(ProtocolError::NotBenefactor);
        }
    }

    fn require_role(&self, role_id: u8) {
        if !self.access().has_role(role_id, self.env().caller()) {
            self.env().revert(ProtocolError::MissingRole);
        }
    }

    fn require_not_paused(&self) {
        if self.access().is_paused() {
            self.env().revert(ProtocolError::Paused);
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
