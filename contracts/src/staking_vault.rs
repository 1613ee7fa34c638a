//! syUSD Staking Vault Contract
//!
//! ERC-4626 style vault over yUSD. Deposits mint syUSD shares at the current
//! exchange rate; yield minted to the vault raises `total_assets` and with it
//! the value of every share.
//!
//! ## Exit
//!
//! Shares are burned up front by `cooldown_shares`/`cooldown_assets` and the
//! yUSD they were worth is set aside until `unstake` after the cooldown ends.
//! A zero duration makes that exit immediate.
//!
//! Plain `withdraw`/`redeem` are off unless the vault was deployed with
//! `direct_exit` and the cooldown duration is zero.
//!
//! ## Rewards
//!
//! Rewards notified by the rewarder vest linearly over `vesting_period`; the
//! unvested part is excluded from `total_assets` so the share price rises
//! smoothly instead of in one step.
//!
//! ## Share floor
//!
//! Total share supply is always zero or at least `MIN_SHARES`, which makes
//! inflating the price of a near-empty vault by donation uneconomical.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use crate::access_control::{AccessControllerContractRef, ROLE_ADMIN, ROLE_CONTROLLER};
use crate::constants::{MAX_COOLDOWN_DURATION, MAX_VESTING_PERIOD, MIN_SHARES, TOKEN_DECIMALS};
use crate::errors::{OrRevert, ProtocolError};
use crate::interfaces::Cep18TokenContractRef;
use crate::math;
use crate::types::{BlacklistMode, Cooldown};

const SHARE_NAME: &str = "Staked yUSD";
const SHARE_SYMBOL: &str = "syUSD";

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
    pub struct Deposit {
        pub sender: Address,
        pub owner: Address,
        pub assets: U256,
        pub shares: U256,
    }

    #[odra::event]
    pub struct Withdraw {
        pub sender: Address,
        pub receiver: Address,
        pub owner: Address,
        pub assets: U256,
        pub shares: U256,
    }

    #[odra::event]
    pub struct CooldownStarted {
        pub owner: Address,
        pub assets: U256,
        pub shares: U256,
        pub cooldown_end: u64,
    }

    #[odra::event]
    pub struct Unstaked {
        pub owner: Address,
        pub receiver: Address,
        pub assets: U256,
    }

    #[odra::event]
    pub struct RewardsReceived {
        pub amount: U256,
        pub vesting_amount: U256,
    }

    #[odra::event]
    pub struct LockedAmountRedistributed {
        pub from: Address,
        pub to: Address,
        pub shares: U256,
    }

    #[odra::event]
    pub struct CooldownDurationUpdated {
        pub previous: u64,
        pub current: u64,
    }

    #[odra::event]
    pub struct VestingPeriodUpdated {
        pub previous: u64,
        pub current: u64,
    }

    #[odra::event]
    pub struct RewarderUpdated {
        pub rewarder: Address,
    }
}

/// syUSD Staking Vault Contract
#[odra::module(events = [
    events::Transfer,
    events::Approval,
    events::Deposit,
    events::Withdraw,
    events::CooldownStarted,
    events::Unstaked,
    events::RewardsReceived,
    events::LockedAmountRedistributed,
    events::CooldownDurationUpdated,
    events::VestingPeriodUpdated,
    events::RewarderUpdated
])]
pub struct StakingVault {
    name: Var<String>,
    symbol: Var<String>,
    /// Share supply
    total_supply: Var<U256>,
    balances: Mapping<Address, U256>,
    allowances: Mapping<(Address, Address), U256>,
    access_controller: Var<Address>,
    /// Underlying asset (yUSD)
    asset: Var<Address>,
    cooldowns: Mapping<Address, Option<Cooldown>>,
    /// yUSD set aside for pending cooldowns
    total_cooling: Var<U256>,
    cooldown_duration: Var<u64>,
    vesting_period: Var<u64>,
    vesting_amount: Var<U256>,
    last_distribution: Var<u64>,
    rewarder: Var<Option<Address>>,
    direct_exit: Var<bool>,
}

#[odra::module]
impl StakingVault {
    pub fn init(
        &mut self,
        access_controller: Address,
        asset: Address,
        cooldown_duration: u64,
        vesting_period: u64,
        direct_exit: bool,
    ) {
        if cooldown_duration > MAX_COOLDOWN_DURATION || vesting_period > MAX_VESTING_PERIOD {
            self.env().revert(ProtocolError::InvalidDuration);
        }

        self.name.set(String::from(SHARE_NAME));
        self.symbol.set(String::from(SHARE_SYMBOL));
        self.total_supply.set(U256::zero());
        self.access_controller.set(access_controller);
        self.asset.set(asset);
        self.total_cooling.set(U256::zero());
        self.cooldown_duration.set(cooldown_duration);
        self.vesting_period.set(vesting_period);
        self.vesting_amount.set(U256::zero());
        self.last_distribution.set(0);
        self.rewarder.set(None);
        self.direct_exit.set(direct_exit);
    }

    // ========== CEP-18 Standard Functions ==========

    pub fn name(&self) -> String {
        self.name.get_or_default()
    }

    pub fn symbol(&self) -> String {
        self.symbol.get_or_default()
    }

    pub fn decimals(&self) -> u8 {
        TOKEN_DECIMALS
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
        self.transfer_internal(sender, recipient, amount);
    }

    pub fn approve(&mut self, spender: Address, amount: U256) {
        let owner = self.env().caller();
        self.approve_internal(owner, spender, amount);
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) {
        let spender = self.env().caller();
        self.spend_allowance(owner, spender, amount);
        self.transfer_internal(owner, recipient, amount);
    }

    // ========== Deposits ==========

    /// Deposit `assets` yUSD and mint the matching shares to `receiver`.
    pub fn deposit(&mut self, assets: U256, receiver: Address) -> U256 {
        let caller = self.env().caller();
        self.require_can_deposit(caller, receiver);
        if assets.is_zero() {
            self.env().revert(ProtocolError::ZeroAmount);
        }

        let shares = self.preview_deposit(assets);
        if shares.is_zero() {
            self.env().revert(ProtocolError::ZeroShares);
        }
        self.enter(caller, receiver, assets, shares);
        shares
    }

    /// Mint exactly `shares` to `receiver`, pulling the assets they cost.
    pub fn mint(&mut self, shares: U256, receiver: Address) -> U256 {
        let caller = self.env().caller();
        self.require_can_deposit(caller, receiver);
        if shares.is_zero() {
            self.env().revert(ProtocolError::ZeroAmount);
        }

        let assets = self.preview_mint(shares);
        self.enter(caller, receiver, assets, shares);
        assets
    }

    // ========== Direct Exit ==========

    pub fn withdraw(&mut self, assets: U256, receiver: Address, owner: Address) -> U256 {
        self.require_direct_exit();
        if assets.is_zero() {
            self.env().revert(ProtocolError::ZeroAmount);
        }

        let shares = self.preview_withdraw(assets);
        self.exit(receiver, owner, assets, shares);
        shares
    }

    pub fn redeem(&mut self, shares: U256, receiver: Address, owner: Address) -> U256 {
        self.require_direct_exit();
        if shares.is_zero() {
            self.env().revert(ProtocolError::ZeroAmount);
        }

        let assets = self.preview_redeem(shares);
        self.exit(receiver, owner, assets, shares);
        assets
    }

    // ========== Cooldown Exit ==========

    /// Burn `shares` now and start a cooldown for the yUSD they are worth.
    pub fn cooldown_shares(&mut self, shares: U256) -> U256 {
        if shares.is_zero() {
            self.env().revert(ProtocolError::ZeroAmount);
        }

        let assets = self.preview_redeem(shares);
        self.start_cooldown(assets, shares);
        assets
    }

    /// Burn the shares worth `assets` now and start a cooldown for `assets`.
    pub fn cooldown_assets(&mut self, assets: U256) -> U256 {
        if assets.is_zero() {
            self.env().revert(ProtocolError::ZeroAmount);
        }

        let shares = self.preview_withdraw(assets);
        self.start_cooldown(assets, shares);
        shares
    }

    /// Pay out the caller's cooled-down yUSD to `receiver`.
    pub fn unstake(&mut self, receiver: Address) -> U256 {
        let owner = self.env().caller();
        let cooldown = self
            .cooldown_of(owner)
            .unwrap_or_else(|| self.env().revert(ProtocolError::NoCooldown));
        self.require_not_full_blacklisted(&[owner, receiver]);

        let now = self.env().get_block_time();
        if !cooldown.is_elapsed(now) && self.cooldown_duration() != 0 {
            self.env().revert(ProtocolError::CooldownNotElapsed);
        }

        let assets = cooldown.underlying_amount;
        self.cooldowns.set(&owner, None);
        let cooling = self.total_cooling();
        self.total_cooling.set(cooling.saturating_sub(assets));

        self.asset_ref().transfer(receiver, assets);

        self.env().emit_event(events::Unstaked {
            owner,
            receiver,
            assets,
        });
        assets
    }

    // ========== Rewards ==========

    /// Record yUSD rewards that have just been sent to the vault.
    ///
    /// Any part of a previous reward that has not vested yet is rolled into
    /// the new vesting schedule.
    pub fn notify_rewards(&mut self, amount: U256) {
        if self.rewarder() != Some(self.env().caller()) {
            self.env().revert(ProtocolError::NotRewarder);
        }

        let vesting_amount = if self.vesting_period() == 0 {
            U256::zero()
        } else {
            amount + self.get_unvested_amount()
        };
        let now = self.env().get_block_time();
        self.vesting_amount.set(vesting_amount);
        self.last_distribution.set(now);

        self.env().emit_event(events::RewardsReceived {
            amount,
            vesting_amount,
        });
    }

    pub fn get_unvested_amount(&self) -> U256 {
        math::unvested_amount(
            self.vesting_amount.get_or_default(),
            self.last_distribution.get_or_default(),
            self.vesting_period(),
            self.env().get_block_time(),
        )
    }

    // ========== Blacklist Recovery ==========

    /// Move the whole share balance of a fully blacklisted account to `to`.
    ///
    /// Pending cooldowns of `from` stay where they are.
    pub fn redistribute_locked_amount(&mut self, from: Address, to: Address) {
        let access = self.access();
        if !access.has_role(ROLE_CONTROLLER, self.env().caller()) {
            self.env().revert(ProtocolError::MissingRole);
        }
        if !access.is_redistribution_active() {
            self.env().revert(ProtocolError::RedistributionNotActive);
        }
        if access.blacklist_mode(from) != BlacklistMode::Full {
            self.env().revert(ProtocolError::NotFullyBlacklisted);
        }
        if access.blacklist_mode(to) != BlacklistMode::None {
            self.env().revert(ProtocolError::Blacklisted);
        }

        let shares = self.balance_of(from);
        self.move_shares(from, to, shares);
        self.env().emit_event(events::LockedAmountRedistributed { from, to, shares });
    }

    // ========== Admin Functions ==========

    pub fn set_cooldown_duration(&mut self, duration: u64) {
        self.require_role(ROLE_ADMIN);
        if duration > MAX_COOLDOWN_DURATION {
            self.env().revert(ProtocolError::InvalidDuration);
        }

        let previous = self.cooldown_duration();
        self.cooldown_duration.set(duration);
        self.env().emit_event(events::CooldownDurationUpdated {
            previous,
            current: duration,
        });
    }

    pub fn set_vesting_period(&mut self, period: u64) {
        self.require_role(ROLE_ADMIN);
        if period > MAX_VESTING_PERIOD {
            self.env().revert(ProtocolError::InvalidDuration);
        }
        if !self.get_unvested_amount().is_zero() {
            self.env().revert(ProtocolError::StillVesting);
        }

        let previous = self.vesting_period();
        self.vesting_period.set(period);
        self.env().emit_event(events::VestingPeriodUpdated {
            previous,
            current: period,
        });
    }

    pub fn set_rewarder(&mut self, rewarder: Address) {
        self.require_role(ROLE_ADMIN);
        self.rewarder.set(Some(rewarder));
        self.env().emit_event(events::RewarderUpdated { rewarder });
    }

    // ========== Views ==========

    /// yUSD held for shareholders: balance minus cooling and unvested amounts.
    pub fn total_assets(&self) -> U256 {
        let balance = self.asset_ref().balance_of(self.env().self_address());
        balance
            .saturating_sub(self.total_cooling())
            .saturating_sub(self.get_unvested_amount())
    }

    pub fn convert_to_shares(&self, assets: U256) -> U256 {
        math::convert_to_shares(assets, self.total_assets(), self.total_supply(), false)
            .or_revert(&self.env())
    }

    pub fn convert_to_assets(&self, shares: U256) -> U256 {
        math::convert_to_assets(shares, self.total_assets(), self.total_supply(), false)
            .or_revert(&self.env())
    }

    pub fn preview_deposit(&self, assets: U256) -> U256 {
        self.convert_to_shares(assets)
    }

    pub fn preview_mint(&self, shares: U256) -> U256 {
        math::convert_to_assets(shares, self.total_assets(), self.total_supply(), true)
            .or_revert(&self.env())
    }

    pub fn preview_withdraw(&self, assets: U256) -> U256 {
        math::convert_to_shares(assets, self.total_assets(), self.total_supply(), true)
            .or_revert(&self.env())
    }

    pub fn preview_redeem(&self, shares: U256) -> U256 {
        self.convert_to_assets(shares)
    }

    pub fn cooldown_of(&self, account: Address) -> Option<Cooldown> {
        self.cooldowns.get(&account).flatten()
    }

    /// Time left until `account` may unstake; zero when nothing is pending.
    pub fn cooldown_remaining(&self, account: Address) -> u64 {
        self.cooldown_of(account)
            .map(|cooldown| cooldown.cooldown_end.saturating_sub(self.env().get_block_time()))
            .unwrap_or(0)
    }

    pub fn total_cooling(&self) -> U256 {
        self.total_cooling.get_or_default()
    }

    pub fn cooldown_duration(&self) -> u64 {
        self.cooldown_duration.get_or_default()
    }

    pub fn vesting_period(&self) -> u64 {
        self.vesting_period.get_or_default()
    }

    pub fn rewarder(&self) -> Option<Address> {
        self.rewarder.get().flatten()
    }

    pub fn direct_exit_enabled(&self) -> bool {
        self.direct_exit.get_or_default()
    }

    pub fn asset(&self) -> Option<Address> {
        self.asset.get()
    }

    // ========== Internal Functions ==========

    fn enter(&mut self, caller: Address, receiver: Address, assets: U256, shares: U256) {
        self.mint_shares(receiver, shares);
        self.require_min_shares();

        let this = self.env().self_address();
        self.asset_ref().transfer_from(caller, this, assets);

        self.env().emit_event(events::Deposit {
            sender: caller,
            owner: receiver,
            assets,
            shares,
        });
    }

    fn exit(&mut self, receiver: Address, owner: Address, assets: U256, shares: U256) {
        let caller = self.env().caller();
        self.require_not_full_blacklisted(&[caller, receiver, owner]);
        if caller != owner {
            self.spend_allowance(owner, caller, shares);
        }

        self.burn_shares(owner, shares);
        self.require_min_shares();
        self.asset_ref().transfer(receiver, assets);

        self.env().emit_event(events::Withdraw {
            sender: caller,
            receiver,
            owner,
            assets,
            shares,
        });
    }

    fn start_cooldown(&mut self, assets: U256, shares: U256) {
        let owner = self.env().caller();
        self.require_not_full_blacklisted(&[owner]);

        self.burn_shares(owner, shares);
        self.require_min_shares();

        let cooldown_end = self.env().get_block_time() + self.cooldown_duration();
        let pending = self
            .cooldown_of(owner)
            .map(|cooldown| cooldown.underlying_amount)
            .unwrap_or_default();
        self.cooldowns.set(
            &owner,
            Some(Cooldown {
                owner,
                underlying_amount: pending + assets,
                cooldown_end,
            }),
        );
        let cooling = self.total_cooling();
        self.total_cooling.set(cooling + assets);

        self.env().emit_event(events::CooldownStarted {
            owner,
            assets,
            shares,
            cooldown_end,
        });
    }

    fn transfer_internal(&mut self, from: Address, to: Address, amount: U256) {
        self.require_not_full_blacklisted(&[from, to]);
        self.move_shares(from, to, amount);
    }

    fn move_shares(&mut self, from: Address, to: Address, amount: U256) {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            self.env().revert(ProtocolError::InsufficientShares);
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

    fn spend_allowance(&mut self, owner: Address, spender: Address, amount: U256) {
        let current = self.allowance(owner, spender);
        if current < amount {
            self.env().revert(ProtocolError::InsufficientAllowance);
        }
        self.allowances.set(&(owner, spender), current - amount);
    }

    fn mint_shares(&mut self, to: Address, shares: U256) {
        let balance = self.balance_of(to);
        self.balances.set(&to, balance + shares);
        let supply = self.total_supply();
        self.total_supply.set(supply + shares);
    }

    fn burn_shares(&mut self, from: Address, shares: U256) {
        let balance = self.balance_of(from);
        if balance < shares {
            self.env().revert(ProtocolError::InsufficientShares);
        }
        self.balances.set(&from, balance - shares);
        let supply = self.total_supply();
        self.total_supply.set(supply - shares);
    }

    fn require_min_shares(&self) {
        let supply = self.total_supply();
        if !supply.is_zero() && supply < U256::from(MIN_SHARES) {
            self.env().revert(ProtocolError::MinSharesViolation);
        }
    }

    fn require_can_deposit(&self, caller: Address, receiver: Address) {
        let access = self.access();
        if access.blacklist_mode(caller).blocks_deposits()
            || access.blacklist_mode(receiver).blocks_deposits()
        {
            self.env().revert(ProtocolError::Blacklisted);
        }
    }

    fn require_not_full_blacklisted(&self, accounts: &[Address]) {
        let access = self.access();
        if accounts
            .iter()
            .any(|account| access.blacklist_mode(*account).blocks_transfers())
        {
            self.env().revert(ProtocolError::Blacklisted);
        }
    }

    fn require_direct_exit(&self) {
        if !self.direct_exit_enabled() || self.cooldown_duration() != 0 {
            self.env().revert(ProtocolError::OperationNotAllowed);
        }
    }

    fn require_role(&self, role_id: u8) {
        if !self.access().has_role(role_id, self.env().caller()) {
            self.env().revert(ProtocolError::MissingRole);
        }
    }

    fn access(&self) -> AccessControllerContractRef {
        let address = self
            .access_controller
            .get_or_revert_with(ProtocolError::NotInitialized);
        AccessControllerContractRef::new(self.env(), address)
    }

    fn asset_ref(&self) -> Cep18TokenContractRef {
        let address = self.asset.get_or_revert_with(ProtocolError::NotInitialized);
        Cep18TokenContractRef::new(self.env(), address)
    }
}
