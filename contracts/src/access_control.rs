//! Access Controller Contract
//!
//! Shared role store, pause switch and blacklist registry for the yUSD
//! protocol. The token, backing and vault contracts query it on every
//! privileged or restricted call.
//!
//! Role hierarchy:
//! - ADMIN grants and revokes every role by default
//! - GATEKEEPER pauses and unpauses, and may disable minting on the token
//! - COLLATERAL_MANAGER moves collateral between the token, backing and market
//! - CONTROLLER schedules blacklist windows and manages blacklisted accounts
//!
//! Blacklisting happens in two phases. The controller first schedules an
//! activation time at least 15 days out; accounts can only be disabled once
//! that time has passed. Redistribution of a fully blacklisted account's
//! vault shares is gated by its own window, and the two windows are never
//! pending at the same time.

use odra::prelude::*;
use crate::constants::ACTIVATION_NOTICE;
use crate::errors::ProtocolError;
use crate::types::BlacklistMode;

/// Role constants (u8 for efficient storage)
pub const ROLE_ADMIN: u8 = 0;
pub const ROLE_GATEKEEPER: u8 = 1;
pub const ROLE_COLLATERAL_MANAGER: u8 = 2;
pub const ROLE_CONTROLLER: u8 = 3;

const ROLE_COUNT: u8 = 4;

pub mod events {
    use odra::prelude::*;
    use crate::types::BlacklistMode;

    #[odra::event]
    pub struct RoleGranted {
        pub role: u8,
        pub account: Address,
        pub sender: Address,
    }

    #[odra::event]
    pub struct RoleRevoked {
        pub role: u8,
        pub account: Address,
        pub sender: Address,
    }

    #[odra::event]
    pub struct Paused {
        pub by: Address,
    }

    #[odra::event]
    pub struct Unpaused {
        pub by: Address,
    }

    #[odra::event]
    pub struct BlacklistActivationScheduled {
        pub activation_time: u64,
    }

    #[odra::event]
    pub struct RedistributionActivationScheduled {
        pub activation_time: u64,
    }

    #[odra::event]
    pub struct AccountDisabled {
        pub account: Address,
        pub mode: BlacklistMode,
    }

    #[odra::event]
    pub struct AccountEnabled {
        pub account: Address,
    }
}

/// Access Controller Contract
#[odra::module(events = [
    events::RoleGranted,
    events::RoleRevoked,
    events::Paused,
    events::Unpaused,
    events::BlacklistActivationScheduled,
    events::RedistributionActivationScheduled,
    events::AccountDisabled,
    events::AccountEnabled
])]
pub struct AccessController {
    /// Role assignments: (role, account) -> bool
    roles: Mapping<(u8, Address), bool>,
    /// Role admin mapping: role -> admin_role
    role_admin: Mapping<u8, u8>,
    /// Number of accounts with each role
    role_count: Mapping<u8, u32>,
    paused: Var<bool>,
    blacklist: Mapping<Address, BlacklistMode>,
    /// When disabling accounts becomes possible
    blacklist_activation: Var<Option<u64>>,
    /// When redistributing blacklisted balances becomes possible
    redistribution_activation: Var<Option<u64>>,
}

#[odra::module]
impl AccessController {
    /// Initialize with the first admin. The admin also receives the other
    /// roles so a fresh deployment is operable before roles are split up.
    pub fn init(&mut self, initial_admin: Address) {
        for role_id in 0..ROLE_COUNT {
            self.role_admin.set(&role_id, ROLE_ADMIN);
            self.set_role_internal(role_id, initial_admin, true);
        }
        self.paused.set(false);
    }

    // ========== Role Query Functions ==========

    /// Check if account has a specific role
    pub fn has_role(&self, role_id: u8, account: Address) -> bool {
        self.roles.get(&(role_id, account)).unwrap_or(false)
    }

    /// Get the admin role for a given role
    pub fn get_role_admin(&self, role_id: u8) -> u8 {
        self.role_admin.get(&role_id).unwrap_or(ROLE_ADMIN)
    }

    /// Get the number of accounts with a role
    pub fn get_role_member_count(&self, role_id: u8) -> u32 {
        self.role_count.get(&role_id).unwrap_or(0)
    }

    // ========== Role Management Functions ==========

    /// Grant a role to an account (requires role admin)
    pub fn grant_role(&mut self, role_id: u8, account: Address) {
        self.require_role_admin(role_id);

        if self.has_role(role_id, account) {
            return;
        }

        self.set_role_internal(role_id, account, true);
        self.env().emit_event(events::RoleGranted {
            role: role_id,
            account,
            sender: self.env().caller(),
        });
    }

    /// Revoke a role from an account (requires role admin)
    pub fn revoke_role(&mut self, role_id: u8, account: Address) {
        self.require_role_admin(role_id);

        if !self.has_role(role_id, account) {
            return;
        }

        self.require_not_last_admin(role_id);
        self.set_role_internal(role_id, account, false);
        self.env().emit_event(events::RoleRevoked {
            role: role_id,
            account,
            sender: self.env().caller(),
        });
    }

    /// Renounce a role (caller gives up their own role)
    pub fn renounce_role(&mut self, role_id: u8) {
        let caller = self.env().caller();

        if !self.has_role(role_id, caller) {
            return;
        }

        self.require_not_last_admin(role_id);
        self.set_role_internal(role_id, caller, false);
        self.env().emit_event(events::RoleRevoked {
            role: role_id,
            account: caller,
            sender: caller,
        });
    }

    /// Set the admin role for a role (admin only)
    pub fn set_role_admin(&mut self, role_id: u8, admin_role_id: u8) {
        self.require_role(ROLE_ADMIN);
        self.role_admin.set(&role_id, admin_role_id);
    }

    // ========== Pause ==========

    pub fn pause(&mut self) {
        self.require_role(ROLE_GATEKEEPER);
        self.paused.set(true);
        self.env().emit_event(events::Paused {
            by: self.env().caller(),
        });
    }

    pub fn unpause(&mut self) {
        self.require_role(ROLE_GATEKEEPER);
        self.paused.set(false);
        self.env().emit_event(events::Unpaused {
            by: self.env().caller(),
        });
    }

    pub fn is_paused(&self) -> bool {
        self.paused.get_or_default()
    }

    // ========== Blacklist Windows ==========

    /// Schedule when accounts may start being disabled.
    pub fn set_blacklist_activation_time(&mut self, activation_time: u64) {
        self.require_role(ROLE_CONTROLLER);
        self.require_notice(activation_time);
        if self.is_pending(self.redistribution_activation.get().flatten()) {
            self.env().revert(ProtocolError::WindowConflict);
        }

        self.blacklist_activation.set(Some(activation_time));
        self.env().emit_event(events::BlacklistActivationScheduled { activation_time });
    }

    /// Schedule when blacklisted balances may start being redistributed.
    pub fn set_redistribution_activation_time(&mut self, activation_time: u64) {
        self.require_role(ROLE_CONTROLLER);
        self.require_notice(activation_time);
        if self.is_pending(self.blacklist_activation.get().flatten()) {
            self.env().revert(ProtocolError::WindowConflict);
        }

        self.redistribution_activation.set(Some(activation_time));
        self.env().emit_event(events::RedistributionActivationScheduled { activation_time });
    }

    pub fn is_blacklist_active(&self) -> bool {
        self.is_elapsed(self.blacklist_activation.get().flatten())
    }

    pub fn is_redistribution_active(&self) -> bool {
        self.is_elapsed(self.redistribution_activation.get().flatten())
    }

    pub fn blacklist_activation_time(&self) -> Option<u64> {
        self.blacklist_activation.get().flatten()
    }

    pub fn redistribution_activation_time(&self) -> Option<u64> {
        self.redistribution_activation.get().flatten()
    }

    // ========== Blacklist ==========

    /// Restrict an account. `mode` must be Soft or Full.
    pub fn disable_account(&mut self, account: Address, mode: BlacklistMode) {
        self.require_role(ROLE_CONTROLLER);
        if !self.is_blacklist_active() {
            self.env().revert(ProtocolError::BlacklistNotActive);
        }
        if mode == BlacklistMode::None {
            self.env().revert(ProtocolError::InvalidBlacklistMode);
        }

        self.blacklist.set(&account, mode);
        self.env().emit_event(events::AccountDisabled { account, mode });
    }

    pub fn enable_account(&mut self, account: Address) {
        self.require_role(ROLE_CONTROLLER);
        if !self.is_blacklist_active() {
            self.env().revert(ProtocolError::BlacklistNotActive);
        }

        self.blacklist.set(&account, BlacklistMode::None);
        self.env().emit_event(events::AccountEnabled { account });
    }

    pub fn blacklist_mode(&self, account: Address) -> BlacklistMode {
        self.blacklist.get_or_default(&account)
    }

    // ========== Internal Functions ==========

    fn set_role_internal(&mut self, role_id: u8, account: Address, value: bool) {
        let had_role = self.roles.get(&(role_id, account)).unwrap_or(false);

        self.roles.set(&(role_id, account), value);

        let current_count = self.role_count.get(&role_id).unwrap_or(0);
        if value && !had_role {
            self.role_count.set(&role_id, current_count + 1);
        } else if !value && had_role && current_count > 0 {
            self.role_count.set(&role_id, current_count - 1);
        }
    }

    fn require_role(&self, role_id: u8) {
        if !self.has_role(role_id, self.env().caller()) {
            self.env().revert(ProtocolError::MissingRole);
        }
    }

    fn require_role_admin(&self, role_id: u8) {
        self.require_role(self.get_role_admin(role_id));
    }

    fn require_not_last_admin(&self, role_id: u8) {
        if role_id == ROLE_ADMIN && self.get_role_member_count(ROLE_ADMIN) <= 1 {
            self.env().revert(ProtocolError::LastAdmin);
        }
    }

    fn require_notice(&self, activation_time: u64) {
        let earliest = self.env().get_block_time().saturating_add(ACTIVATION_NOTICE);
        if activation_time < earliest {
            self.env().revert(ProtocolError::NoticeTooShort);
        }
    }

    fn is_pending(&self, activation: Option<u64>) -> bool {
        matches!(activation, Some(t) if self.env().get_block_time() < t)
    }

    fn is_elapsed(&self, activation: Option<u64>) -> bool {
        matches!(activation, Some(t) if self.env().get_block_time() >= t)
    }
}
