//! Roles, activation windows, blacklisting and redistribution.

use odra::casper_types::U256;
use pretty_assertions::assert_eq;

use yusd_contracts::access_control::{ROLE_ADMIN, ROLE_CONTROLLER, ROLE_GATEKEEPER};
use yusd_contracts::constants::DAY;
use yusd_contracts::errors::ProtocolError;
use yusd_contracts::types::BlacklistMode;

use crate::common::{order, usdc, wad, Protocol};

#[test]
fn test_role_management() {
    let mut p = Protocol::setup();
    let (admin, alice, bob) = (p.admin, p.alice, p.bob);

    assert!(p.access.has_role(ROLE_ADMIN, admin));
    assert!(p.access.has_role(ROLE_CONTROLLER, admin));

    p.access.grant_role(ROLE_GATEKEEPER, alice);
    assert!(p.access.has_role(ROLE_GATEKEEPER, alice));
    assert_eq!(p.access.get_role_member_count(ROLE_GATEKEEPER), 2);

    p.access.revoke_role(ROLE_GATEKEEPER, alice);
    assert!(!p.access.has_role(ROLE_GATEKEEPER, alice));

    assert_eq!(
        p.access.try_revoke_role(ROLE_ADMIN, admin),
        Err(ProtocolError::LastAdmin.into())
    );
    assert_eq!(
        p.access.try_renounce_role(ROLE_ADMIN),
        Err(ProtocolError::LastAdmin.into())
    );

    p.env.set_caller(bob);
    assert_eq!(
        p.access.try_grant_role(ROLE_ADMIN, bob),
        Err(ProtocolError::MissingRole.into())
    );

    p.env.set_caller(admin);
    p.access.grant_role(ROLE_ADMIN, bob);
    p.access.renounce_role(ROLE_ADMIN);
    assert!(!p.access.has_role(ROLE_ADMIN, admin));
    assert!(p.access.has_role(ROLE_ADMIN, bob));
}

#[test]
fn test_activation_notice() {
    let mut p = Protocol::setup();
    let now = p.env.block_time();
    assert_eq!(
        p.access.try_set_blacklist_activation_time(now + 15 * DAY - 1),
        Err(ProtocolError::NoticeTooShort.into())
    );
    p.access.set_blacklist_activation_time(now + 15 * DAY);
    assert_eq!(p.access.blacklist_activation_time(), Some(now + 15 * DAY));
    assert!(!p.access.is_blacklist_active());

    p.env.set_caller(p.bob);
    assert_eq!(
        p.access.try_set_blacklist_activation_time(now + 30 * DAY),
        Err(ProtocolError::MissingRole.into())
    );
}

#[test]
fn test_windows_are_mutually_exclusive() {
    let mut p = Protocol::setup();
    let now = p.env.block_time();

    p.access.set_blacklist_activation_time(now + 15 * DAY);
    assert_eq!(
        p.access.try_set_redistribution_activation_time(now + 20 * DAY),
        Err(ProtocolError::WindowConflict.into())
    );

    p.env.advance_block_time(15 * DAY);
    assert!(p.access.is_blacklist_active());
    let now = p.env.block_time();
    p.access.set_redistribution_activation_time(now + 15 * DAY);

    assert_eq!(
        p.access.try_set_blacklist_activation_time(now + 20 * DAY),
        Err(ProtocolError::WindowConflict.into())
    );

    p.env.advance_block_time(15 * DAY);
    assert!(p.access.is_redistribution_active());
    let now = p.env.block_time();
    p.access.set_blacklist_activation_time(now + 15 * DAY);
}

#[test]
fn test_disable_requires_active_window() {
    let mut p = Protocol::setup();
    let alice = p.alice;
    assert_eq!(
        p.access.try_disable_account(alice, BlacklistMode::Soft),
        Err(ProtocolError::BlacklistNotActive.into())
    );

    p.activate_blacklist();
    assert_eq!(
        p.access.try_disable_account(alice, BlacklistMode::None),
        Err(ProtocolError::InvalidBlacklistMode.into())
    );
    p.access.disable_account(alice, BlacklistMode::Soft);
    assert_eq!(p.access.blacklist_mode(alice), BlacklistMode::Soft);

    p.access.enable_account(alice);
    assert_eq!(p.access.blacklist_mode(alice), BlacklistMode::None);
}

#[test]
fn test_soft_blacklist_blocks_deposits_only() {
    let mut p = Protocol::setup();
    p.seed_vault();
    let (alice, bob, asset, token, vault) =
        (p.alice, p.bob, p.usdc_addr(), p.token_addr(), p.vault_addr());
    p.mint_with_usdc(alice, 100);
    p.usdc.mint(alice, usdc(10));

    p.activate_blacklist();
    p.access.disable_account(alice, BlacklistMode::Soft);

    p.env.set_caller(alice);
    p.usdc.approve(token, usdc(10));
    assert_eq!(
        p.token.try_mint(order(alice, alice, asset, usdc(10), wad(10))),
        Err(ProtocolError::Blacklisted.into())
    );
    p.token.approve(vault, wad(10));
    assert_eq!(
        p.vault.try_deposit(wad(10), alice),
        Err(ProtocolError::Blacklisted.into())
    );

    // Soft-restricted accounts can still move funds out
    p.token.transfer(bob, wad(40));
    p.token.redeem(order(alice, alice, asset, usdc(10), wad(10)));
    assert_eq!(p.token.balance_of(alice), wad(50));

    // Nobody can deposit on their behalf either
    p.env.set_caller(bob);
    p.token.approve(vault, wad(10));
    assert_eq!(
        p.vault.try_deposit(wad(10), alice),
        Err(ProtocolError::Blacklisted.into())
    );
}

#[test]
fn test_full_blacklist_freezes_balances() {
    let mut p = Protocol::setup();
    p.seed_vault();
    let (alice, bob, asset) = (p.alice, p.bob, p.usdc_addr());
    p.mint_with_usdc(alice, 100);
    p.stake(alice, wad(50));

    p.activate_blacklist();
    p.access.disable_account(alice, BlacklistMode::Full);

    p.env.set_caller(alice);
    assert_eq!(
        p.token.try_transfer(bob, wad(1)),
        Err(ProtocolError::Blacklisted.into())
    );
    assert_eq!(
        p.token.try_redeem(order(alice, alice, asset, usdc(1), wad(1))),
        Err(ProtocolError::Blacklisted.into())
    );
    assert_eq!(
        p.vault.try_transfer(bob, wad(1)),
        Err(ProtocolError::Blacklisted.into())
    );
    assert_eq!(
        p.vault.try_cooldown_shares(wad(1)),
        Err(ProtocolError::Blacklisted.into())
    );

    p.env.set_caller(bob);
    assert_eq!(
        p.token.try_transfer(alice, U256::zero()),
        Err(ProtocolError::Blacklisted.into())
    );
}

#[test]
fn test_redistribute_locked_amount() {
    let mut p = Protocol::setup();
    p.seed_vault();
    let (alice, bob) = (p.alice, p.bob);
    p.mint_with_usdc(alice, 100);
    p.stake(alice, wad(60));
    p.env.set_caller(alice);
    p.vault.cooldown_shares(wad(10));

    p.activate_blacklist();
    p.access.disable_account(alice, BlacklistMode::Full);
    assert_eq!(
        p.vault.try_redistribute_locked_amount(alice, bob),
        Err(ProtocolError::RedistributionNotActive.into())
    );

    p.activate_redistribution();
    assert_eq!(
        p.vault.try_redistribute_locked_amount(bob, alice),
        Err(ProtocolError::NotFullyBlacklisted.into())
    );

    let price_before = p.vault.convert_to_assets(wad(1));
    p.vault.redistribute_locked_amount(alice, bob);

    assert_eq!(p.vault.balance_of(alice), U256::zero());
    assert_eq!(p.vault.balance_of(bob), wad(50));
    assert_eq!(p.vault.convert_to_assets(wad(1)), price_before);
    // Pending cooldowns stay with the blacklisted owner
    assert_eq!(p.vault.cooldown_of(alice).unwrap().underlying_amount, wad(10));

    p.env.set_caller(bob);
    assert_eq!(
        p.vault.try_redistribute_locked_amount(alice, bob),
        Err(ProtocolError::MissingRole.into())
    );
}

#[test]
fn test_full_blacklist_blocks_unstake() {
    let mut p = Protocol::setup();
    p.seed_vault();
    let (alice, bob) = (p.alice, p.bob);
    p.mint_with_usdc(alice, 60);
    p.mint_with_usdc(bob, 10);
    p.stake(alice, wad(60));
    p.stake(bob, wad(10));

    p.env.set_caller(alice);
    p.vault.cooldown_shares(wad(10));
    p.env.set_caller(bob);
    p.vault.cooldown_shares(wad(10));

    // Activation moves time well past the 7 day cooldown
    p.activate_blacklist();
    p.access.disable_account(alice, BlacklistMode::Full);

    p.env.set_caller(alice);
    assert_eq!(
        p.vault.try_unstake(bob),
        Err(ProtocolError::Blacklisted.into())
    );
    assert_eq!(p.token.balance_of(bob), U256::zero());

    // Nor can a clean owner pay out to a frozen receiver
    p.env.set_caller(bob);
    assert_eq!(
        p.vault.try_unstake(alice),
        Err(ProtocolError::Blacklisted.into())
    );
    assert_eq!(p.vault.unstake(bob), wad(10));

    p.env.set_caller(p.admin);
    p.access.enable_account(alice);
    p.env.set_caller(alice);
    assert_eq!(p.vault.unstake(alice), wad(10));
}
