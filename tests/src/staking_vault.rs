//! Staking vault scenarios: deposits, cooldown exit, rewards and vesting.

use odra::casper_types::U256;
use pretty_assertions::assert_eq;

use yusd_contracts::constants::{DAY, MIN_SHARES};
use yusd_contracts::errors::ProtocolError;

use crate::common::{wad, Config, Protocol};

const HOUR: u64 = DAY / 24;

fn direct_exit() -> Config {
    Config {
        cooldown_duration: 0,
        direct_exit: true,
        ..Config::default()
    }
}

#[test]
fn test_cooldown_lifecycle() {
    let mut p = Protocol::setup();
    p.seed_vault();
    let alice = p.alice;
    p.mint_with_usdc(alice, 10);

    let shares = p.stake(alice, wad(10));
    assert_eq!(shares, wad(10));

    p.env.set_caller(alice);
    let assets = p.vault.cooldown_shares(wad(5));
    assert_eq!(assets, wad(5));
    assert_eq!(p.vault.balance_of(alice), wad(5));

    let cooldown = p.vault.cooldown_of(alice).unwrap();
    assert_eq!(cooldown.owner, alice);
    assert_eq!(cooldown.underlying_amount, wad(5));
    assert_eq!(cooldown.cooldown_end, p.env.block_time() + 7 * DAY);
    assert_eq!(p.vault.total_cooling(), wad(5));
    assert_eq!(p.vault.cooldown_remaining(alice), 7 * DAY);

    // Cooling assets no longer count towards the share price
    assert_eq!(p.vault.total_assets(), wad(6));

    p.env.advance_block_time(7 * DAY - 1);
    assert_eq!(
        p.vault.try_unstake(alice),
        Err(ProtocolError::CooldownNotElapsed.into())
    );

    p.env.advance_block_time(1);
    assert_eq!(p.vault.unstake(alice), wad(5));
    assert_eq!(p.token.balance_of(alice), wad(5));
    assert_eq!(p.vault.cooldown_of(alice), None);
    assert_eq!(p.vault.total_cooling(), U256::zero());
    assert_eq!(
        p.vault.try_unstake(alice),
        Err(ProtocolError::NoCooldown.into())
    );
}

#[test]
fn test_overlapping_cooldown_carries_amount_forward() {
    let mut p = Protocol::setup();
    p.seed_vault();
    let alice = p.alice;
    p.mint_with_usdc(alice, 10);
    p.stake(alice, wad(10));

    p.env.set_caller(alice);
    p.vault.cooldown_shares(wad(2));
    p.env.advance_block_time(DAY);
    p.vault.cooldown_shares(wad(3));

    let cooldown = p.vault.cooldown_of(alice).unwrap();
    assert_eq!(cooldown.underlying_amount, wad(5));
    assert_eq!(cooldown.cooldown_end, p.env.block_time() + 7 * DAY);
    assert_eq!(p.vault.balance_of(alice), wad(5));
}

#[test]
fn test_cooldown_assets_burns_matching_shares() {
    let mut p = Protocol::setup();
    p.seed_vault();
    let alice = p.alice;
    p.mint_with_usdc(alice, 10);
    p.stake(alice, wad(10));

    p.env.set_caller(alice);
    assert_eq!(p.vault.cooldown_assets(wad(4)), wad(4));
    assert_eq!(p.vault.balance_of(alice), wad(6));
    assert_eq!(p.vault.cooldown_of(alice).unwrap().underlying_amount, wad(4));
}

#[test]
fn test_direct_exit_disabled_by_default() {
    let mut p = Protocol::setup();
    p.seed_vault();
    let alice = p.alice;
    p.mint_with_usdc(alice, 10);
    p.stake(alice, wad(10));
    assert!(!p.vault.direct_exit_enabled());

    p.env.set_caller(alice);
    assert_eq!(
        p.vault.try_withdraw(wad(1), alice, alice),
        Err(ProtocolError::OperationNotAllowed.into())
    );
    assert_eq!(
        p.vault.try_redeem(wad(1), alice, alice),
        Err(ProtocolError::OperationNotAllowed.into())
    );

    // A zero cooldown does not re-enable them
    p.env.set_caller(p.admin);
    p.vault.set_cooldown_duration(0);
    p.env.set_caller(alice);
    assert_eq!(
        p.vault.try_redeem(wad(1), alice, alice),
        Err(ProtocolError::OperationNotAllowed.into())
    );
}

#[test]
fn test_zero_cooldown_exits_immediately() {
    let mut p = Protocol::setup_with(Config {
        cooldown_duration: 0,
        ..Config::default()
    });
    p.seed_vault();
    let alice = p.alice;
    p.mint_with_usdc(alice, 10);
    p.stake(alice, wad(10));

    p.env.set_caller(alice);
    assert_eq!(p.vault.cooldown_shares(wad(5)), wad(5));
    let cooldown = p.vault.cooldown_of(alice).unwrap();
    assert_eq!(cooldown.cooldown_end, p.env.block_time());
    assert_eq!(p.vault.cooldown_remaining(alice), 0);

    assert_eq!(p.vault.unstake(alice), wad(5));
    assert_eq!(p.token.balance_of(alice), wad(5));
    assert_eq!(p.vault.cooldown_of(alice), None);
}

#[test]
fn test_direct_exit_variant() {
    let mut p = Protocol::setup_with(direct_exit());
    p.seed_vault();
    let alice = p.alice;
    p.mint_with_usdc(alice, 10);
    p.stake(alice, wad(10));
    assert!(p.vault.direct_exit_enabled());

    p.env.set_caller(alice);
    assert_eq!(p.vault.redeem(wad(4), alice, alice), wad(4));
    assert_eq!(p.vault.withdraw(wad(6), alice, alice), wad(6));
    assert_eq!(p.token.balance_of(alice), wad(10));

    // Turning the cooldown back on closes the direct path
    p.env.set_caller(p.admin);
    p.vault.set_cooldown_duration(DAY);
    assert_eq!(
        p.vault.try_redeem(wad(1), p.admin, p.admin),
        Err(ProtocolError::OperationNotAllowed.into())
    );
}

#[test]
fn test_redeem_on_behalf_consumes_allowance() {
    let mut p = Protocol::setup_with(direct_exit());
    p.seed_vault();
    let (alice, bob, vault) = (p.alice, p.bob, p.vault_addr());
    p.mint_with_usdc(alice, 10);
    p.stake(alice, wad(10));

    p.env.set_caller(bob);
    assert_eq!(
        p.vault.try_redeem(wad(1), bob, alice),
        Err(ProtocolError::InsufficientAllowance.into())
    );

    p.env.set_caller(alice);
    p.vault.approve(bob, wad(3));
    p.env.set_caller(bob);
    p.vault.redeem(wad(3), bob, alice);

    assert_eq!(p.token.balance_of(bob), wad(3));
    assert_eq!(p.vault.allowance(alice, bob), U256::zero());
    assert_eq!(p.token.balance_of(vault), wad(8));
}

#[test]
fn test_share_floor() {
    let mut p = Protocol::setup_with(direct_exit());
    let (alice, vault) = (p.alice, p.vault_addr());
    p.mint_with_dai(alice, 2);

    p.env.set_caller(alice);
    p.token.approve(vault, wad(2));
    let below_floor = U256::from(MIN_SHARES) - 1;
    assert_eq!(
        p.vault.try_deposit(below_floor, alice),
        Err(ProtocolError::MinSharesViolation.into())
    );

    p.vault.deposit(wad(2), alice);
    assert_eq!(
        p.vault.try_redeem(wad(1) + 1, alice, alice),
        Err(ProtocolError::MinSharesViolation.into())
    );

    // Leaving exactly the floor, or nothing, is fine
    p.vault.redeem(wad(1), alice, alice);
    p.vault.redeem(wad(1), alice, alice);
    assert_eq!(p.vault.total_supply(), U256::zero());
}

#[test]
fn test_share_price_rises_with_rewards() {
    let mut p = Protocol::setup();
    p.seed_vault();
    let (alice, vault) = (p.alice, p.vault_addr());
    p.mint_with_usdc(alice, 19);
    p.stake(alice, wad(9));

    // Direct transfers raise total assets immediately when nothing vests
    p.env.set_caller(alice);
    p.token.transfer(vault, wad(10));

    assert_eq!(p.vault.total_assets(), wad(20));
    assert_eq!(p.vault.convert_to_assets(wad(9)), wad(18));
    assert_eq!(p.vault.preview_deposit(wad(2)), wad(1));
}

#[test]
fn test_rewards_vest_linearly() {
    let mut p = Protocol::setup_with(Config {
        vesting_period: 8 * HOUR,
        ..Config::default()
    });
    p.seed_vault();
    let alice = p.alice;
    p.mint_with_usdc(alice, 1000);
    p.token.supply_to_backing(U256::zero(), U256::zero());
    p.accrue_usdc_yield(100);

    let before = p.vault.total_assets();
    p.backing.compound();

    // 80 yUSD to the vault, none of it vested yet
    assert_eq!(p.vault.get_unvested_amount(), wad(80));
    assert_eq!(p.vault.total_assets(), before);

    p.env.advance_block_time(4 * HOUR);
    assert_eq!(p.vault.get_unvested_amount(), wad(40));
    assert_eq!(p.vault.total_assets(), before + wad(40));
    assert_eq!(
        p.vault.try_set_vesting_period(HOUR),
        Err(ProtocolError::StillVesting.into())
    );

    p.env.advance_block_time(4 * HOUR);
    assert_eq!(p.vault.get_unvested_amount(), U256::zero());
    assert_eq!(p.vault.total_assets(), before + wad(80));
    p.vault.set_vesting_period(HOUR);
    assert_eq!(p.vault.vesting_period(), HOUR);
}

#[test]
fn test_notify_rewards_only_from_rewarder() {
    let mut p = Protocol::setup();
    p.env.set_caller(p.bob);
    assert_eq!(
        p.vault.try_notify_rewards(wad(1)),
        Err(ProtocolError::NotRewarder.into())
    );
}

#[test]
fn test_admin_bounds() {
    let mut p = Protocol::setup();
    assert_eq!(
        p.vault.try_set_cooldown_duration(90 * DAY + 1),
        Err(ProtocolError::InvalidDuration.into())
    );
    assert_eq!(
        p.vault.try_set_vesting_period(90 * DAY + 1),
        Err(ProtocolError::InvalidDuration.into())
    );
    p.vault.set_cooldown_duration(90 * DAY);
    assert_eq!(p.vault.cooldown_duration(), 90 * DAY);

    p.env.set_caller(p.bob);
    assert_eq!(
        p.vault.try_set_cooldown_duration(DAY),
        Err(ProtocolError::MissingRole.into())
    );
}
