//! Protocol-wide constants.
//!
//! All durations are expressed in block-time units (milliseconds), the unit
//! returned by `ContractEnv::get_block_time`.

pub const SECOND: u64 = 1_000;
pub const DAY: u64 = 86_400 * SECOND;

/// Decimals of yUSD and of the vault share token.
pub const TOKEN_DECIMALS: u8 = 18;

/// Basis points scale (100% = 10000 bps)
pub const BPS_SCALE: u32 = 10_000;

/// Internal precision scale (1e18)
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

/// Delay before a proposed collateral spender may accept.
pub const COLLATERAL_SPENDER_DELAY: u64 = 10 * DAY;

/// Delay before Backing market and team-share proposals may be accepted.
pub const BACKING_PROPOSAL_DELAY: u64 = 10 * DAY;

/// Execution window for a proposed redeem cap: opens after 14 days, closes after 16.
pub const REDEEM_CAP_DELAY: u64 = 14 * DAY;
pub const REDEEM_CAP_EXPIRY: u64 = 16 * DAY;

/// Lowest per-block redeem cap a proposal may set (100,000 yUSD).
pub const MIN_REDEEM_CAP: u128 = 100_000 * PRECISION;

/// Minimum notice for blacklist and redistribution activation times.
pub const ACTIVATION_NOTICE: u64 = 15 * DAY;

/// Vault share supply must be zero or at least this much (1 share).
pub const MIN_SHARES: u128 = PRECISION;

/// Upper bound for the vault cooldown and vesting durations.
pub const MAX_COOLDOWN_DURATION: u64 = 90 * DAY;
pub const MAX_VESTING_PERIOD: u64 = 90 * DAY;
