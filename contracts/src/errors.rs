//! Protocol error definitions.

use odra::prelude::*;
use odra::ContractEnv;

/// Coarse classification of protocol errors.
///
/// Every [`ProtocolError`] code falls into one hundred-block per kind, so the
/// kind can be recovered from the numeric code alone.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    Validation,
    Authorization,
    RateLimit,
    Timelock,
    InsufficientBalance,
    State,
}

/// yUSD protocol errors
#[repr(u16)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ProtocolError {
    // Validation errors (1xx)
    InvalidRatio = 100,
    DustRemainder = 101,
    UnsupportedAsset = 102,
    UnsupportedDecimals = 103,
    ZeroAmount = 104,
    InvalidAddress = 105,
    InvalidBps = 106,
    BelowRedeemFloor = 107,
    SlippageExceeded = 108,
    MinSharesViolation = 109,
    NoticeTooShort = 110,
    InvalidBlacklistMode = 111,
    InvalidDuration = 112,
    ZeroShares = 113,
    MathOverflow = 114,

    // Authorization errors (2xx)
    MissingRole = 200,
    NotBenefactor = 201,
    NotProposedSpender = 202,
    Blacklisted = 203,
    Paused = 204,
    NotCollateralSpender = 205,
    NotRewarder = 206,
    NotToken = 207,
    NotMinter = 208,

    // Rate limit errors (3xx)
    MintCapExceeded = 300,
    RedeemCapExceeded = 301,

    // Timelock errors (4xx)
    NoPendingProposal = 400,
    TimelockNotElapsed = 401,
    ProposalExpired = 402,
    BlacklistNotActive = 403,
    RedistributionNotActive = 404,

    // Balance errors (5xx)
    InsufficientTokenBalance = 500,
    InsufficientAllowance = 501,
    InsufficientCollateral = 502,
    InsufficientShares = 503,
    CollateralTransferFailed = 504,

    // State errors (6xx)
    CooldownNotElapsed = 600,
    NoCooldown = 601,
    WindowConflict = 602,
    Reentrancy = 603,
    OperationNotAllowed = 604,
    AlreadyInitialized = 605,
    NotInitialized = 606,
    PositionNotEmpty = 607,
    NotFullyBlacklisted = 608,
    LastAdmin = 609,
    StillVesting = 610,
}

impl ProtocolError {
    pub const fn kind(&self) -> ErrorKind {
        match *self as u16 / 100 {
            1 => ErrorKind::Validation,
            2 => ErrorKind::Authorization,
            3 => ErrorKind::RateLimit,
            4 => ErrorKind::Timelock,
            5 => ErrorKind::InsufficientBalance,
            _ => ErrorKind::State,
        }
    }

    pub const fn message(&self) -> &'static str {
        match self {
            // Validation
            ProtocolError::InvalidRatio => "Collateral and token amounts do not match 1:1",
            ProtocolError::DustRemainder => "Token amount leaves a collateral dust remainder",
            ProtocolError::UnsupportedAsset => "Collateral asset not supported",
            ProtocolError::UnsupportedDecimals => "Collateral decimals above 18",
            ProtocolError::ZeroAmount => "Amount must be non-zero",
            ProtocolError::InvalidAddress => "Invalid address",
            ProtocolError::InvalidBps => "Basis points above 10000",
            ProtocolError::BelowRedeemFloor => "Redeem cap below protocol floor",
            ProtocolError::SlippageExceeded => "Yield-bearing amount credited below minimum",
            ProtocolError::MinSharesViolation => "Share supply below minimum",
            ProtocolError::NoticeTooShort => "Activation time inside minimum notice period",
            ProtocolError::InvalidBlacklistMode => "Invalid blacklist mode",
            ProtocolError::InvalidDuration => "Duration out of bounds",
            ProtocolError::ZeroShares => "Operation would mint or burn zero shares",
            ProtocolError::MathOverflow => "Arithmetic overflow",

            // Authorization
            ProtocolError::MissingRole => "Unauthorized: caller lacks required role",
            ProtocolError::NotBenefactor => "Unauthorized: caller is not the order benefactor",
            ProtocolError::NotProposedSpender => "Unauthorized: caller is not the proposed spender",
            ProtocolError::Blacklisted => "Unauthorized: account is blacklisted",
            ProtocolError::Paused => "Operation blocked: protocol paused",
            ProtocolError::NotCollateralSpender => "Unauthorized: caller is not the collateral spender",
            ProtocolError::NotRewarder => "Unauthorized: caller is not the rewarder",
            ProtocolError::NotToken => "Unauthorized: caller is not the token",
            ProtocolError::NotMinter => "Unauthorized: caller is not a minter",

            // Rate limit
            ProtocolError::MintCapExceeded => "Per-block mint cap exceeded",
            ProtocolError::RedeemCapExceeded => "Per-block redeem cap exceeded",

            // Timelock
            ProtocolError::NoPendingProposal => "No pending proposal",
            ProtocolError::TimelockNotElapsed => "Timelock has not elapsed",
            ProtocolError::ProposalExpired => "Proposal execution window has passed",
            ProtocolError::BlacklistNotActive => "Blacklist window not active",
            ProtocolError::RedistributionNotActive => "Redistribution window not active",

            // Balance
            ProtocolError::InsufficientTokenBalance => "Insufficient token balance",
            ProtocolError::InsufficientAllowance => "Insufficient allowance",
            ProtocolError::InsufficientCollateral => "Insufficient collateral held",
            ProtocolError::InsufficientShares => "Insufficient shares",
            ProtocolError::CollateralTransferFailed => "Collateral transfer failed",

            // State
            ProtocolError::CooldownNotElapsed => "Cooldown has not elapsed",
            ProtocolError::NoCooldown => "No pending cooldown",
            ProtocolError::WindowConflict => "Blacklist and redistribution windows conflict",
            ProtocolError::Reentrancy => "Reentrant call",
            ProtocolError::OperationNotAllowed => "Operation not allowed",
            ProtocolError::AlreadyInitialized => "Already initialized",
            ProtocolError::NotInitialized => "Not initialized",
            ProtocolError::PositionNotEmpty => "Backing position not empty",
            ProtocolError::NotFullyBlacklisted => "Account is not fully blacklisted",
            ProtocolError::LastAdmin => "Cannot remove the last admin",
            ProtocolError::StillVesting => "Rewards still vesting",
        }
    }
}

impl core::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

impl From<ProtocolError> for OdraError {
    fn from(error: ProtocolError) -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            OdraError::user(error as u16)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            OdraError::user(error as u16, error.message())
        }
    }
}

/// Turns the result of a pure accounting helper into a contract revert.
pub trait OrRevert<T> {
    fn or_revert(self, env: &ContractEnv) -> T;
}

impl<T> OrRevert<T> for Result<T, ProtocolError> {
    fn or_revert(self, env: &ContractEnv) -> T {
        match self {
            Ok(value) => value,
            Err(error) => env.revert(error),
        }
    }
}
