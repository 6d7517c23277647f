//! Mathematical Utilities for Stabilite
//!
//! Safe fixed-point conversions between vault shares and the underlying LP
//! asset. Every rounding decision favors the vault: payouts round down,
//! liabilities round up.

use crate::constants::price::VIRTUAL_PRICE_PRECISION;
use crate::errors::{StabiliteError, StabiliteResult};

/// Safe addition with overflow check
pub fn safe_add(a: u64, b: u64) -> StabiliteResult<u64> {
    a.checked_add(b).ok_or(StabiliteError::Overflow)
}

/// Safe subtraction with underflow check
pub fn safe_sub(a: u64, b: u64) -> StabiliteResult<u64> {
    a.checked_sub(b).ok_or(StabiliteError::Underflow)
}

/// `a * b / d`, rounded down
pub fn mul_div_floor(a: u128, b: u128, d: u128) -> StabiliteResult<u128> {
    if d == 0 {
        return Err(StabiliteError::DivisionByZero);
    }
    a.checked_mul(b)
        .ok_or(StabiliteError::Overflow)
        .map(|product| product / d)
}

/// `a * b / d`, rounded up
pub fn mul_div_ceil(a: u128, b: u128, d: u128) -> StabiliteResult<u128> {
    if d == 0 {
        return Err(StabiliteError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(StabiliteError::Overflow)?;
    let quotient = product / d;
    if product % d == 0 {
        Ok(quotient)
    } else {
        quotient.checked_add(1).ok_or(StabiliteError::Overflow)
    }
}

/// Narrow a u128 intermediate back to a token amount
pub fn to_amount(value: u128) -> StabiliteResult<u64> {
    u64::try_from(value).map_err(|_| StabiliteError::Overflow)
}

/// Reject unusable virtual price quotes
pub fn validate_virtual_price(price: u128) -> StabiliteResult<u128> {
    if price == 0 {
        return Err(StabiliteError::InvalidPrice { price });
    }
    Ok(price)
}

/// Underlying units paid for burning `shares`
///
/// Shares are worth one peg unit each, so the LP paid is
/// `shares * 1e18 / virtual_price`, additionally capped at the pro-rata
/// holding `underlying_held * shares / share_supply`. After a 4x price move,
/// burning 1000 shares pays 250 LP; below the peg the cap keeps the vault
/// solvent for the remaining holders.
pub fn calculate_withdraw_payout(
    shares: u64,
    share_supply: u64,
    underlying_held: u64,
    virtual_price: u128,
) -> StabiliteResult<u64> {
    let price = validate_virtual_price(virtual_price)?;
    if shares > share_supply {
        return Err(StabiliteError::InsufficientBalance {
            available: share_supply,
            requested: shares,
        });
    }

    let at_peg = mul_div_floor(shares as u128, VIRTUAL_PRICE_PRECISION, price)?;
    let pro_rata = mul_div_floor(underlying_held as u128, shares as u128, share_supply as u128)?;

    to_amount(at_peg.min(pro_rata))
}

/// Underlying units attributable to price appreciation above the peg
///
/// `underlying_held - ceil(share_supply * 1e18 / virtual_price)`, floored at
/// zero. Depositing 1000 at 1.0 and quoting 4.0 leaves 750 of surplus.
pub fn calculate_underlying_surplus(
    underlying_held: u64,
    share_supply: u64,
    virtual_price: u128,
) -> StabiliteResult<u64> {
    let price = validate_virtual_price(virtual_price)?;
    let liabilities = mul_div_ceil(share_supply as u128, VIRTUAL_PRICE_PRECISION, price)?;

    Ok((underlying_held as u128).saturating_sub(liabilities) as u64)
}

/// `floor(balance * numerator / denominator)`
pub fn proportional_share(balance: u64, numerator: u64, denominator: u64) -> StabiliteResult<u64> {
    if numerator > denominator {
        return Err(StabiliteError::InvariantViolated {
            what: "redemption fraction above one",
        });
    }
    to_amount(mul_div_floor(balance as u128, numerator as u128, denominator as u128)?)
}
