use alloy_primitives::U256;
use anyhow::{anyhow, bail, Context, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Parse a user-entered amount. Only strictly positive decimals are accepted.
pub fn parse_amount(input: &str) -> Result<Decimal> {
    let trimmed = input.trim();
    let value = Decimal::from_str(trimmed).with_context(|| format!("invalid amount: {trimmed:?}"))?;
    if value <= Decimal::ZERO {
        bail!("amount must be greater than zero: {trimmed}");
    }
    Ok(value)
}

/// Render an invoice total with exactly two fraction digits, rounding
/// midpoints away from zero.
pub fn format_total(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

fn ten_pow(exp: u8) -> U256 {
    U256::from(10u8).pow(U256::from(exp))
}

/// Convert a decimal token amount into integer base units for a token with
/// `decimals` fraction digits.
pub fn to_base_units(amount: &str, decimals: u8) -> Result<U256> {
    let value = Decimal::from_str(amount.trim())
        .with_context(|| format!("invalid amount: {amount:?}"))?
        .normalize();
    if value.is_sign_negative() {
        bail!("amount must not be negative: {amount}");
    }
    let scale = value.scale();
    if scale > u32::from(decimals) {
        bail!("amount {amount} has more than {decimals} fraction digits");
    }
    let mantissa = u128::try_from(value.mantissa()).map_err(|_| anyhow!("amount out of range: {amount}"))?;
    let exp = decimals - scale as u8;
    Ok(U256::from(mantissa) * ten_pow(exp))
}

/// Scale a raw integer token balance down by `decimals`, trimming trailing
/// fractional zeros ("1.5", not "1.500000000000000000").
pub fn format_base_units(raw: U256, decimals: u8) -> String {
    if decimals == 0 {
        return raw.to_string();
    }
    let divisor = ten_pow(decimals);
    let whole = raw / divisor;
    let frac = raw % divisor;
    if frac.is_zero() {
        return whole.to_string();
    }
    let padded = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
    format!("{}.{}", whole, padded.trim_end_matches('0'))
}
