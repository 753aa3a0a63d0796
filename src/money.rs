use rust_decimal::{Decimal, RoundingStrategy};

use crate::errors::{Error, Result};

/// Smallest representable currency unit (0.01).
pub const CENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Largest amount accepted on a single record. Keeps every sum the ledger
/// builds far inside the range of `Decimal`.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Rounds to two fractional digits, half away from zero.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Accepts an input amount only if it is expressible in whole cents and no
/// bigger than [`MAX_AMOUNT`], and returns it with a scale of exactly two.
pub fn to_cents(amount: Decimal) -> Result<Decimal> {
    if amount.abs() > MAX_AMOUNT {
        return Err(Error::InvalidInput(format!(
            "{amount} is above the limit of {MAX_AMOUNT}"
        )));
    }
    if amount.normalize().scale() > 2 {
        return Err(Error::InvalidInput(format!(
            "{amount} has more than two decimal places"
        )));
    }
    let mut amount = amount;
    amount.rescale(2);
    Ok(amount)
}
