use rust_decimal::{Decimal, RoundingStrategy};

pub const GB_PER_TB: Decimal = Decimal::from_parts(1024, 0, 0, false, 0);

pub fn round_pct(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn round_tb(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

pub fn gb_to_tb(gb: Decimal) -> Decimal {
    round_tb(gb / GB_PER_TB)
}

/// `part / whole * 100`, or zero when `whole` is zero. Saturates instead of overflowing.
pub fn pct_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    let ratio = part.checked_div(whole).unwrap_or_else(|| {
        if part.is_sign_negative() == whole.is_sign_negative() {
            Decimal::MAX
        } else {
            Decimal::MIN
        }
    });
    ratio.saturating_mul(Decimal::ONE_HUNDRED)
}

pub fn saturating_sum<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .fold(Decimal::ZERO, |total, value| total.saturating_add(value))
}
