// 💵 Money helpers
//
// Amounts and percentages are Decimal so that the payout identity
// (owner payout + management fee == net income) holds without drift.

use crate::error::{Result, StatementError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Overflow of the 96-bit mantissa while computing `what`
pub fn overflow(what: &str) -> StatementError {
    StatementError::ComputationFailed(format!("amount overflow computing {}", what))
}

/// `value * percentage / 100`, unclamped and unrounded.
pub fn apply_percentage(value: Decimal, percentage: Decimal) -> Result<Decimal> {
    value
        .checked_mul(percentage)
        .and_then(|scaled| scaled.checked_div(dec!(100)))
        .ok_or_else(|| overflow("percentage"))
}

/// Sum that reports overflow instead of panicking
pub fn checked_sum<I>(values: I, what: &str) -> Result<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |total, value| total.checked_add(value))
        .ok_or_else(|| overflow(what))
}

/// Format as dollars with thousands separators: `$6,500.00`.
///
/// Negative amounts keep the sign after the symbol (`$-60.00`), which is
/// how the breakdown tables have always been printed.
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("${}{}.{}", sign, grouped, cents)
}

/// Percentage for display: `20%`, `12.5%`.
pub fn format_percentage(percentage: Decimal) -> String {
    format!("{}%", percentage.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_percentage() {
        assert_eq!(apply_percentage(dec!(400), dec!(15)).unwrap(), dec!(60));
        assert_eq!(apply_percentage(dec!(6500), dec!(8)).unwrap(), dec!(520));
        assert_eq!(apply_percentage(dec!(5920), dec!(20)).unwrap(), dec!(1184));
        assert_eq!(apply_percentage(dec!(100), dec!(0)).unwrap(), dec!(0));
    }

    #[test]
    fn test_apply_percentage_is_unclamped() {
        assert_eq!(apply_percentage(dec!(100), dec!(150)).unwrap(), dec!(150));
        assert_eq!(apply_percentage(dec!(100), dec!(-10)).unwrap(), dec!(-10));
        assert_eq!(apply_percentage(dec!(-200), dec!(20)).unwrap(), dec!(-40));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let err = apply_percentage(Decimal::MAX, dec!(150)).unwrap_err();
        assert!(matches!(err, StatementError::ComputationFailed(_)));

        assert!(checked_sum([Decimal::MAX, Decimal::MAX], "income").is_err());
        assert_eq!(checked_sum([dec!(1.5), dec!(2.25)], "income").unwrap(), dec!(3.75));
        assert_eq!(checked_sum(Vec::new(), "income").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(dec!(6500)), "$6,500.00");
        assert_eq!(format_currency(dec!(4736)), "$4,736.00");
        assert_eq!(format_currency(dec!(25.75)), "$25.75");
        assert_eq!(format_currency(dec!(0)), "$0.00");
        assert_eq!(format_currency(dec!(1234567.891)), "$1,234,567.89");
        assert_eq!(format_currency(dec!(100)), "$100.00");
        assert_eq!(format_currency(dec!(999.999)), "$1,000.00");
    }

    #[test]
    fn test_format_currency_negative() {
        assert_eq!(format_currency(dec!(-60)), "$-60.00");
        assert_eq!(format_currency(dec!(-1184)), "$-1,184.00");
        assert_eq!(format_currency(dec!(-0.001)), "$0.00");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(dec!(20)), "20%");
        assert_eq!(format_percentage(dec!(20.0)), "20%");
        assert_eq!(format_percentage(dec!(12.5)), "12.5%");
    }
}
