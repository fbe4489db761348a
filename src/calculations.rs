// 🧮 Estimate & fee formulas
//
//   supplies_estimate  = cleaning_fees * supplies_pct / 100
//   utilities_estimate = reservation_income * utilities_pct / 100
//   management_fee     = (income - supplies - utilities - other) * fee_pct / 100
//
// No bounds are enforced here: negative net income yields a negative fee.
// The only failure is Decimal overflow, reported as ComputationFailed.

use crate::error::Result;
use crate::money::{apply_percentage, overflow};
use rust_decimal::Decimal;

/// Supplies estimate from the period's cleaning fees
pub fn supplies_estimate(
    total_cleaning_fees: Decimal,
    supplies_percentage: Decimal,
) -> Result<Decimal> {
    apply_percentage(total_cleaning_fees, supplies_percentage)
}

/// Utilities estimate from the period's reservation income
pub fn utilities_estimate(
    total_reservation_income: Decimal,
    utilities_percentage: Decimal,
) -> Result<Decimal> {
    apply_percentage(total_reservation_income, utilities_percentage)
}

/// Income left after estimates and other expenses; the fee base
pub fn net_income(
    reservation_income: Decimal,
    supplies_estimate: Decimal,
    utilities_estimate: Decimal,
    other_expenses: Decimal,
) -> Result<Decimal> {
    reservation_income
        .checked_sub(supplies_estimate)
        .and_then(|rest| rest.checked_sub(utilities_estimate))
        .and_then(|rest| rest.checked_sub(other_expenses))
        .ok_or_else(|| overflow("net income"))
}

pub fn management_fee(
    reservation_income: Decimal,
    supplies_estimate: Decimal,
    utilities_estimate: Decimal,
    other_expenses: Decimal,
    management_fee_percentage: Decimal,
) -> Result<Decimal> {
    let base = net_income(
        reservation_income,
        supplies_estimate,
        utilities_estimate,
        other_expenses,
    )?;
    apply_percentage(base, management_fee_percentage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_supplies_estimate() {
        assert_eq!(supplies_estimate(dec!(400), dec!(15)).unwrap(), dec!(60));
        assert_eq!(supplies_estimate(dec!(0), dec!(15)).unwrap(), dec!(0));
    }

    #[test]
    fn test_utilities_estimate() {
        assert_eq!(utilities_estimate(dec!(6500), dec!(8)).unwrap(), dec!(520));
    }

    #[test]
    fn test_estimates_never_exceed_their_base() {
        let bases = [dec!(0), dec!(0.01), dec!(400), dec!(6500), dec!(123456.78)];
        let rates = [dec!(0), dec!(0.5), dec!(8), dec!(15), dec!(33.3), dec!(99.99), dec!(100)];

        for base in bases {
            for rate in rates {
                assert!(supplies_estimate(base, rate).unwrap() <= base);
                assert!(utilities_estimate(base, rate).unwrap() <= base);
            }
            assert_eq!(supplies_estimate(base, dec!(100)).unwrap(), base);
            assert_eq!(utilities_estimate(base, dec!(100)).unwrap(), base);
        }
    }

    #[test]
    fn test_management_fee() {
        let fee = management_fee(dec!(6500), dec!(60), dec!(520), dec!(0), dec!(20)).unwrap();
        assert_eq!(fee, dec!(1184));

        let fee = management_fee(dec!(6500), dec!(60), dec!(520), dec!(100), dec!(20)).unwrap();
        assert_eq!(fee, dec!(1164));
    }

    #[test]
    fn test_management_fee_goes_negative_with_net_loss() {
        let fee = management_fee(dec!(100), dec!(10), dec!(8), dec!(500), dec!(20)).unwrap();
        assert_eq!(fee, dec!(-83.6));
    }

    #[test]
    fn test_overflow_surfaces_as_error() {
        use crate::error::StatementError;

        let err = net_income(Decimal::MIN, dec!(1), dec!(0), dec!(0)).unwrap_err();
        assert!(matches!(err, StatementError::ComputationFailed(_)));
        assert!(err.to_string().contains("net income"));

        assert!(utilities_estimate(Decimal::MAX, dec!(8)).is_err());
        assert!(management_fee(Decimal::MAX, dec!(-1), dec!(0), dec!(0), dec!(20)).is_err());
    }
}
