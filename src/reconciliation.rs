// ⚖️ Reconciliation Engine - compare expected payouts with the bank balance
//
// The expected figure is the statement's total payouts (owner payout +
// management fee). The actual figure comes from a BalanceSource. A
// difference beyond the tolerance blocks payout processing; it is a
// reported outcome, never an error.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest difference still treated as a match ($0.01)
pub const DEFAULT_TOLERANCE: Decimal = dec!(0.01);

/// Offset the simulated bank feed adds to the expected amount
pub const SIMULATED_OFFSET: Decimal = dec!(25.75);

// ============================================================================
// BALANCE SOURCES
// ============================================================================

/// Where the "actual" bank balance comes from.
///
/// The expected amount is passed in so a placeholder feed can derive a
/// figure from it; a real feed ignores it.
pub trait BalanceSource {
    fn actual_balance(&self, expected_amount: Decimal) -> Decimal;

    /// True when the balance is manufactured rather than read
    fn is_simulated(&self) -> bool {
        false
    }
}

/// Demo feed: expected amount plus a fixed offset, so every run
/// surfaces a discrepancy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedBalanceSource {
    pub offset: Decimal,
}

impl SimulatedBalanceSource {
    pub fn new() -> Self {
        SimulatedBalanceSource {
            offset: SIMULATED_OFFSET,
        }
    }

    pub fn with_offset(offset: Decimal) -> Self {
        SimulatedBalanceSource { offset }
    }
}

impl Default for SimulatedBalanceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl BalanceSource for SimulatedBalanceSource {
    fn actual_balance(&self, expected_amount: Decimal) -> Decimal {
        expected_amount.saturating_add(self.offset)
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

/// A balance read elsewhere (statement, config, test)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedBalanceSource {
    pub balance: Decimal,
}

impl FixedBalanceSource {
    pub fn new(balance: Decimal) -> Self {
        FixedBalanceSource { balance }
    }
}

impl BalanceSource for FixedBalanceSource {
    fn actual_balance(&self, _expected_amount: Decimal) -> Decimal {
        self.balance
    }
}

// ============================================================================
// VERIFICATION RESULT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Match,
    DiscrepancyFound,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Match => "MATCH",
            VerificationStatus::DiscrepancyFound => "DISCREPANCY_FOUND",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankVerification {
    pub expected_amount: Decimal,
    pub actual_balance: Decimal,
    pub discrepancy: Decimal,
    pub tolerance: Decimal,
    pub is_match: bool,
    pub status: VerificationStatus,
    pub verified_at: DateTime<Utc>,

    /// The balance was manufactured by a placeholder feed
    pub simulation: bool,
}

impl BankVerification {
    /// Payouts may only be processed when the balance matched
    pub fn blocks_payout(&self) -> bool {
        !self.is_match
    }

    pub fn summary(&self) -> String {
        format!(
            "Bank verification: expected ${:.2}, actual ${:.2}, discrepancy ${:.2} ({})",
            self.expected_amount, self.actual_balance, self.discrepancy, self.status
        )
    }
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconciliationEngine {
    /// Tolerance for balance comparisons (default: $0.01)
    pub tolerance: Decimal,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        ReconciliationEngine {
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn with_tolerance(tolerance: Decimal) -> Self {
        ReconciliationEngine { tolerance }
    }

    /// Fetch the actual balance and compare it with the expected payouts
    pub fn verify(&self, expected_amount: Decimal, source: &dyn BalanceSource) -> BankVerification {
        let actual_balance = source.actual_balance(expected_amount);
        self.compare(expected_amount, actual_balance, source.is_simulated())
    }

    /// Compare two figures directly
    pub fn compare(
        &self,
        expected_amount: Decimal,
        actual_balance: Decimal,
        simulation: bool,
    ) -> BankVerification {
        let discrepancy = expected_amount.saturating_sub(actual_balance).abs();
        let is_match = discrepancy <= self.tolerance;
        let status = if is_match {
            VerificationStatus::Match
        } else {
            VerificationStatus::DiscrepancyFound
        };

        if is_match {
            tracing::debug!(%expected_amount, %actual_balance, "bank balance matches");
        } else {
            tracing::warn!(
                %expected_amount,
                %actual_balance,
                %discrepancy,
                "bank balance discrepancy, payouts must not be processed"
            );
        }

        BankVerification {
            expected_amount,
            actual_balance,
            discrepancy,
            tolerance: self.tolerance,
            is_match,
            status,
            verified_at: Utc::now(),
            simulation,
        }
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
