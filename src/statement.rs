// 📄 Owner Statement - assemble one statement from reservations + settings
//
// Pipeline (one direction only):
//   reservations → totals → estimates → fee → payout → breakdown → verification
//
// Every run builds a brand-new ProcessedStatement. Manual expenses do not
// patch a previous result: when present, fee and payout are recomputed
// from scratch with the summed expenses.

use crate::calculations::{management_fee, net_income, supplies_estimate, utilities_estimate};
use crate::error::{Result, StatementError};
use crate::money::{checked_sum, overflow};
use crate::reconciliation::{BalanceSource, BankVerification, ReconciliationEngine};
use crate::reservations::{aggregate, Reservation, ReservationSource, StatementPeriod};
use crate::settings::{Settings, SettingsSource};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

pub const PAYEE_NONE: &str = "N/A";
pub const PAYEE_MANAGEMENT: &str = "Management Company";
pub const PAYEE_OWNER: &str = "Owner";
pub const PAYEE_VARIOUS: &str = "Various";

// ============================================================================
// MANUAL EXPENSE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualExpense {
    pub description: String,
    pub amount: Decimal,

    /// Missing, null or blank payees read as "Various"
    #[serde(default = "default_payee", deserialize_with = "payee_or_various")]
    pub payout_to: String,
}

fn default_payee() -> String {
    PAYEE_VARIOUS.to_string()
}

fn normalize_payee(payout_to: Option<&str>) -> String {
    payout_to
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .unwrap_or_else(default_payee)
}

fn payee_or_various<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let payout_to = Option::<String>::deserialize(deserializer)?;
    Ok(normalize_payee(payout_to.as_deref()))
}

impl ManualExpense {
    /// Blank payees become "Various"
    pub fn new(description: impl Into<String>, amount: Decimal, payout_to: Option<&str>) -> Self {
        ManualExpense {
            description: description.into().trim().to_string(),
            amount,
            payout_to: normalize_payee(payout_to),
        }
    }

    /// Same expense with trimmed description and a non-blank payee
    fn normalized(&self) -> Self {
        ManualExpense::new(self.description.as_str(), self.amount, Some(&self.payout_to))
    }

    /// Only described, strictly positive expenses take part in a statement
    pub fn is_valid(&self) -> bool {
        !self.description.trim().is_empty() && self.amount > Decimal::ZERO
    }
}

/// `description:amount[:payout_to]`
impl FromStr for ManualExpense {
    type Err = StatementError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || StatementError::InvalidExpense(s.to_string());
        let mut parts = s.splitn(3, ':');

        let description = parts.next().map(str::trim).unwrap_or_default();
        let amount = parts
            .next()
            .map(str::trim)
            .ok_or_else(invalid)?
            .trim_start_matches('$')
            .replace(',', "");
        let amount = Decimal::from_str(&amount).map_err(|_| invalid())?;
        let payout_to = parts.next();

        let expense = ManualExpense::new(description, amount, payout_to);
        if !expense.is_valid() {
            return Err(invalid());
        }
        Ok(expense)
    }
}

// ============================================================================
// BREAKDOWN
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    Income,
    Expense,
    Payout,
}

impl LineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineType::Income => "income",
            LineType::Expense => "expense",
            LineType::Payout => "payout",
        }
    }

    /// Title-cased label used in tables
    pub fn label(&self) -> &'static str {
        match self {
            LineType::Income => "Income",
            LineType::Expense => "Expense",
            LineType::Payout => "Payout",
        }
    }
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownLine {
    pub line_item: String,

    /// Signed: income and payout positive, expenses negative
    pub amount: Decimal,

    #[serde(rename = "type")]
    pub line_type: LineType,

    pub payout_to: String,
}

impl BreakdownLine {
    fn new(line_item: &str, amount: Decimal, line_type: LineType, payout_to: &str) -> Self {
        BreakdownLine {
            line_item: line_item.to_string(),
            amount,
            line_type,
            payout_to: payout_to.to_string(),
        }
    }
}

// ============================================================================
// PROCESSED STATEMENT
// ============================================================================

/// Immutable snapshot of one computation for one (tag, reservations,
/// manual expenses) triple under one settings snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedStatement {
    pub tag: String,
    pub total_reservations: usize,
    pub reservation_income: Decimal,
    pub cleaning_fees: Decimal,
    pub supplies_estimate: Decimal,
    pub utilities_estimate: Decimal,
    pub other_expenses: Decimal,
    pub management_fee: Decimal,
    pub owner_payout: Decimal,
    pub management_payout: Decimal,

    /// owner_payout + management_fee; the reconciliation target
    pub total_payouts: Decimal,

    pub settings: Settings,
    pub reservations: Vec<Reservation>,

    #[serde(default)]
    pub manual_expenses: Vec<ManualExpense>,
}

impl ProcessedStatement {
    /// Fee base: income minus estimates minus other expenses. Settling
    /// made owner payout + fee equal to it exactly.
    pub fn net_income(&self) -> Decimal {
        self.total_payouts
    }

    /// Display figure; saturates instead of failing
    pub fn total_deductions(&self) -> Decimal {
        self.supplies_estimate
            .saturating_add(self.utilities_estimate)
            .saturating_add(self.other_expenses)
    }

    /// Ordered line items:
    /// Income, Supplies, Utilities, Management Fee, [Other Expenses,
    /// each manual expense], Owner Payout
    pub fn breakdown(&self) -> Vec<BreakdownLine> {
        let mut lines = vec![
            BreakdownLine::new(
                "Reservation Income",
                self.reservation_income,
                LineType::Income,
                PAYEE_NONE,
            ),
            BreakdownLine::new(
                "Supplies Estimate",
                -self.supplies_estimate,
                LineType::Expense,
                PAYEE_MANAGEMENT,
            ),
            BreakdownLine::new(
                "Utilities Estimate",
                -self.utilities_estimate,
                LineType::Expense,
                PAYEE_MANAGEMENT,
            ),
            BreakdownLine::new(
                "Management Fee",
                -self.management_fee,
                LineType::Expense,
                PAYEE_MANAGEMENT,
            ),
        ];

        if self.other_expenses > Decimal::ZERO {
            lines.push(BreakdownLine::new(
                "Other Expenses",
                -self.other_expenses,
                LineType::Expense,
                PAYEE_VARIOUS,
            ));
        }

        lines.extend(self.manual_expenses.iter().map(|expense| {
            BreakdownLine::new(
                &expense.description,
                -expense.amount,
                LineType::Expense,
                &expense.payout_to,
            )
        }));

        lines.push(BreakdownLine::new(
            "Owner Payout",
            self.owner_payout,
            LineType::Payout,
            PAYEE_OWNER,
        ));

        lines
    }

    /// SHA-256 over the canonical JSON form. Identical inputs give
    /// identical fingerprints.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        format!("{:x}", hasher.finalize())
    }
}

// ============================================================================
// STATEMENT PROCESSOR (assembler)
// ============================================================================

/// Fee and payout figures for one expense level
#[derive(Debug, Clone, Copy, PartialEq)]
struct Settlement {
    management_fee: Decimal,
    owner_payout: Decimal,
    total_payouts: Decimal,
}

fn settle(
    income: Decimal,
    supplies: Decimal,
    utilities: Decimal,
    other_expenses: Decimal,
    fee_percentage: Decimal,
) -> Result<Settlement> {
    let fee = management_fee(income, supplies, utilities, other_expenses, fee_percentage)?;
    let owner_payout = net_income(income, supplies, utilities, other_expenses)?
        .checked_sub(fee)
        .ok_or_else(|| overflow("owner payout"))?;
    let total_payouts = owner_payout
        .checked_add(fee)
        .ok_or_else(|| overflow("total payouts"))?;

    Ok(Settlement {
        management_fee: fee,
        owner_payout,
        total_payouts,
    })
}

pub struct StatementProcessor<'a> {
    settings: &'a dyn SettingsSource,
}

impl<'a> StatementProcessor<'a> {
    pub fn new(settings: &'a dyn SettingsSource) -> Self {
        StatementProcessor { settings }
    }

    /// Build a statement. The only failure is an amount outside the
    /// Decimal range (`ComputationFailed`).
    ///
    /// Manual expenses with a blank description or a non-positive amount
    /// are dropped.
    pub fn process(
        &self,
        tag: &str,
        reservations: &[Reservation],
        manual_expenses: &[ManualExpense],
    ) -> Result<ProcessedStatement> {
        let settings = self.settings.resolve(tag);
        tracing::debug!(
            tag,
            management_fee = %settings.management_fee_percentage,
            supplies = %settings.supplies_estimate_percentage,
            utilities = %settings.utilities_estimate_percentage,
            "settings resolved"
        );

        let totals = aggregate(reservations)?;
        tracing::debug!(
            tag,
            count = totals.count,
            income = %totals.total_income,
            cleaning_fees = %totals.total_cleaning_fees,
            "reservations aggregated"
        );

        let supplies = supplies_estimate(
            totals.total_cleaning_fees,
            settings.supplies_estimate_percentage,
        )?;
        let utilities = utilities_estimate(
            totals.total_income,
            settings.utilities_estimate_percentage,
        )?;

        // First pass: no other expenses
        let mut other_expenses = Decimal::ZERO;
        let mut settlement = settle(
            totals.total_income,
            supplies,
            utilities,
            other_expenses,
            settings.management_fee_percentage,
        )?;

        let accepted: Vec<ManualExpense> = manual_expenses
            .iter()
            .filter(|expense| {
                let keep = expense.is_valid();
                if !keep {
                    tracing::warn!(
                        description = %expense.description,
                        amount = %expense.amount,
                        "dropping manual expense without description or positive amount"
                    );
                }
                keep
            })
            .map(ManualExpense::normalized)
            .collect();

        // Second pass: recompute from scratch with the summed manual expenses
        if !accepted.is_empty() {
            other_expenses = checked_sum(accepted.iter().map(|expense| expense.amount), "other expenses")?;
            settlement = settle(
                totals.total_income,
                supplies,
                utilities,
                other_expenses,
                settings.management_fee_percentage,
            )?;
        }

        Ok(ProcessedStatement {
            tag: tag.to_string(),
            total_reservations: totals.count,
            reservation_income: totals.total_income,
            cleaning_fees: totals.total_cleaning_fees,
            supplies_estimate: supplies,
            utilities_estimate: utilities,
            other_expenses,
            management_fee: settlement.management_fee,
            owner_payout: settlement.owner_payout,
            management_payout: settlement.management_fee,
            total_payouts: settlement.total_payouts,
            settings,
            reservations: reservations.to_vec(),
            manual_expenses: accepted,
        })
    }
}

// ============================================================================
// STATEMENT GENERATOR (full run)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementResult {
    pub run_id: uuid::Uuid,
    pub tag: String,
    pub period: StatementPeriod,
    pub statement: ProcessedStatement,
    pub breakdown: Vec<BreakdownLine>,
    pub verification: BankVerification,
    pub discrepancy_found: bool,
}

/// Wires the collaborators together: settings, reservations, bank balance
pub struct StatementGenerator<'a> {
    settings: &'a dyn SettingsSource,
    reservations: &'a dyn ReservationSource,
    balances: &'a dyn BalanceSource,
    engine: ReconciliationEngine,
}

impl<'a> StatementGenerator<'a> {
    pub fn new(
        settings: &'a dyn SettingsSource,
        reservations: &'a dyn ReservationSource,
        balances: &'a dyn BalanceSource,
    ) -> Self {
        StatementGenerator {
            settings,
            reservations,
            balances,
            engine: ReconciliationEngine::new(),
        }
    }

    /// Run one statement. Any failure of the collaborators surfaces as
    /// `ComputationFailed`; a bank discrepancy does not.
    pub fn generate(
        &self,
        tag: &str,
        period: StatementPeriod,
        manual_expenses: &[ManualExpense],
    ) -> Result<StatementResult> {
        let reservations = self
            .reservations
            .reservations(tag, &period)
            .map_err(|err| StatementError::ComputationFailed(err.to_string()))?;

        let statement = StatementProcessor::new(self.settings).process(tag, &reservations, manual_expenses)?;
        let verification = self.engine.verify(statement.total_payouts, self.balances);
        let breakdown = statement.breakdown();
        let discrepancy_found = !verification.is_match;

        tracing::info!(
            tag,
            %period,
            reservations = statement.total_reservations,
            owner_payout = %statement.owner_payout,
            management_fee = %statement.management_fee,
            status = %verification.status,
            "owner statement generated"
        );

        Ok(StatementResult {
            run_id: uuid::Uuid::new_v4(),
            tag: tag.to_string(),
            period,
            statement,
            breakdown,
            verification,
            discrepancy_found,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::{FixedBalanceSource, SimulatedBalanceSource, VerificationStatus};
    use crate::reservations::{InMemoryReservationSource, SampleReservationSource};
    use crate::settings::{ConfigStore, SettingsEditor, SettingsOverride};
    use rust_decimal_macros::dec;

    const TAG: &str = "480 Laswell Ave";

    fn process(store: &ConfigStore, expenses: &[ManualExpense]) -> ProcessedStatement {
        StatementProcessor::new(store)
            .process(TAG, &SampleReservationSource::sample(TAG), expenses)
            .unwrap()
    }

    fn period() -> StatementPeriod {
        "2025-09".parse().unwrap()
    }

    #[test]
    fn test_sample_statement_figures() {
        let statement = process(&ConfigStore::default(), &[]);

        assert_eq!(statement.total_reservations, 3);
        assert_eq!(statement.reservation_income, dec!(6500.00));
        assert_eq!(statement.cleaning_fees, dec!(400.00));
        assert_eq!(statement.supplies_estimate, dec!(60.00));
        assert_eq!(statement.utilities_estimate, dec!(520.00));
        assert_eq!(statement.other_expenses, dec!(0));
        assert_eq!(statement.management_fee, dec!(1184.00));
        assert_eq!(statement.owner_payout, dec!(4736.00));
        assert_eq!(statement.management_payout, dec!(1184.00));
        assert_eq!(statement.total_payouts, dec!(5920.00));
        assert_eq!(statement.net_income(), dec!(5920.00));
        assert_eq!(statement.total_deductions(), dec!(580.00));
    }

    #[test]
    fn test_manual_expense_recomputes_fee_and_payout() {
        let expenses = vec![ManualExpense::new("Plumbing repair", dec!(100.00), Some("Joe's Plumbing"))];
        let statement = process(&ConfigStore::default(), &expenses);

        assert_eq!(statement.other_expenses, dec!(100.00));
        assert_eq!(statement.management_fee, dec!(1164.00));
        assert_eq!(statement.owner_payout, dec!(4556.00));
        assert_eq!(statement.total_payouts, dec!(5720.00));
        assert_eq!(statement.manual_expenses, expenses);
    }

    #[test]
    fn test_invalid_manual_expenses_are_dropped() {
        let expenses = vec![
            ManualExpense::new("", dec!(50), None),
            ManualExpense::new("Refund", dec!(0), None),
            ManualExpense::new("Negative", dec!(-10), None),
        ];
        let statement = process(&ConfigStore::default(), &expenses);

        assert!(statement.manual_expenses.is_empty());
        assert_eq!(statement, process(&ConfigStore::default(), &[]));
    }

    #[test]
    fn test_payout_identity_holds_exactly() {
        let mut store = ConfigStore::default();
        store
            .update_override(
                TAG,
                SettingsOverride::new()
                    .with_management_fee(dec!(17.3))
                    .with_supplies_estimate(dec!(12.7))
                    .with_utilities_estimate(dec!(7.77)),
            )
            .unwrap();

        let expenses = [
            ManualExpense::new("Linens", dec!(33.33), None),
            ManualExpense::new("Lockbox", dec!(19.99), Some("Hardware Co")),
        ];
        let statement = process(&store, &expenses);

        assert_eq!(
            statement.owner_payout + statement.management_fee,
            statement.reservation_income
                - statement.supplies_estimate
                - statement.utilities_estimate
                - statement.other_expenses
        );
        assert_eq!(statement.total_payouts, statement.owner_payout + statement.management_fee);
    }

    #[test]
    fn test_identical_inputs_give_identical_statements() {
        let store = ConfigStore::default();
        let expenses = [ManualExpense::new("Pest control", dec!(85.50), None)];

        let first = process(&store, &expenses);
        let second = process(&store, &expenses);

        assert_eq!(first, second);
        assert_eq!(first.fingerprint(), second.fingerprint());
        assert_ne!(first.fingerprint(), process(&store, &[]).fingerprint());
    }

    #[test]
    fn test_empty_reservations() {
        let statement = StatementProcessor::new(&ConfigStore::default()).process(TAG, &[], &[]).unwrap();

        assert_eq!(statement.total_reservations, 0);
        assert_eq!(statement.reservation_income, Decimal::ZERO);
        assert_eq!(statement.owner_payout, Decimal::ZERO);
        assert_eq!(statement.breakdown().len(), 5);
    }

    #[test]
    fn test_negative_net_income_gives_negative_fee() {
        let expenses = [ManualExpense::new("Roof replacement", dec!(10000), None)];
        let statement = process(&ConfigStore::default(), &expenses);

        // (6500 - 60 - 520 - 10000) * 20%
        assert_eq!(statement.management_fee, dec!(-816));
        assert_eq!(statement.owner_payout, dec!(-3264));
    }

    #[test]
    fn test_breakdown_order_without_expenses() {
        let lines = process(&ConfigStore::default(), &[]).breakdown();
        let items: Vec<&str> = lines.iter().map(|l| l.line_item.as_str()).collect();

        assert_eq!(
            items,
            vec![
                "Reservation Income",
                "Supplies Estimate",
                "Utilities Estimate",
                "Management Fee",
                "Owner Payout"
            ]
        );
        assert_eq!(lines[0].amount, dec!(6500.00));
        assert_eq!(lines[0].payout_to, PAYEE_NONE);
        assert_eq!(lines[1].amount, dec!(-60.00));
        assert_eq!(lines[3].amount, dec!(-1184.00));
        assert_eq!(lines[3].payout_to, PAYEE_MANAGEMENT);
        assert_eq!(lines[4].amount, dec!(4736.00));
        assert_eq!(lines[4].payout_to, PAYEE_OWNER);
    }

    #[test]
    fn test_breakdown_places_manual_expenses_before_payout() {
        let expenses = [
            ManualExpense::new("Plumbing repair", dec!(100), Some("Joe's Plumbing")),
            ManualExpense::new("Window cleaning", dec!(40), None),
        ];
        let lines = process(&ConfigStore::default(), &expenses).breakdown();
        let items: Vec<&str> = lines.iter().map(|l| l.line_item.as_str()).collect();

        assert_eq!(
            items,
            vec![
                "Reservation Income",
                "Supplies Estimate",
                "Utilities Estimate",
                "Management Fee",
                "Other Expenses",
                "Plumbing repair",
                "Window cleaning",
                "Owner Payout"
            ]
        );
        assert_eq!(lines[4].amount, dec!(-140));
        assert_eq!(lines[4].line_type, LineType::Expense);
        assert_eq!(lines[4].payout_to, PAYEE_VARIOUS);
        assert_eq!(lines[5].amount, dec!(-100));
        assert_eq!(lines[5].payout_to, "Joe's Plumbing");
        assert_eq!(lines[6].payout_to, PAYEE_VARIOUS);
    }

    #[test]
    fn test_other_expenses_line_only_with_expenses() {
        let without = process(&ConfigStore::default(), &[]).breakdown();
        assert!(without.iter().all(|l| l.line_item != "Other Expenses"));

        let expenses = [ManualExpense::new("Deep clean", dec!(75.25), Some("Sparkle Co"))];
        let with = process(&ConfigStore::default(), &expenses).breakdown();
        let aggregate: Vec<&BreakdownLine> = with.iter().filter(|l| l.line_item == "Other Expenses").collect();
        assert_eq!(aggregate.len(), 1);
        assert_eq!(aggregate[0].amount, dec!(-75.25));
        assert_eq!(aggregate[0].payout_to, PAYEE_VARIOUS);
    }

    #[test]
    fn test_breakdown_types_are_framed_by_income_and_payout() {
        let expenses = [ManualExpense::new("Supplies restock", dec!(12), None)];
        for lines in [
            process(&ConfigStore::default(), &[]).breakdown(),
            process(&ConfigStore::default(), &expenses).breakdown(),
        ] {
            assert_eq!(lines.first().map(|l| l.line_type), Some(LineType::Income));
            assert_eq!(lines.last().map(|l| l.line_type), Some(LineType::Payout));
            assert!(lines[1..lines.len() - 1]
                .iter()
                .all(|l| l.line_type == LineType::Expense));
        }
    }

    #[test]
    fn test_breakdown_line_json_uses_type_key() {
        let line = BreakdownLine::new("Owner Payout", dec!(1), LineType::Payout, PAYEE_OWNER);
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["type"], "payout");
        assert_eq!(LineType::Payout.label(), "Payout");
    }

    #[test]
    fn test_blank_or_null_payee_reads_as_various() {
        let expenses: Vec<ManualExpense> = serde_json::from_str(
            r#"[
                {"description": "Gutter cleaning", "amount": "80", "payout_to": null},
                {"description": "Lightbulbs", "amount": "12.50", "payout_to": "   "},
                {"description": "Snow removal", "amount": "60"},
                {"description": "Painting", "amount": "300", "payout_to": " Brush Bros "}
            ]"#,
        )
        .unwrap();

        let payees: Vec<&str> = expenses.iter().map(|e| e.payout_to.as_str()).collect();
        assert_eq!(payees, vec![PAYEE_VARIOUS, PAYEE_VARIOUS, PAYEE_VARIOUS, "Brush Bros"]);
    }

    #[test]
    fn test_process_normalizes_struct_literal_payees() {
        let expenses = [ManualExpense {
            description: "  Hot tub service ".to_string(),
            amount: dec!(90),
            payout_to: String::new(),
        }];
        let statement = process(&ConfigStore::default(), &expenses);

        assert_eq!(statement.manual_expenses[0].description, "Hot tub service");
        assert_eq!(statement.manual_expenses[0].payout_to, PAYEE_VARIOUS);
        let lines = statement.breakdown();
        assert_eq!(lines[5].line_item, "Hot tub service");
        assert_eq!(lines[5].payout_to, PAYEE_VARIOUS);
    }

    #[test]
    fn test_parse_manual_expense() {
        let expense: ManualExpense = "Plumbing repair:100.00:Joe's Plumbing".parse().unwrap();
        assert_eq!(expense.description, "Plumbing repair");
        assert_eq!(expense.amount, dec!(100.00));
        assert_eq!(expense.payout_to, "Joe's Plumbing");

        let expense: ManualExpense = "Hot tub service:$1,250.50".parse().unwrap();
        assert_eq!(expense.amount, dec!(1250.50));
        assert_eq!(expense.payout_to, PAYEE_VARIOUS);

        let expense: ManualExpense = "Gardening:60:  ".parse().unwrap();
        assert_eq!(expense.payout_to, PAYEE_VARIOUS);

        for bad in ["no amount", "Repair:abc", ":100", "Refund:0", "Credit:-5"] {
            assert!(
                matches!(bad.parse::<ManualExpense>(), Err(StatementError::InvalidExpense(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_generate_with_simulated_bank() {
        let store = ConfigStore::default();
        let balances = SimulatedBalanceSource::new();
        let generator = StatementGenerator::new(&store, &SampleReservationSource, &balances);

        let result = generator.generate(TAG, period(), &[]).unwrap();

        assert_eq!(result.tag, TAG);
        assert_eq!(result.period.to_string(), "2025-09");
        assert_eq!(result.breakdown, result.statement.breakdown());
        assert_eq!(result.verification.expected_amount, dec!(5920.00));
        assert_eq!(result.verification.actual_balance, dec!(5945.75));
        assert_eq!(result.verification.status, VerificationStatus::DiscrepancyFound);
        assert!(result.discrepancy_found);
    }

    #[test]
    fn test_generate_with_matching_bank() {
        let store = ConfigStore::default();
        let balances = FixedBalanceSource::new(dec!(5720.00));
        let generator = StatementGenerator::new(&store, &SampleReservationSource, &balances);
        let expenses = [ManualExpense::new("Plumbing repair", dec!(100), None)];

        let result = generator.generate(TAG, period(), &expenses).unwrap();

        assert!(result.verification.is_match);
        assert!(!result.discrepancy_found);
    }

    #[test]
    fn test_generator_surfaces_source_failure() {
        struct BrokenFeed;
        impl ReservationSource for BrokenFeed {
            fn reservations(&self, _tag: &str, _period: &StatementPeriod) -> Result<Vec<Reservation>> {
                Err(StatementError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "booking platform unreachable",
                )))
            }
        }

        let store = ConfigStore::default();
        let balances = SimulatedBalanceSource::new();
        let generator = StatementGenerator::new(&store, &BrokenFeed, &balances);

        let err = generator.generate(TAG, period(), &[]).unwrap_err();
        assert!(matches!(err, StatementError::ComputationFailed(_)));
        assert!(err.to_string().contains("booking platform unreachable"));
    }

    #[test]
    fn test_generator_reports_amount_overflow() {
        let mut huge = SampleReservationSource::sample(TAG);
        huge.truncate(2);
        for reservation in &mut huge {
            reservation.total_amount = Decimal::MAX;
        }

        let store = ConfigStore::default();
        let source = InMemoryReservationSource::new(huge);
        let balances = SimulatedBalanceSource::new();
        let generator = StatementGenerator::new(&store, &source, &balances);

        let err = generator.generate(TAG, period(), &[]).unwrap_err();
        assert!(matches!(err, StatementError::ComputationFailed(_)));
    }

    #[test]
    fn test_huge_manual_expenses_are_reported() {
        let expenses = [
            ManualExpense::new("Rebuild", Decimal::MAX, None),
            ManualExpense::new("Furnishing", Decimal::MAX, None),
        ];
        let err = StatementProcessor::new(&ConfigStore::default())
            .process(TAG, &SampleReservationSource::sample(TAG), &expenses)
            .unwrap_err();

        assert!(err.to_string().contains("other expenses"));
    }

    #[test]
    fn test_independent_runs_do_not_share_state() {
        let mut store = ConfigStore::default();
        store
            .add_override("Beach House", SettingsOverride::new().with_management_fee(dec!(10)))
            .unwrap();

        let source = InMemoryReservationSource::new(
            SampleReservationSource::sample(TAG)
                .into_iter()
                .chain(SampleReservationSource::sample("Beach House"))
                .collect(),
        );
        let balances = SimulatedBalanceSource::new();

        let before = {
            let generator = StatementGenerator::new(&store, &source, &balances);
            let laswell = generator.generate(TAG, period(), &[]).unwrap();
            let beach = generator.generate("Beach House", period(), &[]).unwrap();
            assert_eq!(beach.statement.management_fee, dec!(592));
            laswell
        };

        // Editing settings afterwards must not touch a finished statement
        store
            .update_override(TAG, SettingsOverride::new().with_management_fee(dec!(30)))
            .unwrap();
        let generator = StatementGenerator::new(&store, &source, &balances);
        let after = generator.generate(TAG, period(), &[]).unwrap();

        assert_eq!(before.statement.management_fee, dec!(1184));
        assert_eq!(after.statement.management_fee, dec!(1776));
        assert_ne!(before.run_id, after.run_id);
    }
}
