// 🖨️ Report rendering - markdown statement + CSV breakdown export
//
// Presentation only: everything here reads a finished StatementResult.

use crate::error::{Result, StatementError};
use crate::money::{format_currency, format_percentage};
use crate::reservations::StatementPeriod;
use crate::statement::{BreakdownLine, StatementResult};
use chrono::{Local, NaiveDateTime};
use std::fmt::{self, Write as _};
use std::fs;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const REPORT_VERSION: &str = "1.0.0";

pub const CSV_HEADERS: [&str; 4] = ["Line Item", "Amount", "Type", "Payout To"];

// ============================================================================
// FILE NAMES
// ============================================================================

fn file_tag(tag: &str) -> String {
    tag.replace(' ', "_")
}

/// `owner_statement_480_Laswell_Ave_2025-09.md`
pub fn report_file_name(tag: &str, period: &StatementPeriod) -> String {
    format!("owner_statement_{}_{}.md", file_tag(tag), period)
}

/// `owner_statement_data_480_Laswell_Ave_2025-09.csv`
pub fn csv_file_name(tag: &str, period: &StatementPeriod) -> String {
    format!("owner_statement_data_{}_{}.csv", file_tag(tag), period)
}

// ============================================================================
// CSV EXPORT
// ============================================================================

pub fn breakdown_csv(lines: &[BreakdownLine]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;

    for line in lines {
        writer.write_record([
            line.line_item.as_str(),
            format_currency(line.amount).as_str(),
            line.line_type.label(),
            line.payout_to.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| StatementError::Io(err.into_error()))?;
    String::from_utf8(bytes).map_err(|err| StatementError::ComputationFailed(err.to_string()))
}

// ============================================================================
// MARKDOWN REPORT
// ============================================================================

/// Markdown report stamped with the current local time
pub fn markdown_report(result: &StatementResult) -> String {
    render_markdown(result, Local::now().naive_local())
}

pub fn render_markdown(result: &StatementResult, generated_at: NaiveDateTime) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_markdown(&mut out, result, generated_at);
    out
}

fn write_markdown(out: &mut String, result: &StatementResult, generated_at: NaiveDateTime) -> fmt::Result {
    let statement = &result.statement;
    let verification = &result.verification;
    let settings = &statement.settings;
    let timestamp = generated_at.format(TIMESTAMP_FORMAT).to_string();
    let net = statement.net_income();

    writeln!(out, "# Owner Statement Report\n")?;
    writeln!(out, "## Property: {}", statement.tag)?;
    writeln!(out, "**Report Date:** {}  ", timestamp)?;
    writeln!(out, "**Period:** {}  ", result.period)?;
    writeln!(
        out,
        "**Workflow Status:** {}\n",
        if result.discrepancy_found {
            "⚠️ DISCREPANCY FOUND"
        } else {
            "✅ VERIFIED"
        }
    )?;

    writeln!(out, "## Executive Summary")?;
    writeln!(out, "- **Total Reservations:** {}", statement.total_reservations)?;
    writeln!(out, "- **Gross Revenue:** {}", format_currency(statement.reservation_income))?;
    writeln!(out, "- **Net Owner Payout:** {}", format_currency(statement.owner_payout))?;
    writeln!(out, "- **Management Fee:** {}", format_currency(statement.management_fee))?;
    writeln!(
        out,
        "- **Total Deductions:** {}\n",
        format_currency(statement.total_deductions())
    )?;

    writeln!(out, "## Financial Breakdown\n")?;
    writeln!(out, "| Line Item | Amount | Type | Payout To |")?;
    writeln!(out, "|-----------|--------|------|-----------|")?;
    for line in &result.breakdown {
        writeln!(
            out,
            "| {} | {} | {} | {} |",
            line.line_item,
            format_currency(line.amount),
            line.line_type.label(),
            line.payout_to
        )?;
    }

    writeln!(out, "\n## Calculation Methodology")?;
    writeln!(
        out,
        "- **Management Fee Rate:** {}",
        format_percentage(settings.management_fee_percentage)
    )?;
    writeln!(
        out,
        "- **Supplies Estimate:** {} of cleaning fees ({})",
        format_percentage(settings.supplies_estimate_percentage),
        format_currency(statement.cleaning_fees)
    )?;
    writeln!(
        out,
        "- **Utilities Estimate:** {} of reservation income",
        format_percentage(settings.utilities_estimate_percentage)
    )?;
    writeln!(
        out,
        "- **Management Fee Base:** Reservation Income - Supplies - Utilities - Other Expenses\n"
    )?;
    writeln!(out, "### Management Fee Calculation:")?;
    writeln!(out, "```")?;
    writeln!(
        out,
        "Base Amount = {} - {} - {} - {}",
        format_currency(statement.reservation_income),
        format_currency(statement.supplies_estimate),
        format_currency(statement.utilities_estimate),
        format_currency(statement.other_expenses)
    )?;
    writeln!(out, "Base Amount = {}", format_currency(net))?;
    writeln!(
        out,
        "Management Fee = {} × {} = {}",
        format_currency(net),
        format_percentage(settings.management_fee_percentage),
        format_currency(statement.management_fee)
    )?;
    writeln!(out, "```\n")?;

    writeln!(out, "## Bank Account Verification")?;
    writeln!(
        out,
        "- **Expected Total Payouts:** {}",
        format_currency(verification.expected_amount)
    )?;
    writeln!(
        out,
        "- **Actual Bank Balance:** {}",
        format_currency(verification.actual_balance)
    )?;
    writeln!(out, "- **Discrepancy:** {}", format_currency(verification.discrepancy))?;
    writeln!(out, "- **Tolerance:** {}", format_currency(verification.tolerance))?;
    writeln!(out, "- **Status:** {}", verification.status)?;
    writeln!(
        out,
        "- **Verification Time:** {}",
        verification.verified_at.to_rfc3339()
    )?;
    if verification.simulation {
        writeln!(out, "- **Balance Source:** simulated")?;
    }
    writeln!(out)?;

    if result.discrepancy_found {
        writeln!(out, "## ⚠️ DISCREPANCY ALERT")?;
        writeln!(
            out,
            "**CRITICAL:** The bank balance does not match the expected payout total.\n"
        )?;
        writeln!(out, "**Immediate Actions Required:**")?;
        writeln!(
            out,
            "1. **STOP** - Do not process any payouts until discrepancy is resolved"
        )?;
        writeln!(out, "2. Review all reservation data for completeness")?;
        writeln!(out, "3. Verify all manual expenses are correctly entered")?;
        writeln!(out, "4. Check bank account for pending transactions")?;
        writeln!(out, "5. Confirm no duplicate or missing reservations")?;
        writeln!(
            out,
            "6. Investigate the {} difference\n",
            format_currency(verification.discrepancy)
        )?;
    } else {
        writeln!(out, "## ✅ VERIFICATION SUCCESSFUL")?;
        writeln!(out, "All financial data has been verified and reconciled.\n")?;
        writeln!(out, "**Ready for Payout Processing:**")?;
        writeln!(out, "- Owner Payout: {}", format_currency(statement.owner_payout))?;
        writeln!(
            out,
            "- Management Fee Retention: {}\n",
            format_currency(statement.management_fee)
        )?;
    }

    writeln!(out, "## Reservation Details")?;
    writeln!(
        out,
        "| ID | Guest | Check In | Check Out | Revenue | Cleaning Fee | Platform |"
    )?;
    writeln!(
        out,
        "|----|-------|----------|-----------|---------|--------------|----------|"
    )?;
    for reservation in &statement.reservations {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} |",
            reservation.reservation_id,
            reservation.guest_name,
            reservation.check_in,
            reservation.check_out,
            format_currency(reservation.total_amount),
            format_currency(reservation.cleaning_fee),
            reservation.platform
        )?;
    }

    writeln!(out, "\n## Next Steps")?;
    if result.discrepancy_found {
        writeln!(
            out,
            "1. 🔍 **INVESTIGATE DISCREPANCY** - Do not proceed with payouts"
        )?;
        writeln!(
            out,
            "2. Review and resolve the {} discrepancy",
            format_currency(verification.discrepancy)
        )?;
        writeln!(out, "3. Re-run verification after corrections")?;
    } else {
        writeln!(
            out,
            "1. ✅ **PROCEED WITH PAYOUTS** - All verifications passed"
        )?;
        writeln!(
            out,
            "2. Process owner payout: {}",
            format_currency(statement.owner_payout)
        )?;
        writeln!(
            out,
            "3. Retain management fee: {}",
            format_currency(statement.management_fee)
        )?;
    }
    writeln!(out, "4. Update client records and file statement\n")?;

    writeln!(out, "---")?;
    writeln!(out, "**Generated by:** Owner Statement Generator  ")?;
    writeln!(out, "**Timestamp:** {}  ", timestamp)?;
    writeln!(out, "**Version:** {}", REPORT_VERSION)?;

    Ok(())
}

// ============================================================================
// FILE OUTPUT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ReportFiles {
    pub markdown: PathBuf,
    pub csv: PathBuf,
}

/// Write both downloads into `dir` (created if missing)
pub fn write_reports(result: &StatementResult, dir: &Path) -> Result<ReportFiles> {
    fs::create_dir_all(dir)?;

    let markdown = dir.join(report_file_name(&result.tag, &result.period));
    fs::write(&markdown, markdown_report(result))?;

    let csv = dir.join(csv_file_name(&result.tag, &result.period));
    fs::write(&csv, breakdown_csv(&result.breakdown)?)?;

    tracing::info!(
        markdown = %markdown.display(),
        csv = %csv.display(),
        "statement reports written"
    );

    Ok(ReportFiles { markdown, csv })
}

// ============================================================================
// TESTS
// ============================================================================
