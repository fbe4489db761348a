// Owner Statements - Core Library
// Exposes all modules for use in the CLI, the terminal report, the API server and tests

pub mod calculations;
pub mod config;
pub mod error;
pub mod logging;
pub mod money;
pub mod reconciliation;
pub mod report;
pub mod reservations;
pub mod settings;
pub mod statement;

// Re-export commonly used types
pub use calculations::{management_fee, net_income, supplies_estimate, utilities_estimate};
pub use config::{AppConfig, ConfigManager};
pub use error::{Result, StatementError};
pub use money::{apply_percentage, format_currency, format_percentage};
pub use reconciliation::{
    BalanceSource, BankVerification, FixedBalanceSource, ReconciliationEngine,
    SimulatedBalanceSource, VerificationStatus, DEFAULT_TOLERANCE, SIMULATED_OFFSET,
};
pub use report::{
    breakdown_csv, csv_file_name, markdown_report, render_markdown, report_file_name,
    write_reports, ReportFiles,
};
pub use reservations::{
    aggregate, CsvReservationSource, InMemoryReservationSource, Reservation,
    ReservationSource, ReservationTotals, SampleReservationSource, StatementPeriod,
};
pub use settings::{
    ConfigStore, Settings, SettingsEditor, SettingsOverride, SettingsSource,
    DEFAULT_PROPERTY_TAG,
};
pub use statement::{
    BreakdownLine, LineType, ManualExpense, ProcessedStatement, StatementGenerator,
    StatementProcessor, StatementResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reservation feed chosen by the runtime configuration
pub fn reservation_source(config: &AppConfig) -> Box<dyn ReservationSource + Send + Sync> {
    match &config.reservations_path {
        Some(path) => Box::new(CsvReservationSource::new(path.clone())),
        None => Box::new(SampleReservationSource),
    }
}

/// Bank balance feed chosen by the runtime configuration
pub fn balance_source(config: &AppConfig) -> Box<dyn BalanceSource + Send + Sync> {
    match config.bank_balance {
        Some(balance) => Box::new(FixedBalanceSource::new(balance)),
        None => Box::new(SimulatedBalanceSource::new()),
    }
}
