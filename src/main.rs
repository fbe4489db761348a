// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

use owner_statements::{
    balance_source, breakdown_csv, format_currency, format_percentage, logging, markdown_report,
    reservation_source, write_reports, AppConfig, ConfigStore, ManualExpense, Settings,
    SettingsEditor, SettingsOverride, SettingsSource, StatementGenerator, StatementPeriod,
    StatementResult,
};

#[derive(Parser)]
#[command(
    name = "owner-statements",
    version,
    about = "Monthly owner statements for managed short-term rentals"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the statement for one property and month
    Generate {
        /// Property tag (defaults to the configured default tag)
        tag: Option<String>,

        #[command(flatten)]
        run: RunArgs,

        #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
        format: OutputFormat,
    },

    /// Show effective settings (defaults, or resolved for one tag)
    Settings { tag: Option<String> },

    /// Edit the persisted configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Interactive terminal report (default)
    Tui {
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Statement month as YYYY-MM (defaults to last month)
    #[arg(long)]
    month: Option<StatementPeriod>,

    /// Manual expense as description:amount[:payee], repeatable
    #[arg(long = "expense", value_name = "EXPENSE")]
    expenses: Vec<ManualExpense>,

    /// Directory for the markdown report and CSV export
    #[arg(long, default_value = ".")]
    out: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Key figures and the bank verification verdict
    Summary,
    Markdown,
    Csv,
    Json,
    /// Write both report files to --out
    Files,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Change default settings; unspecified fields keep their value
    SetDefaults {
        #[command(flatten)]
        fields: SettingsFields,

        #[arg(long)]
        default_tag: Option<String>,
    },

    /// Register a new property with its own settings
    AddOverride {
        tag: String,

        #[command(flatten)]
        fields: SettingsFields,
    },

    /// Forget a property's settings
    RemoveOverride { tag: String },
}

#[derive(Args)]
struct SettingsFields {
    #[arg(long)]
    management_fee: Option<Decimal>,

    #[arg(long)]
    supplies: Option<Decimal>,

    #[arg(long)]
    utilities: Option<Decimal>,

    #[arg(long)]
    owner_name: Option<String>,

    #[arg(long)]
    management_company: Option<String>,
}

impl SettingsFields {
    fn into_override(self) -> SettingsOverride {
        SettingsOverride {
            management_fee_percentage: self.management_fee,
            supplies_estimate_percentage: self.supplies,
            utilities_estimate_percentage: self.utilities,
            default_tag: None,
            owner_name: self.owner_name,
            management_company: self.management_company,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command {
        Some(Command::Generate { tag, run, format }) => {
            logging::init_tracing();
            run_generate(&config, tag, run, format)
        }
        Some(Command::Settings { tag }) => {
            logging::init_tracing();
            run_settings(&config, tag)
        }
        Some(Command::Config(command)) => {
            logging::init_tracing();
            run_config(&config, command)
        }
        Some(Command::Tui { run }) => run_ui_mode(&config, run),
        None => run_ui_mode(
            &config,
            RunArgs {
                month: None,
                expenses: Vec::new(),
                out: PathBuf::from("."),
            },
        ),
    }
}

fn load_store(config: &AppConfig) -> Result<ConfigStore> {
    let manager = config.config_manager();
    manager
        .load()
        .with_context(|| format!("Failed to load configuration from {}", manager.config_path().display()))
}

fn run_generate(config: &AppConfig, tag: Option<String>, run: RunArgs, format: OutputFormat) -> Result<()> {
    let store = load_store(config)?;
    let tag = tag.unwrap_or_else(|| store.default_settings.default_tag.clone());
    let period = run.month.unwrap_or_else(StatementPeriod::last_month);

    let reservations = reservation_source(config);
    let balances = balance_source(config);
    let result = StatementGenerator::new(&store, reservations.as_ref(), balances.as_ref())
        .generate(&tag, period, &run.expenses)
        .with_context(|| format!("Error generating statement for {}", tag))?;

    match format {
        OutputFormat::Summary => print_summary(&result),
        OutputFormat::Markdown => print!("{}", markdown_report(&result)),
        OutputFormat::Csv => print!("{}", breakdown_csv(&result.breakdown)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Files => {
            let files = write_reports(&result, &run.out)
                .with_context(|| format!("Failed to write reports to {}", run.out.display()))?;
            println!("✓ Report: {}", files.markdown.display());
            println!("✓ CSV:    {}", files.csv.display());
            print_verification(&result);
        }
    }

    Ok(())
}

fn print_summary(result: &StatementResult) {
    let statement = &result.statement;

    println!("🏠 Owner Statement - {} ({})", result.tag, result.period);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Reservations:        {}", statement.total_reservations);
    println!("Reservation income:  {}", format_currency(statement.reservation_income));
    println!("Owner payout:        {}", format_currency(statement.owner_payout));
    println!("Management fee:      {}", format_currency(statement.management_fee));
    println!();
    for line in &result.breakdown {
        println!(
            "  {:<28} {:>12}  {:<8} {}",
            line.line_item,
            format_currency(line.amount),
            line.line_type.label(),
            line.payout_to
        );
    }
    println!();
    print_verification(result);
}

fn print_verification(result: &StatementResult) {
    let verification = &result.verification;
    if verification.is_match {
        println!("✅ Bank balance verified ({})", format_currency(verification.actual_balance));
    } else {
        println!("🚨 DISCREPANCY FOUND - do not process payouts");
        println!("   Expected: {}", format_currency(verification.expected_amount));
        println!("   Actual:   {}", format_currency(verification.actual_balance));
        println!("   Difference: {}", format_currency(verification.discrepancy));
    }
    println!("   {}", verification.summary());
    if verification.simulation {
        println!("   (simulated bank feed)");
    }
}

fn print_settings(settings: &Settings) {
    println!("Management fee:      {}", format_percentage(settings.management_fee_percentage));
    println!("Supplies estimate:   {}", format_percentage(settings.supplies_estimate_percentage));
    println!("Utilities estimate:  {}", format_percentage(settings.utilities_estimate_percentage));
    println!("Default tag:         {}", settings.default_tag);
    if let Some(owner) = &settings.owner_name {
        println!("Owner:               {}", owner);
    }
    if let Some(company) = &settings.management_company {
        println!("Management company:  {}", company);
    }
}

fn run_settings(config: &AppConfig, tag: Option<String>) -> Result<()> {
    let store = load_store(config)?;

    match tag {
        Some(tag) => {
            let configured = store.override_for(&tag).is_some();
            println!(
                "⚙️  Settings for {}{}",
                tag,
                if configured { "" } else { " (defaults)" }
            );
            print_settings(&store.resolve(&tag));
        }
        None => {
            println!("⚙️  Default settings");
            print_settings(store.default_settings());
            println!();
            println!("Configured properties: {}", store.active_properties());
            for tag in store.client_overrides.keys() {
                println!("  • {}", tag);
            }
        }
    }

    Ok(())
}

fn run_config(config: &AppConfig, command: ConfigCommand) -> Result<()> {
    let manager = config.config_manager();
    let mut store = load_store(config)?;

    match command {
        ConfigCommand::SetDefaults { fields, default_tag } => {
            let mut changes = fields.into_override();
            changes.default_tag = default_tag;
            let updated = store.default_settings.merged_with(&changes);
            store.update_defaults(updated);
            println!("✓ Default settings updated");
        }
        ConfigCommand::AddOverride { tag, fields } => {
            store.add_override(&tag, fields.into_override())?;
            println!("✓ Added settings for {}", tag.trim());
        }
        ConfigCommand::RemoveOverride { tag } => {
            store.remove_override(&tag)?;
            println!("✓ Removed settings for {}", tag);
        }
    }

    manager
        .save(&store)
        .with_context(|| format!("Failed to save configuration to {}", manager.config_path().display()))?;
    println!("  Saved to {}", manager.config_path().display());

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AppConfig, run: RunArgs) -> Result<()> {
    logging::init_tracing_if_requested();

    let store = load_store(config)?;
    let period = run.month.unwrap_or_else(StatementPeriod::last_month);

    let mut app = ui::App::new(
        store,
        config.config_manager(),
        reservation_source(config),
        balance_source(config),
        period,
    )
    .with_manual_expenses(run.expenses)
    .with_output_dir(run.out);

    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &AppConfig, _run: RunArgs) -> Result<()> {
    eprintln!("❌ TUI not available. Build with --features tui");
    eprintln!("   Use `owner-statements generate` for a one-off statement.");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_arguments() {
        let cli = Cli::try_parse_from([
            "owner-statements",
            "generate",
            "12 Oak St",
            "--month",
            "2025-09",
            "--expense",
            "Plumbing repair:100",
            "--expense",
            "Landscaping:$1,250.50:Green Co",
            "--format",
            "json",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Generate { tag, run, format }) => {
                assert_eq!(tag.as_deref(), Some("12 Oak St"));
                assert_eq!(run.month.unwrap().to_string(), "2025-09");
                assert_eq!(run.expenses.len(), 2);
                assert_eq!(run.expenses[1].payout_to, "Green Co");
                assert!(matches!(format, OutputFormat::Json));
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_invalid_month_rejected() {
        assert!(Cli::try_parse_from(["owner-statements", "generate", "--month", "2025-13"]).is_err());
        assert!(Cli::try_parse_from(["owner-statements", "generate", "--expense", "nothing"]).is_err());
    }

    #[test]
    fn test_config_fields_become_partial_override() {
        let cli = Cli::try_parse_from([
            "owner-statements",
            "config",
            "add-override",
            "12 Oak St",
            "--management-fee",
            "25",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Config(ConfigCommand::AddOverride { tag, fields })) => {
                assert_eq!(tag, "12 Oak St");
                let overrides = fields.into_override();
                assert_eq!(overrides.management_fee_percentage, Some(Decimal::from(25)));
                assert_eq!(overrides.supplies_estimate_percentage, None);
            }
            _ => panic!("expected config add-override"),
        }
    }
}
