//! Command-line interface definitions.
//!
//! Defines the CLI structure for the derivgate binary using `clap`. Every
//! broker operation of the facade has a subcommand; `config` and `check`
//! cover local setup and connectivity.

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

use super::paths;
use crate::domain::{Basis, DurationUnit};

/// Deriv broker gateway client
#[derive(Parser, Debug)]
#[command(name = "derivgate")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands for the derivgate CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authorize with the API token and show the account
    Authorize(ConfigPathArg),

    /// Show the account balance
    Balance(BalanceArgs),

    /// List the logins of the authorized user
    Accounts(ConfigPathArg),

    /// Switch the active login
    Switch(SwitchArgs),

    /// Stream live ticks for a symbol
    Ticks(TicksArgs),

    /// Fetch recent candles for a symbol
    History(HistoryArgs),

    /// Buy a contract
    Buy(Box<BuyArgs>),

    /// List tradable symbols
    Assets(AssetsArgs),

    /// Check connectivity to the broker
    Check(ConfigPathArg),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Subcommands for `derivgate config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Generate a new configuration file from template.
    Init(ConfigInitArgs),
    /// Display the effective configuration with defaults applied.
    Show(ConfigPathArg),
    /// Validate the configuration file.
    Validate(ConfigPathArg),
}

/// Shared argument for commands that only need a config path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to the configuration file.
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,
}

/// Arguments for the `config init` subcommand.
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Output path for the generated configuration file.
    #[arg(default_value_os_t = paths::default_config())]
    pub path: PathBuf,
    /// Overwrite the file if it already exists.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `balance` subcommand.
#[derive(Parser, Debug)]
pub struct BalanceArgs {
    #[command(flatten)]
    pub config: ConfigPathArg,

    /// Keep streaming balance updates until this many have arrived.
    #[arg(long)]
    pub watch: Option<usize>,
}

/// Arguments for the `switch` subcommand.
#[derive(Parser, Debug)]
pub struct SwitchArgs {
    /// Login id to activate (e.g. VRTC1234567).
    pub loginid: String,

    #[command(flatten)]
    pub config: ConfigPathArg,
}

/// Arguments for the `ticks` subcommand.
#[derive(Parser, Debug)]
pub struct TicksArgs {
    /// Symbol to stream (e.g. R_100).
    pub symbol: String,

    /// Stop after this many ticks.
    #[arg(short = 'n', long, default_value = "5")]
    pub count: usize,

    #[command(flatten)]
    pub config: ConfigPathArg,
}

/// Arguments for the `history` subcommand.
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Symbol to fetch (e.g. R_100).
    pub symbol: String,

    /// Candle size in seconds.
    #[arg(short, long, default_value = "60")]
    pub granularity: u32,

    /// Show only the most recent candles.
    #[arg(long)]
    pub last: Option<usize>,

    #[command(flatten)]
    pub config: ConfigPathArg,
}

/// Arguments for the `buy` subcommand.
#[derive(Parser, Debug)]
pub struct BuyArgs {
    /// Underlying symbol (e.g. R_100).
    #[arg(long)]
    pub symbol: String,

    /// Contract type (e.g. CALL, PUT).
    #[arg(long)]
    pub contract_type: String,

    /// Stake or payout amount.
    #[arg(long)]
    pub amount: Decimal,

    /// Whether the amount is the stake or the payout.
    #[arg(long, value_enum, default_value = "stake")]
    pub basis: BasisArg,

    /// Account currency.
    #[arg(long, default_value = "USD")]
    pub currency: String,

    /// Contract duration.
    #[arg(long, default_value = "5")]
    pub duration: u32,

    /// Duration unit.
    #[arg(long, value_enum, default_value = "ticks")]
    pub duration_unit: DurationUnitArg,

    #[command(flatten)]
    pub config: ConfigPathArg,
}

/// Arguments for the `assets` subcommand.
#[derive(Parser, Debug)]
pub struct AssetsArgs {
    /// Only show symbols of this market (e.g. forex).
    #[arg(long)]
    pub market: Option<String>,

    /// Only show symbols whose exchange is open.
    #[arg(long)]
    pub open: bool,

    #[command(flatten)]
    pub config: ConfigPathArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum BasisArg {
    Stake,
    Payout,
}

impl From<BasisArg> for Basis {
    fn from(arg: BasisArg) -> Self {
        match arg {
            BasisArg::Stake => Self::Stake,
            BasisArg::Payout => Self::Payout,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DurationUnitArg {
    Ticks,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl From<DurationUnitArg> for DurationUnit {
    fn from(arg: DurationUnitArg) -> Self {
        match arg {
            DurationUnitArg::Ticks => Self::Ticks,
            DurationUnitArg::Seconds => Self::Seconds,
            DurationUnitArg::Minutes => Self::Minutes,
            DurationUnitArg::Hours => Self::Hours,
            DurationUnitArg::Days => Self::Days,
        }
    }
}
