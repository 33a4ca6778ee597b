//! Terminal output for the derivgate CLI.
//!
//! Text mode is for a person at a terminal. With `--json` each command
//! prints one result document (`{"command": ..., ...}`) and live streams
//! print one `{"event": ...}` line per tick or balance update; headings,
//! fields and notes are not printed at all. `--quiet` keeps stream lines,
//! warnings and errors. Errors go to stderr in both modes.

use std::cmp::Ordering;
use std::fmt::Display;
use std::time::Duration;

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use parking_lot::{const_rwlock, RwLock};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tabled::{Table, Tabled};

use crate::domain::currency::{currency_name, format_balance};
use crate::domain::{Balance, Tick, TradeReceipt, TradeRequest};

/// Output flags taken from the global CLI options.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    pub json: bool,
    pub quiet: bool,
    /// Number of `-v` flags.
    pub verbose: u8,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(json: bool, quiet: bool, verbose: u8) -> Self {
        Self {
            json,
            quiet,
            verbose,
        }
    }
}

static CONFIG: RwLock<OutputConfig> = const_rwlock(OutputConfig::new(false, false, 0));

/// Apply the global flags. Called once from `main`.
pub fn configure(config: OutputConfig) {
    *CONFIG.write() = config;
}

fn current() -> OutputConfig {
    *CONFIG.read()
}

#[must_use]
pub fn is_json() -> bool {
    current().json
}

#[must_use]
pub fn verbosity() -> u8 {
    current().verbose
}

/// Text mode without `--quiet`.
fn chatty() -> bool {
    let config = current();
    !config.json && !config.quiet
}

// -------------------------------------------------------------------------
// JSON documents
// -------------------------------------------------------------------------

/// Print the result document of `command`.
///
/// The members of `fields` are merged next to `"command"`; a non-object
/// value lands under `"result"`.
pub fn report(command: &str, fields: Value) {
    let mut document = Map::new();
    document.insert("command".into(), Value::String(command.to_string()));
    match fields {
        Value::Object(members) => document.extend(members),
        other => {
            document.insert("result".into(), other);
        }
    }
    println!("{}", Value::Object(document));
}

fn event(kind: &str, payload: &impl Serialize) {
    let Ok(payload) = serde_json::to_value(payload) else {
        return;
    };
    let mut line = Map::new();
    line.insert("event".into(), Value::String(kind.to_string()));
    line.insert(kind.to_string(), payload);
    println!("{}", Value::Object(line));
}

// -------------------------------------------------------------------------
// Text lines
// -------------------------------------------------------------------------

/// Kind of a one-line status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Done,
    /// Shown in quiet mode too; on stderr in JSON mode.
    Warn,
    Note,
    Hint,
}

pub fn say(tone: Tone, message: &str) {
    let config = current();
    match tone {
        Tone::Warn if config.json => eprintln!("{}", json!({ "warning": message })),
        Tone::Warn => println!("  {} {}", "⚠".yellow(), message),
        _ if config.json || config.quiet => {}
        Tone::Done => println!("  {} {}", "✓".green(), message),
        Tone::Note => println!("  {}", message.dimmed()),
        Tone::Hint => println!("  {}: {}", "hint".cyan().dimmed(), message.dimmed()),
    }
}

pub fn heading(title: &str) {
    if chatty() {
        println!();
        println!("{}", title.bold());
    }
}

/// A labeled value under the current heading.
pub fn field(label: &str, value: impl Display) {
    if chatty() {
        println!("  {:<12} {}", label.dimmed(), value);
    }
}

/// Render `rows` as an indented table, or `empty` as a note.
pub fn table<T: Tabled>(rows: impl IntoIterator<Item = T>, empty: &str) {
    if !chatty() {
        return;
    }
    let rows: Vec<T> = rows.into_iter().collect();
    if rows.is_empty() {
        say(Tone::Note, empty);
        return;
    }
    for line in Table::new(rows).to_string().lines() {
        println!("  {line}");
    }
}

pub fn error(message: &str) {
    if is_json() {
        eprintln!("{}", json!({ "error": message }));
    } else {
        eprintln!("  {} {}", "×".red(), message);
    }
}

#[must_use]
pub fn accent(value: impl Display) -> String {
    format!("{}", value.to_string().cyan())
}

#[must_use]
pub fn dim(value: impl Display) -> String {
    format!("{}", value.to_string().dimmed())
}

/// Format a broker epoch, falling back to the raw seconds.
#[must_use]
pub fn format_epoch(timestamp: Option<DateTime<Utc>>, epoch: i64, pattern: &str) -> String {
    timestamp.map_or_else(|| epoch.to_string(), |ts| ts.format(pattern).to_string())
}

// -------------------------------------------------------------------------
// Broker values
// -------------------------------------------------------------------------

/// Quote marked up or down against the previous tick.
#[must_use]
pub fn quote(tick: &Tick, previous: Option<&Tick>) -> String {
    let text = tick.quote.to_string();
    match previous.map(|prev| tick.quote.cmp(&prev.quote)) {
        Some(Ordering::Greater) => format!("{} {}", text.green(), "▲".green()),
        Some(Ordering::Less) => format!("{} {}", text.red(), "▼".red()),
        _ => text,
    }
}

/// One streamed tick.
pub fn tick(tick: &Tick, previous: Option<&Tick>) {
    if is_json() {
        event("tick", tick);
        return;
    }
    println!(
        "  {} {} {}",
        format_epoch(tick.timestamp(), tick.epoch, "%H:%M:%S").dimmed(),
        tick.symbol.cyan(),
        quote(tick, previous)
    );
}

/// One streamed balance update.
pub fn balance_update(update: &Balance) {
    if is_json() {
        event("balance", update);
        return;
    }
    println!(
        "  {} {} {}",
        Utc::now().format("%H:%M:%S").to_string().dimmed(),
        "balance".cyan(),
        format_balance(update.balance, &update.currency)
    );
}

/// A balance snapshot as fields.
pub fn balance(balance: &Balance) {
    field(
        "Balance",
        accent(format_balance(balance.balance, &balance.currency)),
    );
    field("Currency", currency_name(&balance.currency));
    if let Some(loginid) = &balance.loginid {
        field("Login", loginid);
    }
}

/// The outcome of a purchase.
pub fn receipt(request: &TradeRequest, receipt: &TradeReceipt) {
    say(
        Tone::Done,
        &format!("Bought {} on {}", request.contract_type, request.symbol),
    );
    field("Contract", receipt.contract_id);
    field("Transaction", receipt.transaction_id);
    if let Some(price) = receipt.buy_price {
        field("Price", format_balance(price, &request.currency));
    }
    field(
        "Payout",
        format_balance(receipt.payout, &request.currency).green(),
    );
    if let Some(balance) = receipt.balance_after {
        field("Balance", format_balance(balance, &request.currency));
    }
    if let Some(longcode) = &receipt.longcode {
        say(Tone::Note, longcode);
    }
}

// -------------------------------------------------------------------------
// Progress
// -------------------------------------------------------------------------

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Spinner around one broker round trip. Draws nothing outside text mode.
pub struct Progress(ProgressBar);

impl Progress {
    #[must_use]
    pub fn start(message: &str) -> Self {
        if !chatty() {
            return Self(ProgressBar::hidden());
        }
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_strings(SPINNER_FRAMES)
            .template("  {spinner:.cyan} {msg}")
        {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self(bar)
    }

    pub fn done(self, message: &str) {
        self.0
            .finish_with_message(format!("{} {}", "✓".green(), message));
    }

    pub fn failed(self, message: &str) {
        self.0
            .finish_with_message(format!("{} {}", "×".red(), message));
    }
}
