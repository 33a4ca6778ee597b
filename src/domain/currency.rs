//! Currency display helpers.

use rust_decimal::{Decimal, RoundingStrategy};

/// Human-readable name for a broker currency code.
///
/// Unknown codes are returned unchanged.
#[must_use]
pub fn currency_name(code: &str) -> &str {
    match code {
        "USD" => "US Dollar",
        "EUR" => "Euro",
        "GBP" => "British Pound",
        "AUD" => "Australian Dollar",
        "BTC" => "Bitcoin",
        "ETH" => "Ethereum",
        "LTC" => "Litecoin",
        "UST" | "tUSDT" => "Tether TRC20",
        "USDT" => "Tether",
        "eUSDT" => "Tether ERC20",
        "USDC" => "USD Coin",
        "DAI" => "Dai",
        "BUSD" => "Binance USD",
        "PAX" => "Paxos Standard",
        "TUSD" => "TrueUSD",
        other => other,
    }
}

fn is_crypto(code: &str) -> bool {
    matches!(code, "BTC" | "ETH" | "LTC")
}

/// Format a balance for display.
///
/// Crypto balances keep eight decimal places; fiat balances get two and a
/// thousands separator.
#[must_use]
pub fn format_balance(amount: Decimal, currency: &str) -> String {
    if is_crypto(currency) {
        let rounded = amount.round_dp_with_strategy(8, RoundingStrategy::MidpointAwayFromZero);
        return format!("{rounded:.8}");
    }

    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{fraction}")
}
