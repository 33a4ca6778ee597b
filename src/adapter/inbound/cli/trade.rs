//! Handler for `buy`.

use serde_json::json;

use super::command::BuyArgs;
use super::context::authorized_session;
use super::output;
use crate::domain::TradeRequest;
use crate::error::Result;

fn trade_request(args: &BuyArgs) -> TradeRequest {
    TradeRequest {
        amount: args.amount,
        basis: args.basis.into(),
        currency: args.currency.trim().to_ascii_uppercase(),
        duration: args.duration,
        duration_unit: args.duration_unit.into(),
        symbol: args.symbol.trim().to_string(),
        contract_type: args.contract_type.trim().to_ascii_uppercase(),
    }
}

/// Execute `buy`.
///
/// The request is validated before anything connects.
pub async fn execute_buy(args: &BuyArgs) -> Result<()> {
    let request = trade_request(args);
    request.validate()?;

    let session = authorized_session(&args.config.config).await?;
    let result = session.broker().place_trade(&request).await;
    session.sign_out().await;
    let receipt = result?;

    if output::is_json() {
        output::report("buy", json!({ "request": request, "receipt": receipt }));
        return Ok(());
    }
    output::receipt(&request, &receipt);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::inbound::cli::command::{BasisArg, ConfigPathArg, DurationUnitArg};
    use crate::domain::{Basis, DurationUnit};
    use rust_decimal_macros::dec;
    use std::path::PathBuf;

    fn args() -> BuyArgs {
        BuyArgs {
            symbol: " R_100 ".into(),
            contract_type: "call".into(),
            amount: dec!(10),
            basis: BasisArg::Payout,
            currency: "usd".into(),
            duration: 3,
            duration_unit: DurationUnitArg::Minutes,
            config: ConfigPathArg {
                config: PathBuf::from("config.toml"),
            },
        }
    }

    #[test]
    fn request_is_normalized_from_args() {
        let request = trade_request(&args());
        assert_eq!(request.symbol, "R_100");
        assert_eq!(request.contract_type, "CALL");
        assert_eq!(request.currency, "USD");
        assert_eq!(request.basis, Basis::Payout);
        assert_eq!(request.duration_unit, DurationUnit::Minutes);
        assert!(request.validate().is_ok());
    }

    #[tokio::test]
    async fn invalid_amount_fails_before_connecting() {
        let mut args = args();
        args.amount = dec!(0);
        let err = execute_buy(&args).await.unwrap_err();
        assert!(err.to_string().contains("amount"));
    }
}
