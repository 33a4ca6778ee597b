//! Command dispatch.

use super::command::{Cli, Commands, ConfigCommand};
use super::{account, check, config, market, trade};
use crate::error::Result;

/// Run a parsed command line to completion.
///
/// # Errors
///
/// Returns the first error of the selected handler.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Authorize(args) => account::execute_authorize(&args.config).await,
        Commands::Balance(args) => {
            account::execute_balance(&args.config.config, args.watch).await
        }
        Commands::Accounts(args) => account::execute_accounts(&args.config).await,
        Commands::Switch(args) => {
            account::execute_switch(&args.config.config, &args.loginid).await
        }
        Commands::Ticks(args) => {
            market::execute_ticks(&args.config.config, &args.symbol, args.count).await
        }
        Commands::History(args) => {
            market::execute_history(&args.config.config, &args.symbol, args.granularity, args.last)
                .await
        }
        Commands::Assets(args) => {
            market::execute_assets(&args.config.config, args.market.as_deref(), args.open).await
        }
        Commands::Buy(args) => trade::execute_buy(&args).await,
        Commands::Check(args) => check::execute_connection(&args.config).await,
        Commands::Config(ConfigCommand::Init(args)) => config::execute_init(&args.path, args.force),
        Commands::Config(ConfigCommand::Show(args)) => config::execute_show(&args.config),
        Commands::Config(ConfigCommand::Validate(args)) => config::execute_validate(&args.config),
    }
}
