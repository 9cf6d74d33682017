//! Command-line interface definitions.

use alloy::primitives::{Address, U256};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use baseflow::config::ProviderKind;
use baseflow::domain::order::{DcaInterval, OrderDuration};

#[derive(Parser, Debug)]
#[command(name = "baseflow")]
#[command(about = "DEX aggregation, DCA, limit and stop-loss orders on Base")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "baseflow.toml", global = true)]
    pub config: String,

    /// Skip the confirmation prompt before sending transactions
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Override the configured quote provider (zeroex, odos)
    #[arg(long, global = true)]
    pub provider: Option<ProviderKind>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the built-in token table
    Tokens,

    /// Quote a swap without sending anything
    Quote(PairArgs),

    /// Quote and execute a swap
    Swap {
        #[command(flatten)]
        pair: PairArgs,

        /// Route through the BaseFlow contract's swap() entry point
        #[arg(long)]
        via_baseflow: bool,
    },

    /// Interactive quoting: type amounts on stdin, `switch` to flip, `quit` to exit
    Watch {
        /// Token to sell (symbol or address)
        from: String,
        /// Token to buy (symbol or address)
        to: String,
        /// Slippage tolerance in percent
        #[arg(short, long)]
        slippage: Option<Decimal>,
    },

    /// Show balances of the connected account
    Balance {
        /// Tokens to show (default: all known tokens)
        tokens: Vec<String>,
    },

    /// Show BaseFlow contract fees, routers and connection status
    Info,

    /// Dollar-cost-averaging orders
    #[command(subcommand)]
    Dca(DcaCommand),

    /// Limit orders
    #[command(subcommand)]
    Limit(TriggerCommand),

    /// Stop-loss orders
    #[command(subcommand)]
    StopLoss(TriggerCommand),
}

#[derive(Args, Debug, Clone)]
pub struct PairArgs {
    /// Amount of the sell token (decimal)
    pub amount: String,
    /// Token to sell (symbol or address)
    pub from: String,
    /// Token to buy (symbol or address)
    pub to: String,
    /// Slippage tolerance in percent
    #[arg(short, long)]
    pub slippage: Option<Decimal>,
}

#[derive(Subcommand, Debug)]
pub enum DcaCommand {
    /// Create a DCA order
    Create {
        /// Total amount of the sell token
        total: String,
        /// Token to sell
        from: String,
        /// Token to buy
        to: String,
        /// Number of executions (2-365)
        #[arg(short = 'n', long, default_value_t = 30)]
        intervals: u32,
        /// hourly, daily, weekly, bi-weekly or monthly
        #[arg(short, long, default_value = "daily")]
        every: DcaInterval,
    },
    /// List active DCA orders
    List {
        /// Account to inspect (default: connected account)
        #[arg(long)]
        account: Option<Address>,
    },
    /// Cancel a DCA order
    Cancel {
        /// Order id
        id: U256,
    },
}

#[derive(Subcommand, Debug)]
pub enum TriggerCommand {
    /// Create an order
    Create {
        /// Amount of the sell token
        amount: String,
        /// Token to sell
        from: String,
        /// Token to buy
        to: String,
        /// Trigger price, token out per token in
        #[arg(short, long)]
        price: String,
        /// 1d, 7d, 14d or 30d
        #[arg(short, long, default_value = "7d")]
        duration: OrderDuration,
    },
    /// List active orders
    List {
        /// Account to inspect (default: connected account)
        #[arg(long)]
        account: Option<Address>,
    },
    /// Cancel an order
    Cancel {
        /// Order id
        id: U256,
    },
}
