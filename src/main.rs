//! BaseFlow CLI - Entry Point
//!
//! Wiring sequence:
//! 1. Load `.env`, parse arguments, load + validate baseflow.toml
//! 2. Init tracing on stderr (JSON or pretty)
//! 3. Build the quote stack (0x or Odos, DefiLlama spot prices)
//! 4. Connect the chain session when the command needs one
//! 5. Dispatch the subcommand; transactions ask for confirmation

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

mod cli;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use baseflow::adapters::chain::{BaseProvider, ContractValidator, WalletClient, provider::signer_from_env};
use baseflow::adapters::quotes::{
    LlamaPriceClient, OdosClient, QuoteClientConfig, QuoteHttpClient, ZeroExClient,
};
use baseflow::config::{AppConfig, LogFormat, ProviderKind, loader};
use baseflow::domain::display::{format_balance, format_countdown, format_expiry, format_usd};
use baseflow::domain::order::TriggerKind;
use baseflow::domain::quote::{PreparedTx, QuoteOutcome, TxOutcome};
use baseflow::domain::token::{Token, TokenRegistry, router_name};
use baseflow::domain::units;
use baseflow::ports::chain_client::ChainClient;
use baseflow::ports::price_oracle::PriceOracle;
use baseflow::ports::quote_provider::QuoteProvider;
use baseflow::usecases::contract::BaseFlowContract;
use baseflow::usecases::dca::{APPROVAL_NOTICE, DcaForm, DcaService, SubmitOutcome};
use baseflow::usecases::limit_order::{TriggerOrderForm, TriggerOrderService};
use baseflow::usecases::quote_orchestrator::QuoteOrchestrator;
use baseflow::usecases::quote_session::QuoteSession;
use baseflow::usecases::swap::{SwapExecutor, SwapForm, SwapRoute};
use baseflow::usecases::wallet::WalletBalances;

use cli::{Cli, Command, DcaCommand, PairArgs, TriggerCommand};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Environment, arguments, configuration ────────────
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = loader::load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config))?;
    if let Some(provider) = cli.provider {
        config.quote.provider = provider;
    }

    // ── 2. Logging to stderr ────────────────────────────────
    init_tracing(&config);
    info!(
        name = %config.app.name,
        version = env!("CARGO_PKG_VERSION"),
        provider = ?config.quote.provider,
        "Starting BaseFlow"
    );

    // ── 3. Quote stack ──────────────────────────────────────
    let quotes = QuoteStack::build(&config)?;
    let registry = TokenRegistry::base();

    // ── 4/5. Command dispatch ───────────────────────────────
    let app = App {
        config,
        registry,
        quotes,
        assume_yes: cli.yes,
    };

    match cli.command {
        Command::Tokens => {
            app.print_tokens();
            Ok(())
        }
        Command::Quote(pair) => app.quote(&pair).await,
        Command::Swap { pair, via_baseflow } => {
            let route = if via_baseflow { SwapRoute::BaseFlow } else { SwapRoute::Direct };
            app.swap(&pair, route).await
        }
        Command::Watch { from, to, slippage } => app.watch(&from, &to, slippage).await,
        Command::Balance { tokens } => app.balance(&tokens).await,
        Command::Info => app.info().await,
        Command::Dca(cmd) => app.dca(cmd).await,
        Command::Limit(cmd) => app.trigger(TriggerKind::Limit, cmd).await,
        Command::StopLoss(cmd) => app.trigger(TriggerKind::StopLoss, cmd).await,
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.app.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match config.app.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Aggregator, spot-price oracle and the provider used for order `minAmountOut`.
struct QuoteStack {
    orchestrator: Arc<QuoteOrchestrator>,
    min_out: Arc<dyn QuoteProvider>,
}

impl QuoteStack {
    fn build(config: &AppConfig) -> Result<Self> {
        let http = Arc::new(
            QuoteHttpClient::new(QuoteClientConfig {
                timeout: Duration::from_millis(config.quote.timeout_ms),
                ..QuoteClientConfig::default()
            })
            .context("Failed to create quote HTTP client")?,
        );

        let odos: Arc<dyn QuoteProvider> = Arc::new(OdosClient::new(
            Arc::clone(&http),
            config.quote.odos_url.clone(),
            config.network.chain_id,
        ));
        let aggregator: Arc<dyn QuoteProvider> = match config.quote.provider {
            ProviderKind::Zeroex => Arc::new(ZeroExClient::from_env(
                Arc::clone(&http),
                config.quote.zeroex_url.clone(),
            )),
            ProviderKind::Odos => Arc::clone(&odos),
        };
        let oracle: Arc<dyn PriceOracle> = Arc::new(LlamaPriceClient::new(
            Arc::clone(&http),
            config.quote.price_url.clone(),
        ));

        info!(aggregator = aggregator.name(), "Quote stack ready");
        Ok(Self {
            orchestrator: Arc::new(QuoteOrchestrator::new(aggregator, oracle)),
            min_out: odos,
        })
    }
}

/// Connected chain session: provider, wallet and the BaseFlow contract.
struct Session {
    provider: BaseProvider,
    contract: Arc<BaseFlowContract<WalletClient>>,
}

impl Session {
    async fn connect(config: &AppConfig) -> Result<Self> {
        let signer = signer_from_env()?;
        let read_only = config
            .wallet
            .account
            .as_deref()
            .map(str::parse::<Address>)
            .transpose()
            .context("Invalid wallet.account")?;
        let baseflow: Address = config
            .contracts
            .baseflow
            .parse()
            .context("Invalid BaseFlow contract address")?;

        let provider = BaseProvider::connect(&config.network, signer).await?;
        let wallet = Arc::new(WalletClient::new(&provider, read_only, &config.network));
        info!(
            account = ?wallet.account(),
            can_sign = wallet.can_sign(),
            "Wallet session ready"
        );
        let contract = Arc::new(BaseFlowContract::new(wallet, baseflow));
        Ok(Self { provider, contract })
    }

    fn account(&self) -> Option<Address> {
        self.contract.chain().account()
    }

    /// Fail early when the configured contract has no code.
    async fn require_contract(&self) -> Result<()> {
        let provider = self.provider.inner();
        let validator = ContractValidator::new(provider.as_ref());
        validator
            .require_code("BaseFlow", self.contract.address())
            .await?;
        Ok(())
    }
}

struct App {
    config: AppConfig,
    registry: TokenRegistry,
    quotes: QuoteStack,
    assume_yes: bool,
}

impl App {
    /// Connect for read-mostly commands; without RPC they still run.
    async fn try_connect(&self) -> Option<Session> {
        match Session::connect(&self.config).await {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Chain unavailable, continuing offline");
                None
            }
        }
    }

    fn taker(&self, session: Option<&Session>) -> Option<Address> {
        session.and_then(Session::account).or_else(|| {
            self.config
                .wallet
                .account
                .as_deref()
                .and_then(|a| a.parse().ok())
        })
    }

    /// Symbol or address to token; unknown addresses are refined on-chain.
    async fn resolve(&self, session: Option<&Session>, text: &str) -> Result<Token> {
        let mut token = self
            .registry
            .resolve(text)
            .with_context(|| format!("Unknown token: {text}"))?;
        if self.registry.is_known(token.address) {
            return Ok(token);
        }
        if let Some(session) = session {
            match session.contract.decimals(token.address).await {
                Ok(decimals) => token.decimals = decimals,
                Err(e) => warn!(token = %token.address, error = %e, "decimals() failed, assuming 18"),
            }
            if let Ok(symbol) = session.contract.symbol(token.address).await {
                token.symbol = symbol;
            }
        }
        Ok(token)
    }

    async fn pair(&self, session: Option<&Session>, from: &str, to: &str) -> Result<(Token, Token)> {
        Ok((self.resolve(session, from).await?, self.resolve(session, to).await?))
    }

    async fn confirm(&self, action: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        print!("{action}? [y/N] ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .context("Failed to read confirmation")?;
        Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    fn print_tokens(&self) {
        for token in self.registry.all() {
            println!(
                "{:<8} {:<6} {:>2}  {}",
                token.symbol, token.name, token.decimals, token.address
            );
        }
    }

    fn swap_form(&self, token_in: Token, token_out: Token, pair: &PairArgs) -> Result<SwapForm> {
        let mut form = SwapForm::with_tokens(token_in, token_out);
        form.set_slippage(pair.slippage.unwrap_or_else(|| self.config.quote.slippage_pct()))?;
        form.set_amount_in(pair.amount.clone());
        Ok(form)
    }

    async fn quote(&self, pair: &PairArgs) -> Result<()> {
        let session = self.try_connect().await;
        let (token_in, token_out) = self.pair(session.as_ref(), &pair.from, &pair.to).await?;
        let mut form = self.swap_form(token_in, token_out, pair)?;
        let input = form.quote_input(self.taker(session.as_ref()));
        form.apply(self.quotes.orchestrator.quote(&input).await);
        print_form(&form);
        Ok(())
    }

    async fn swap(&self, pair: &PairArgs, route: SwapRoute) -> Result<()> {
        let session = Session::connect(&self.config).await?;
        if route == SwapRoute::BaseFlow {
            session.require_contract().await?;
        }
        let (token_in, token_out) = self.pair(Some(&session), &pair.from, &pair.to).await?;
        let mut form = self.swap_form(token_in, token_out, pair)?;
        let input = form.quote_input(session.account());
        form.apply(self.quotes.orchestrator.quote(&input).await);
        print_form(&form);

        let executor = SwapExecutor::new(Arc::clone(&session.contract));
        let tx = executor.prepare(&form, route).await?;
        print_prepared(&tx);
        if !self.confirm("Send swap (with approval if needed)").await? {
            println!("Cancelled");
            return Ok(());
        }

        let receipt = executor.execute(&form, route).await?;
        if let Some(approval) = receipt.approval {
            print_outcome("approval", &approval);
        }
        print_outcome("swap", &receipt.swap);
        Ok(())
    }

    async fn watch(&self, from: &str, to: &str, slippage: Option<Decimal>) -> Result<()> {
        let chain = self.try_connect().await;
        let (token_in, token_out) = self.pair(chain.as_ref(), from, to).await?;
        let mut form = SwapForm::with_tokens(token_in, token_out);
        form.set_slippage(slippage.unwrap_or_else(|| self.config.quote.slippage_pct()))?;
        let taker = self.taker(chain.as_ref());

        let debounce = Duration::from_millis(self.config.quote.debounce_ms);
        let (session, mut outcomes) = QuoteSession::spawn(Arc::clone(&self.quotes.orchestrator), debounce);
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("{} -> {}: type an amount, `switch` or `quit`", form.token_in, form.token_out);

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    match line.trim() {
                        "quit" | "exit" => break,
                        "switch" => {
                            form.switch_tokens();
                            println!("{} -> {}", form.token_in, form.token_out);
                        }
                        amount => form.set_amount_in(amount),
                    }
                    session.edit(form.quote_input(taker));
                }
                Some(outcome) = outcomes.recv() => {
                    form.apply(outcome);
                    print_form(&form);
                }
            }
        }

        // Drain while closing so a pending quote is still printed.
        let drain = async {
            while let Some(outcome) = outcomes.recv().await {
                form.apply(outcome);
                print_form(&form);
            }
        };
        tokio::join!(session.close(), drain);
        Ok(())
    }

    async fn balance(&self, symbols: &[String]) -> Result<()> {
        let session = Session::connect(&self.config).await?;
        let account = session
            .account()
            .context("No account: set BASEFLOW_PRIVATE_KEY or BASEFLOW_ACCOUNT")?;
        let balances = WalletBalances::new(Arc::clone(&session.contract));

        let tokens = if symbols.is_empty() {
            self.registry.all().to_vec()
        } else {
            let mut tokens = Vec::with_capacity(symbols.len());
            for symbol in symbols {
                tokens.push(self.resolve(Some(&session), symbol).await?);
            }
            tokens
        };

        println!("Account {account}");
        for token in &tokens {
            println!("{:<8} {}", token.symbol, balances.display_balance(token).await);
        }
        Ok(())
    }

    async fn info(&self) -> Result<()> {
        let session = Session::connect(&self.config).await?;
        let validation = ContractValidator::new(session.provider.inner().as_ref())
            .require_code("BaseFlow", session.contract.address())
            .await?;
        let info = session.contract.info().await?;

        println!("BaseFlow        {} ({} bytes)", info.address, validation.code_size);
        println!("Swap fee        {}", info.swap_fee);
        println!("Automation fee  {}", info.automation_fee);
        println!(
            "Collected fees  {} ETH",
            format_balance(units::to_decimal(info.collected_fees_eth, 18))
        );
        for token in self.registry.all().iter().filter(|t| !t.is_native()) {
            match session.contract.collected_fees_token(token.address).await {
                Ok(fees) if !fees.is_zero() => println!(
                    "                {} {}",
                    format_balance(units::to_decimal(fees, token.decimals)),
                    token.symbol
                ),
                Ok(_) => {}
                Err(e) => warn!(token = %token, error = %e, "collectedFeesToken failed"),
            }
        }
        println!("DEX routers");
        for router in &info.dex_routers {
            println!("  {router}  {}", router_name(*router).unwrap_or("unlabelled"));
        }
        match session.account() {
            Some(account) => println!(
                "Account         {account}{}",
                if session.contract.chain().can_sign() { "" } else { " (read-only)" }
            ),
            None => println!("Account         not connected"),
        }
        let healthy = session.contract.chain().is_healthy().await;
        println!("RPC             {}", if healthy { "healthy" } else { "unreachable" });
        Ok(())
    }

    async fn dca(&self, cmd: DcaCommand) -> Result<()> {
        let session = Session::connect(&self.config).await?;
        session.require_contract().await?;
        let service = DcaService::new(Arc::clone(&session.contract), self.registry.clone());

        match cmd {
            DcaCommand::Create {
                total,
                from,
                to,
                intervals,
                every,
            } => {
                let (token_in, token_out) = self.pair(Some(&session), &from, &to).await?;
                let mut form = DcaForm::new(&self.registry);
                form.token_in = token_in;
                form.token_out = token_out;
                form.total_amount = total;
                form.intervals = intervals;
                form.interval = every;
                form.total_units()?;

                println!(
                    "DCA {} {} -> {}: {} {} {} times, {}",
                    form.total_amount,
                    form.token_in,
                    form.token_out,
                    form.amount_per_interval().unwrap_or_default(),
                    form.token_in,
                    form.intervals,
                    form.interval.label()
                );
                if !self.confirm("Create DCA order").await? {
                    println!("Cancelled");
                    return Ok(());
                }
                print_submit(&service.create(&form).await?);
            }
            DcaCommand::List { account } => {
                let user = self.list_account(&session, account)?;
                let now = Utc::now();
                let orders = service.list(user, now).await?;
                if orders.is_empty() {
                    println!("No active DCA orders");
                }
                for order in orders {
                    println!(
                        "#{:<5} {} {} -> {}  every {}h  {} left  next in {}",
                        order.id,
                        order.amount_per_interval,
                        order.token_in,
                        order.token_out,
                        order.interval_hours(),
                        order.intervals_remaining,
                        format_countdown(order.next_execution, now)
                    );
                }
            }
            DcaCommand::Cancel { id } => {
                self.cancel(&format!("Cancel DCA order #{id}"), service.cancel(id)).await?;
            }
        }
        Ok(())
    }

    async fn trigger(&self, kind: TriggerKind, cmd: TriggerCommand) -> Result<()> {
        let session = Session::connect(&self.config).await?;
        session.require_contract().await?;
        let service = TriggerOrderService::new(
            Arc::clone(&session.contract),
            Arc::clone(&self.quotes.min_out),
            self.registry.clone(),
        );

        match cmd {
            TriggerCommand::Create {
                amount,
                from,
                to,
                price,
                duration,
            } => {
                let (token_in, token_out) = self.pair(Some(&session), &from, &to).await?;
                let mut form = TriggerOrderForm::new(kind, &self.registry);
                form.token_in = token_in;
                form.token_out = token_out;
                form.amount_in = amount;
                form.price = price;
                form.duration = duration;
                form.params()?;

                println!(
                    "{kind} order: sell {} {} for {} at {} {}/{}, expires in {}s",
                    form.amount_in,
                    form.token_in,
                    form.token_out,
                    form.price,
                    form.token_out,
                    form.token_in,
                    form.duration.seconds()
                );
                if !self.confirm(&format!("Create {kind} order")).await? {
                    println!("Cancelled");
                    return Ok(());
                }
                print_submit(&service.create(&form).await?);
            }
            TriggerCommand::List { account } => {
                let user = self.list_account(&session, account)?;
                let now = Utc::now();
                let orders = service.list(kind, user).await?;
                if orders.is_empty() {
                    println!("No active {kind} orders");
                }
                for order in orders {
                    let price = order.price.map(|p| p.normalize().to_string()).unwrap_or_default();
                    println!(
                        "#{:<5} {} {} -> {}  at {price}  min {} {}  expires {}",
                        order.id,
                        order.amount_in,
                        order.token_in,
                        order.token_out,
                        order.min_amount_out,
                        order.token_out,
                        format_expiry(order.expiry, now)
                    );
                }
            }
            TriggerCommand::Cancel { id } => {
                self.cancel(&format!("Cancel {kind} order #{id}"), service.cancel(kind, id))
                    .await?;
            }
        }
        Ok(())
    }

    fn list_account(&self, session: &Session, account: Option<Address>) -> Result<Address> {
        account
            .or_else(|| session.account())
            .context("No account: pass --account or set BASEFLOW_PRIVATE_KEY / BASEFLOW_ACCOUNT")
    }

    async fn cancel<F>(&self, action: &str, cancel: F) -> Result<()>
    where
        F: std::future::Future<Output = Result<TxOutcome, baseflow::errors::ExecutionError>>,
    {
        if !self.confirm(action).await? {
            println!("Cancelled");
            return Ok(());
        }
        print_outcome("cancel", &cancel.await?);
        Ok(())
    }
}

fn print_form(form: &SwapForm) {
    match &form.outcome {
        QuoteOutcome::Idle => println!("Enter an amount"),
        QuoteOutcome::Failed { message } => println!("Quote failed: {message}"),
        outcome => {
            println!(
                "{} {} -> {} {}",
                form.amount_in,
                form.token_in,
                form.amount_out,
                form.token_out
            );
            if let QuoteOutcome::Executable(quote) = outcome {
                println!("  {}", quote.quote.route_label());
                if let Some(usd) = quote.usd.amount_out_usd {
                    println!("  ~{}", format_usd(usd));
                }
                if let Some(gas) = quote.quote.gas_estimate {
                    println!("  gas ~{gas}");
                }
            }
            if let Some(summary) = form.summary() {
                println!(
                    "  rate {}  fee {} {}  min received {} {}",
                    summary.rate, summary.fee, form.token_in, summary.min_received, form.token_out
                );
            }
            if let Some(notice) = outcome.message() {
                println!("  {notice}");
            }
        }
    }
}

fn print_prepared(tx: &PreparedTx) {
    let value = if tx.value == U256::ZERO {
        String::new()
    } else {
        format!(" value {} ETH", units::format_amount(tx.value, 18))
    };
    println!("{}: to {}{value} ({} bytes)", tx.label, tx.to, tx.data.len());
}

fn print_outcome(label: &str, outcome: &TxOutcome) {
    match outcome.block_number {
        Some(block) => println!("{label} confirmed: {} (block {block})", outcome.hash),
        None => println!("{label} confirmed: {}", outcome.hash),
    }
}

fn print_submit(outcome: &SubmitOutcome) {
    match outcome {
        SubmitOutcome::ApprovalRequested(approval) => {
            print_outcome("approval", approval);
            println!("{APPROVAL_NOTICE}");
        }
        SubmitOutcome::Submitted(tx) => print_outcome("order", tx),
    }
}

