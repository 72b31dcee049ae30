mod format;

use std::path::PathBuf;

use alloy::primitives::Address;
use amm_data::pairs::load_pairs;
use amm_data::v2::{V2RpcSource, UNISWAP_V2_ROUTER};
use amm_data::v3::{V3RpcSource, UNISWAP_V3_QUOTER_V2, V3_WETH_USDC_POOL};
use amm_data::{BlockTag, RpcClient};
use amm_math::tolerance::{Tolerance, DEFAULT_RELATIVE_TOLERANCE};
use amm_math::v2::{pair_prices, ReservePair};
use amm_math::v3::{amount_delta, estimate_sqrt_price, sqrt_price_at_tick, Direction, Estimate, Token};
use amm_verify::{verify_v2_pairs, verify_v3_pool, V2Report, V3CheckConfig, V3Report};
use amm_verify::{DEFAULT_PPM_TOLERANCE, DEFAULT_TOKENS_TO_TEST};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, Context, Result};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use num_bigint::BigUint;
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use crate::format::{format_error_pct, format_units, short_address};

#[derive(Debug, Clone)]
struct AppContext {
    rpc_url: Option<String>,
}

impl AppContext {
    /// Client pinned to `block`, or to the current head when none is given,
    /// so reserves and reference prices are read from the same state.
    async fn rpc(&self, block: Option<u64>) -> Result<RpcClient> {
        let rpc_url = self
            .rpc_url
            .as_deref()
            .ok_or_else(|| eyre!("AMM_RPC_URL is required for this command"))?;
        let rpc = RpcClient::new(rpc_url, BlockTag::from(block))?.pinned().await?;
        tracing::info!(block = %rpc.block().as_param(), "reading chain state");
        Ok(rpc)
    }
}

#[derive(Parser, Debug)]
#[command(name = "amm-pricecheck")]
#[command(about = "Check off-chain Uniswap V2/V3 price formulas against on-chain references")]
#[command(version)]
struct Cli {
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify V2 buy/sell prices of every pair in a list against Router02.
    V2(V2Args),
    /// Verify single-tick V3 estimates of one pool against QuoterV2.
    V3(V3Args),
    /// Compute V2 buy/sell prices from reserves, offline.
    PriceV2(PriceV2Args),
    /// Run the V3 single-tick estimator on given values, offline.
    EstimateV3(EstimateV3Args),
    /// Compare a candidate value against a reference with a relative tolerance.
    Compare(CompareArgs),
}

#[derive(Args, Debug)]
struct V2Args {
    /// CSV with rows `token0,token1,pair,decimals0,decimals1`.
    #[arg(long, default_value = "data/pair-check.csv")]
    pairs: PathBuf,

    #[arg(long, default_value_t = UNISWAP_V2_ROUTER)]
    router: Address,

    /// Block number to read at (default: latest).
    #[arg(long)]
    block: Option<u64>,

    #[arg(long, default_value_t = DEFAULT_PPM_TOLERANCE)]
    tolerance_ppm: u64,

    /// Output format: table (default) or json.
    #[arg(long, default_value = "table")]
    output: String,
}

#[derive(Args, Debug)]
struct V3Args {
    #[arg(long, default_value_t = V3_WETH_USDC_POOL)]
    pool: Address,

    #[arg(long, default_value_t = UNISWAP_V3_QUOTER_V2)]
    quoter: Address,

    /// Trade size in whole token0.
    #[arg(long, default_value_t = DEFAULT_TOKENS_TO_TEST)]
    tokens: u64,

    /// Maximum relative error.
    #[arg(long, default_value_t = DEFAULT_RELATIVE_TOLERANCE)]
    tolerance: f64,

    /// Block number to read at (default: latest).
    #[arg(long)]
    block: Option<u64>,

    /// Output format: table (default) or json.
    #[arg(long, default_value = "table")]
    output: String,
}

#[derive(Args, Debug)]
struct PriceV2Args {
    /// Reserve of token0 in base units.
    #[arg(long)]
    reserve0: BigUint,

    /// Reserve of token1 in base units.
    #[arg(long)]
    reserve1: BigUint,

    /// Unit trade exponent: prices are for 10^decimals token0.
    #[arg(long, default_value_t = 0)]
    decimals: u32,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TokenArg {
    Token0,
    Token1,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DirectionArg {
    In,
    Out,
}

#[derive(Args, Debug)]
struct EstimateV3Args {
    /// Active liquidity.
    #[arg(long)]
    liquidity: f64,

    /// Current tick; √P is derived from it.
    #[arg(long, allow_hyphen_values = true)]
    tick: i32,

    /// Trade amount in base units.
    #[arg(long)]
    amount: f64,

    #[arg(long, value_enum, default_value = "token0")]
    token: TokenArg,

    #[arg(long, value_enum, default_value = "in")]
    direction: DirectionArg,
}

#[derive(Args, Debug)]
struct CompareArgs {
    #[arg(long, allow_hyphen_values = true)]
    reference: f64,

    #[arg(long, allow_hyphen_values = true)]
    candidate: f64,

    #[arg(long, default_value_t = DEFAULT_RELATIVE_TOLERANCE)]
    tolerance: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet)?;

    let ctx = AppContext {
        rpc_url: std::env::var("AMM_RPC_URL").ok(),
    };

    match cli.command {
        Commands::V2(args) => handle_v2(&ctx, args).await,
        Commands::V3(args) => handle_v3(&ctx, args).await,
        Commands::PriceV2(args) => handle_price_v2(args),
        Commands::EstimateV3(args) => handle_estimate_v3(args),
        Commands::Compare(args) => handle_compare(args),
    }
}

fn init_tracing(verbose: u8, quiet: bool) -> Result<()> {
    let level = if quiet {
        Level::WARN
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_str()))
        .wrap_err("failed to initialize tracing filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .wrap_err("failed to create progress style")?,
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(pb)
}

async fn handle_v2(ctx: &AppContext, args: V2Args) -> Result<()> {
    let pairs = load_pairs(&args.pairs)?;
    let source = V2RpcSource::new(ctx.rpc(args.block).await?, args.router);

    let pb = spinner("reading reserves and router prices")?;
    let report = verify_v2_pairs(&pairs, &source, &source, args.tolerance_ppm).await;
    pb.finish_and_clear();
    let report = report.wrap_err("V2 verification failed")?;

    let decimals1: Vec<u8> = pairs.iter().map(|p| p.decimals1).collect();
    match args.output.to_lowercase().as_str() {
        "table" => print_v2_table(&report, &decimals1),
        "json" => print_v2_json(&report)?,
        _ => {
            return Err(eyre!(
                "unknown output format '{}'; use 'table' or 'json'",
                args.output
            ))
        }
    }

    info!(
        pairs = report.checks.len(),
        passed = report.passed(),
        failed = report.failed(),
        "v2 command completed"
    );

    if !report.all_passed() {
        return Err(eyre!(
            "{} of {} pairs outside {} ppm",
            report.failed(),
            report.checks.len(),
            report.tolerance_ppm
        ));
    }
    Ok(())
}

fn status(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "MISMATCH"
    }
}

fn print_v2_table(report: &V2Report, decimals1: &[u8]) {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec![
        "Pair",
        "Buy (est)",
        "Buy (router)",
        "Sell (est)",
        "Sell (router)",
        "Status",
    ]);

    for (check, decimals) in report.checks.iter().zip(decimals1) {
        table.add_row(vec![
            short_address(&check.pair),
            format_units(&check.estimate.buy_price, *decimals),
            format_units(&check.reference.buy_price, *decimals),
            format_units(&check.estimate.sell_price, *decimals),
            format_units(&check.reference.sell_price, *decimals),
            status(check.passed()).to_string(),
        ]);
    }

    println!("\n{table}\n");
    println!(
        "Summary: {} passed, {} failed (tolerance {} ppm)\n",
        report.passed(),
        report.failed(),
        report.tolerance_ppm
    );
}

fn print_v2_json(report: &V2Report) -> Result<()> {
    #[derive(Serialize)]
    struct JsonOutput {
        tolerance_ppm: u64,
        passed: usize,
        failed: usize,
        pairs: Vec<JsonPair>,
    }

    #[derive(Serialize)]
    struct JsonPair {
        pair: String,
        buy_estimate: String,
        buy_reference: String,
        sell_estimate: String,
        sell_reference: String,
        buy_ok: bool,
        sell_ok: bool,
    }

    let pairs = report
        .checks
        .iter()
        .map(|check| JsonPair {
            pair: format!("{:#x}", check.pair),
            buy_estimate: check.estimate.buy_price.to_string(),
            buy_reference: check.reference.buy_price.to_string(),
            sell_estimate: check.estimate.sell_price.to_string(),
            sell_reference: check.reference.sell_price.to_string(),
            buy_ok: check.buy_ok,
            sell_ok: check.sell_ok,
        })
        .collect();

    let output = JsonOutput {
        tolerance_ppm: report.tolerance_ppm,
        passed: report.passed(),
        failed: report.failed(),
        pairs,
    };
    let json = serde_json::to_string_pretty(&output).wrap_err("failed to serialize JSON")?;
    println!("{json}");
    Ok(())
}

async fn handle_v3(ctx: &AppContext, args: V3Args) -> Result<()> {
    let config = V3CheckConfig {
        tokens: args.tokens,
        tolerance: Tolerance::new(args.tolerance)?,
    };
    let source = V3RpcSource::new(ctx.rpc(args.block).await?, args.quoter);

    let pb = spinner("reading pool state and quotes")?;
    let report = verify_v3_pool(args.pool, &source, &source, config).await;
    pb.finish_and_clear();
    let report = report.wrap_err("V3 verification failed")?;

    match args.output.to_lowercase().as_str() {
        "table" => print_v3_table(&report),
        "json" => print_v3_json(&report)?,
        _ => {
            return Err(eyre!(
                "unknown output format '{}'; use 'table' or 'json'",
                args.output
            ))
        }
    }

    info!(pool = %args.pool, passed = report.all_passed(), "v3 command completed");

    if !report.all_passed() {
        return Err(eyre!(
            "V3 estimates outside relative tolerance {}",
            args.tolerance
        ));
    }
    Ok(())
}

fn print_v3_table(report: &V3Report) {
    let state = &report.state;

    let mut pool = Table::new();
    pool.load_preset(UTF8_BORDERS_ONLY);
    pool.set_header(vec!["Pool", "Value"]);
    pool.add_row(vec!["Address".to_string(), format!("{:#x}", state.pool)]);
    pool.add_row(vec!["Fee (pips)".to_string(), state.fee.to_string()]);
    pool.add_row(vec!["Tick".to_string(), state.tick.to_string()]);
    pool.add_row(vec!["Liquidity".to_string(), state.liquidity.to_string()]);
    pool.add_row(vec![
        "Spot price (token1 per token0)".to_string(),
        format!("{:.8}", state.spot_price()),
    ]);
    pool.add_row(vec!["Trade (token0 base units)".to_string(), report.amount.to_string()]);
    println!("\n{pool}\n");

    let mut checks = Table::new();
    checks.load_preset(UTF8_BORDERS_ONLY);
    checks.set_header(vec!["Quote", "Estimate", "Quoter", "Rel. error", "Status"]);
    for (name, check) in [
        ("Exact input (token1 out)", &report.exact_input),
        ("Exact output (token1 in)", &report.exact_output),
    ] {
        checks.add_row(vec![
            name.to_string(),
            format!("{:.0}", check.estimate),
            check.quoted.to_string(),
            format_error_pct(check.comparison.relative_error),
            status(check.comparison.acceptable).to_string(),
        ]);
    }
    println!("{checks}\n");
}

fn print_v3_json(report: &V3Report) -> Result<()> {
    #[derive(Serialize)]
    struct JsonOutput {
        pool: String,
        fee: u32,
        tick: i32,
        liquidity: String,
        amount: String,
        exact_input: JsonCheck,
        exact_output: JsonCheck,
    }

    #[derive(Serialize)]
    struct JsonCheck {
        estimate: f64,
        quoted: String,
        relative_error: f64,
        acceptable: bool,
    }

    let check = |c: &amm_verify::QuoteCheck| JsonCheck {
        estimate: c.estimate,
        quoted: c.quoted.to_string(),
        relative_error: c.comparison.relative_error,
        acceptable: c.comparison.acceptable,
    };

    let output = JsonOutput {
        pool: format!("{:#x}", report.state.pool),
        fee: report.state.fee,
        tick: report.state.tick,
        liquidity: report.state.liquidity.to_string(),
        amount: report.amount.to_string(),
        exact_input: check(&report.exact_input),
        exact_output: check(&report.exact_output),
    };
    let json = serde_json::to_string_pretty(&output).wrap_err("failed to serialize JSON")?;
    println!("{json}");
    Ok(())
}

fn handle_price_v2(args: PriceV2Args) -> Result<()> {
    let reserves = ReservePair::new(args.reserve0, args.reserve1);
    let prices = pair_prices(&reserves, args.decimals)?;

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Price", "token1 base units"]);
    let buy = if prices.buy_price == BigUint::default() {
        "infeasible (0)".to_string()
    } else {
        prices.buy_price.to_string()
    };
    table.add_row(vec![format!("Buy 10^{}", args.decimals), buy]);
    table.add_row(vec![
        format!("Sell 10^{}", args.decimals),
        prices.sell_price.to_string(),
    ]);
    println!("\n{table}\n");
    Ok(())
}

fn handle_estimate_v3(args: EstimateV3Args) -> Result<()> {
    let token = match args.token {
        TokenArg::Token0 => Token::Token0,
        TokenArg::Token1 => Token::Token1,
    };
    let direction = match args.direction {
        DirectionArg::In => Direction::In,
        DirectionArg::Out => Direction::Out,
    };

    let sqrt_price = sqrt_price_at_tick(args.tick);
    let estimate = estimate_sqrt_price(args.liquidity, sqrt_price, args.amount, token, direction);

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["√P before".to_string(), format!("{sqrt_price:.12}")]);

    match estimate {
        Estimate::Value(new_sqrt_price) => {
            // token1 moves the other way.
            let token1_direction = match direction {
                Direction::In => Direction::Out,
                Direction::Out => Direction::In,
            };
            let token1 = amount_delta(
                sqrt_price,
                new_sqrt_price,
                args.liquidity,
                Token::Token1,
                token1_direction,
            )
            .into_result("token1 amount")?;

            table.add_row(vec!["√P after".to_string(), format!("{new_sqrt_price:.12}")]);
            table.add_row(vec![
                format!("token1 {}", if token1_direction == Direction::In { "in" } else { "out" }),
                format!("{token1:.0}"),
            ]);
        }
        Estimate::Unsupported => {
            table.add_row(vec!["√P after".to_string(), "unsupported".to_string()]);
        }
        Estimate::Exhausted => {
            table.add_row(vec![
                "√P after".to_string(),
                "trade exhausts active liquidity".to_string(),
            ]);
        }
    }

    println!("\n{table}\n");
    Ok(())
}

fn handle_compare(args: CompareArgs) -> Result<()> {
    let tolerance = Tolerance::new(args.tolerance)?;
    let comparison = tolerance.compare(args.reference, args.candidate);

    println!(
        "{} (relative error {}, tolerance {})",
        if comparison.acceptable { "acceptable" } else { "outside tolerance" },
        format_error_pct(comparison.relative_error),
        format_error_pct(tolerance.max_relative_error()),
    );

    if !comparison.acceptable {
        return Err(eyre!(
            "{} is not within {} of {}",
            args.candidate,
            args.tolerance,
            args.reference
        ));
    }
    Ok(())
}
