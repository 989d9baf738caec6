//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::validate_strategy_config;
use crate::domain::error::DipscanError;
use crate::domain::scoring::StrategyConfig;
use crate::ports::config_port::ConfigPort;

#[derive(Parser, Debug)]
#[command(name = "dipscan", about = "Dip-buying market scanner and paper trader")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create database tables
    InitDb {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Import OHLCV history from CSV files
    Import {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory of {TICKER}.csv files
        #[arg(short, long)]
        data_dir: PathBuf,
    },
    /// Scan the universe and record signals
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        /// Scan a single ticker instead of the configured universe
        #[arg(long)]
        ticker: Option<String>,
    },
    /// Show most recent signals
    Signals {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Open a paper position
    Open {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: String,
        #[arg(long)]
        quantity: i64,
        /// Entry price; defaults to the latest stored close
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        stop_loss: Option<f64>,
        #[arg(long)]
        target: Option<f64>,
        /// Exclude from the auto-exit sweep
        #[arg(long)]
        no_auto_exit: bool,
    },
    /// List open positions
    Positions {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Run one auto-exit sweep over open positions
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Manually close a position at a given price
    Sell {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        id: i64,
        #[arg(long)]
        price: f64,
    },
    /// Validate a strategy configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::InitDb { config } => run_init_db(&config),
        Command::Import { config, data_dir } => run_import(&config, &data_dir),
        Command::Scan { config, ticker } => run_scan_cmd(&config, ticker.as_deref()),
        Command::Signals { config, limit } => run_signals(&config, limit),
        Command::Open {
            config,
            ticker,
            quantity,
            price,
            stop_loss,
            target,
            no_auto_exit,
        } => run_open(
            &config,
            &ticker,
            quantity,
            price,
            stop_loss,
            target,
            !no_auto_exit,
        ),
        Command::Positions { config } => run_positions(&config),
        Command::Sweep { config } => run_sweep_cmd(&config),
        Command::Sell { config, id, price } => run_sell(&config, id, price),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = DipscanError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Ticker universe: `--ticker` override, then `[scan] tickers` from config,
/// then everything present in the database.
pub fn resolve_tickers(
    ticker_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Option<Vec<String>> {
    if let Some(t) = ticker_override {
        return Some(vec![t.to_uppercase()]);
    }

    if let Some(tickers_str) = config.get_string("scan", "tickers") {
        let tickers: Vec<String> = tickers_str
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        if !tickers.is_empty() {
            return Some(tickers);
        }
    }

    None
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let strategy = StrategyConfig::from_config(&adapter);
    if let Err(e) = validate_strategy_config(&strategy) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    eprintln!("Strategy configuration is valid.");
    eprintln!("  rsi_oversold:         {}", fmt_opt(strategy.rsi_oversold));
    eprintln!("  rsi_overbought:       {}", fmt_opt(strategy.rsi_overbought));
    eprintln!(
        "  rsi_confirm_span:     {}",
        fmt_opt(strategy.rsi_confirm_span)
    );
    eprintln!(
        "  ha_confirm_count:     {}",
        fmt_opt(strategy.ha_confirm_count)
    );
    eprintln!(
        "  volume_multiplier:    {}",
        fmt_opt(strategy.volume_multiplier)
    );
    eprintln!(
        "  max_below_sma200_pct: {}",
        fmt_opt(strategy.max_below_sma200_pct)
    );
    eprintln!("  primary_window:       {}", strategy.primary_window);
    eprintln!("  confirm_window:       {}", strategy.confirm_window);
    ExitCode::SUCCESS
}

fn fmt_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "off".to_string(),
    }
}

fn run_init_db(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;

        let db = match SqliteAdapter::from_config(&config) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        if let Err(e) = db.initialize_schema() {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("Database initialized.");
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = config;
        eprintln!("error: sqlite feature is required for init-db");
        ExitCode::from(1)
    }
}

fn run_import(config_path: &PathBuf, data_dir: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::csv_adapter::CsvAdapter;
        use crate::adapters::sqlite_adapter::SqliteAdapter;
        use crate::ports::data_port::DataPort;

        let db = match SqliteAdapter::from_config(&config) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        if let Err(e) = db.initialize_schema() {
            eprintln!("error: {e}");
            return (&e).into();
        }

        let csv = CsvAdapter::new(data_dir.clone());
        let tickers = match csv.list_tickers() {
            Ok(t) => t,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        if tickers.is_empty() {
            eprintln!("error: no CSV files found in {}", data_dir.display());
            return ExitCode::from(4);
        }

        let mut imported = 0usize;
        for ticker in &tickers {
            let bars = match csv.fetch_bars(ticker) {
                Ok(b) => b,
                Err(e) => {
                    eprintln!("warning: skipping {} ({})", ticker, e);
                    continue;
                }
            };
            if let Err(e) = db.upsert_bars(&bars) {
                eprintln!("warning: skipping {} ({})", ticker, e);
                continue;
            }
            eprintln!("  {}: {} bars", ticker, bars.len());
            imported += 1;
        }

        eprintln!("Imported {} of {} tickers", imported, tickers.len());
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config, data_dir);
        eprintln!("error: sqlite feature is required for import");
        ExitCode::from(1)
    }
}

fn run_scan_cmd(config_path: &PathBuf, ticker_override: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let strategy = StrategyConfig::from_config(&config);
    if let Err(e) = validate_strategy_config(&strategy) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;
        use crate::domain::scan::{run_scan, ScanHandle, ScanState};
        use crate::ports::data_port::DataPort;

        let db = match SqliteAdapter::from_config(&config) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let tickers = match resolve_tickers(ticker_override, &config) {
            Some(t) => t,
            None => match db.list_tickers() {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            },
        };
        if tickers.is_empty() {
            eprintln!("error: no tickers to scan");
            return ExitCode::from(5);
        }

        let handle = ScanHandle::new();
        let actionable = run_scan(&db, &db, &strategy, &tickers, &handle, chrono::Utc::now());

        if let ScanState::Completed(report) = handle.state() {
            eprintln!(
                "Scan complete: {} scanned, {} signals, {} skipped",
                report.scanned, report.signals, report.skipped
            );
        }

        for signal in &actionable {
            println!(
                "{}  {}  score {}  ({})",
                signal.ticker, signal.direction, signal.score, signal.confidence
            );
            for reason in &signal.reasons {
                println!("    - {}", reason);
            }
        }
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config, strategy, ticker_override);
        eprintln!("error: sqlite feature is required for scan");
        ExitCode::from(1)
    }
}

fn run_signals(config_path: &PathBuf, limit: usize) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;

        let db = match SqliteAdapter::from_config(&config) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let signals = match db.recent_signals(limit) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        if signals.is_empty() {
            eprintln!("No signals recorded.");
            return ExitCode::SUCCESS;
        }

        for signal in &signals {
            println!(
                "{}  {}  {}  score {}  ({})",
                signal.generated_at.format("%Y-%m-%d %H:%M"),
                signal.ticker,
                signal.direction,
                signal.score,
                signal.confidence
            );
        }
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config, limit);
        eprintln!("error: sqlite feature is required for signals");
        ExitCode::from(1)
    }
}

#[allow(clippy::too_many_arguments)]
fn run_open(
    config_path: &PathBuf,
    ticker: &str,
    quantity: i64,
    price: Option<f64>,
    stop_loss: Option<f64>,
    target: Option<f64>,
    auto_exit: bool,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if quantity <= 0 {
        eprintln!("error: quantity must be positive");
        return ExitCode::from(5);
    }

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;
        use crate::domain::position::Position;
        use crate::ports::position_store::PositionStore;
        use crate::ports::price_port::PricePort;

        let db = match SqliteAdapter::from_config(&config) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let ticker = ticker.to_uppercase();
        let entry_price = match price {
            Some(p) => p,
            None => match db.current_price(&ticker) {
                Ok(Some(p)) => p,
                Ok(None) => {
                    let e = DipscanError::NoData {
                        ticker: ticker.clone(),
                    };
                    eprintln!("error: {e}");
                    return (&e).into();
                }
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            },
        };

        let position = Position::open(
            &ticker,
            None,
            entry_price,
            quantity,
            stop_loss,
            target,
            auto_exit,
            chrono::Utc::now(),
        );
        match db.insert_position(&position) {
            Ok(id) => {
                eprintln!(
                    "Opened position {} for {}: {} @ {:.2}",
                    id, ticker, quantity, entry_price
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                (&e).into()
            }
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config, ticker, quantity, price, stop_loss, target, auto_exit);
        eprintln!("error: sqlite feature is required for open");
        ExitCode::from(1)
    }
}

fn run_positions(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;
        use crate::ports::position_store::PositionStore;

        let db = match SqliteAdapter::from_config(&config) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let positions = match db.open_positions(false) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        if positions.is_empty() {
            eprintln!("No open positions.");
            return ExitCode::SUCCESS;
        }

        for p in &positions {
            println!(
                "#{}  {}  {} @ {:.2}  stop {}  target {}  auto-exit {}",
                p.id,
                p.ticker,
                p.quantity,
                p.entry_price,
                fmt_opt(p.stop_loss),
                fmt_opt(p.target_price),
                if p.auto_exit { "on" } else { "off" },
            );
        }
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = config;
        eprintln!("error: sqlite feature is required for positions");
        ExitCode::from(1)
    }
}

fn run_sweep_cmd(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;
        use crate::domain::sweep::run_sweep;

        let db = match SqliteAdapter::from_config(&config) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        match run_sweep(&db, &db, chrono::Utc::now()) {
            Ok(report) => {
                eprintln!(
                    "Sweep complete: {} checked, {} exited, {} skipped",
                    report.checked, report.exited, report.skipped
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                (&e).into()
            }
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = config;
        eprintln!("error: sqlite feature is required for sweep");
        ExitCode::from(1)
    }
}

fn run_sell(config_path: &PathBuf, id: i64, price: f64) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;
        use crate::domain::sweep::manual_exit;
        use crate::ports::position_store::PositionStore;

        let db = match SqliteAdapter::from_config(&config) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        match manual_exit(&db, id, price, chrono::Utc::now()) {
            Ok(true) => {
                if let Ok(Some(p)) = db.get_position(id) {
                    eprintln!(
                        "Closed position {}: pnl {:.2} ({:.2}%)",
                        id,
                        p.pnl.unwrap_or(0.0),
                        p.pnl_percent.unwrap_or(0.0)
                    );
                } else {
                    eprintln!("Closed position {}", id);
                }
                ExitCode::SUCCESS
            }
            Ok(false) => {
                eprintln!("Position {} is already closed.", id);
                ExitCode::from(5)
            }
            Err(e) => {
                eprintln!("error: {e}");
                (&e).into()
            }
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config, id, price);
        eprintln!("error: sqlite feature is required for sell");
        ExitCode::from(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    #[test]
    fn ticker_override_wins() {
        let config = FileConfigAdapter::from_string("[scan]\ntickers = INFY, TCS\n").unwrap();
        assert_eq!(
            resolve_tickers(Some("hdfc"), &config),
            Some(vec!["HDFC".to_string()])
        );
    }

    #[test]
    fn config_tickers_parsed_and_uppercased() {
        let config = FileConfigAdapter::from_string("[scan]\ntickers = infy, tcs, ,\n").unwrap();
        assert_eq!(
            resolve_tickers(None, &config),
            Some(vec!["INFY".to_string(), "TCS".to_string()])
        );
    }

    #[test]
    fn no_tickers_falls_through_to_database() {
        let config = FileConfigAdapter::from_string("[scan]\n").unwrap();
        assert_eq!(resolve_tickers(None, &config), None);
    }
}
