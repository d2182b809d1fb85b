//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_export;
use crate::adapters::csv_series_adapter::CsvSeriesAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::weekday_calendar::WeekdayCalendar;
use crate::domain::error::AipsimError;
use crate::domain::schedule;
use crate::domain::simulate;
use crate::domain::sweep::{self, SweepResult};
use crate::ports::calendar_port::CalendarPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::series_port::SeriesPort;

#[derive(Parser, Debug)]
#[command(name = "aipsim", about = "Recurring-investment backtester for funds")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sweep weekly-plan returns across a start-date interval
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: String,
        /// Interval start (YYYY-MM-DD); derived from --before-days when absent
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Interval end (YYYY-MM-DD); start + size when absent
        #[arg(long)]
        start_to: Option<NaiveDate>,
        /// Sell date (YYYY-MM-DD); nearest trading day before today when absent
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(short, long)]
        parallelism: Option<usize>,
        /// Write the result table as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Persist the result table to the database
        #[arg(long)]
        save: bool,
    },
    /// Run a single weekly or monthly simulation
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(long)]
        amount: Option<f64>,
        /// Monthly plan instead of weekly
        #[arg(long)]
        monthly: bool,
        /// Comma-separated day-of-month labels for --monthly
        #[arg(long)]
        days: Option<String>,
    },
    /// Import CSV net-value files into the database
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        dir: PathBuf,
        /// Restrict the import to one fund code
        #[arg(long)]
        code: Option<String>,
    },
    /// Show depository funds
    Funds {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        field: Option<String>,
    },
    /// Show stored net-value range for fund(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Sweep {
            config,
            code,
            start,
            start_to,
            end,
            amount,
            parallelism,
            output,
            save,
        } => run_sweep(
            &config,
            &code,
            start,
            start_to,
            end,
            amount,
            parallelism,
            output.as_ref(),
            save,
        ),
        Command::Simulate {
            config,
            code,
            start,
            end,
            amount,
            monthly,
            days,
        } => run_simulate(&config, &code, start, end, amount, monthly, days.as_deref()),
        Command::Import { config, dir, code } => run_import(&config, &dir, code.as_deref()),
        Command::Funds {
            config,
            code,
            field,
        } => run_funds(&config, code.as_deref(), field.as_deref()),
        Command::Info { config, code } => run_info(&config, code.as_deref()),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = AipsimError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Series source selection: a `[data] csv_dir` key reads CSV files,
/// otherwise the SQLite store is used.
fn open_series_port(config: &dyn ConfigPort) -> Result<Box<dyn SeriesPort>, AipsimError> {
    if let Some(dir) = config.get_string("data", "csv_dir") {
        return Ok(Box::new(CsvSeriesAdapter::new(PathBuf::from(dir))));
    }

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;
        let adapter = SqliteAdapter::from_config(config)?;
        adapter.initialize_schema()?;
        Ok(Box::new(adapter))
    }

    #[cfg(not(feature = "sqlite"))]
    Err(AipsimError::ConfigMissing {
        section: "data".into(),
        key: "csv_dir".into(),
    })
}

/// Depository name lookup is display-only; a missing row falls back to
/// the bare code.
fn display_name(config: &dyn ConfigPort, code: &str) -> String {
    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;
        use crate::ports::depository_port::DepositoryPort;
        if let Ok(adapter) = SqliteAdapter::from_config(config) {
            if adapter.initialize_schema().is_ok() {
                if let Ok(fund) = adapter.get_fund(code) {
                    return format!("{} {}", fund.name, code);
                }
            }
        }
    }
    let _ = config;
    code.to_string()
}

#[allow(clippy::too_many_arguments)]
fn run_sweep(
    config_path: &PathBuf,
    code: &str,
    start: Option<NaiveDate>,
    start_to: Option<NaiveDate>,
    end: Option<NaiveDate>,
    amount: Option<f64>,
    parallelism: Option<usize>,
    output: Option<&PathBuf>,
    save: bool,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(exit) => return exit,
    };

    let amount = amount.unwrap_or_else(|| config.get_double("sweep", "amount", 100.0));
    let parallelism =
        parallelism.unwrap_or_else(|| config.get_int("sweep", "parallelism", 1).max(1) as usize);
    let size = config.get_int("sweep", "size", 30);
    let before_days = config.get_int("sweep", "before_days", 180);

    let calendar = WeekdayCalendar;
    let today = Local::now().date_naive();
    let end = end.unwrap_or_else(|| calendar.nearest_trading_day(today));

    let series_port = match open_series_port(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let series = match series_port.get_series(code) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if series.is_empty() {
        eprintln!("error: no net-value history for {code}");
        return ExitCode::from(5);
    }

    let interval = match start {
        Some(a) => {
            let b = start_to.unwrap_or(a + chrono::Duration::days(size));
            (a, b)
        }
        None => schedule::start_interval_ending(today, before_days, size),
    };

    eprintln!(
        "Sweeping {} from {} to {}, selling {}, {} per purchase",
        display_name(&config, code),
        interval.0,
        interval.1,
        end,
        amount
    );

    let result = match sweep::sweep(&series, &calendar, interval, end, amount, parallelism) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    print_sweep_summary(&result);

    if let Some(path) = output {
        if let Err(e) = csv_export::write_sweep_file(path, &result) {
            eprintln!("error: failed to write {}: {e}", path.display());
            return (&e).into();
        }
        eprintln!("Result table written to {}", path.display());
    }

    if save {
        #[cfg(feature = "sqlite")]
        {
            use crate::adapters::sqlite_adapter::SqliteAdapter;
            let adapter = match SqliteAdapter::from_config(&config) {
                Ok(a) => a,
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            };
            if let Err(e) = adapter.save_sweep(code, &result) {
                eprintln!("error: {e}");
                return (&e).into();
            }
            eprintln!("Result table saved as bt_{code}");
        }

        #[cfg(not(feature = "sqlite"))]
        {
            eprintln!("error: sqlite feature is required for --save");
            return ExitCode::from(1);
        }
    }

    ExitCode::SUCCESS
}

fn print_sweep_summary(result: &SweepResult) {
    if result.is_empty() {
        eprintln!("No rows computed");
        return;
    }

    let starts: Vec<NaiveDate> = {
        let mut s: Vec<NaiveDate> = result.rows.iter().map(|r| r.start).collect();
        s.dedup();
        s
    };
    eprintln!(
        "{} rows across {} start dates",
        result.len(),
        starts.len()
    );

    for row in &result.rows {
        println!(
            "{}  weekday {}  {:>8.2}%",
            row.start,
            row.weekday,
            row.profit_rate * 100.0
        );
    }
}

fn run_simulate(
    config_path: &PathBuf,
    code: &str,
    start: NaiveDate,
    end: NaiveDate,
    amount: Option<f64>,
    monthly: bool,
    days: Option<&str>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(exit) => return exit,
    };
    let amount = amount.unwrap_or_else(|| config.get_double("sweep", "amount", 100.0));

    let calendar = WeekdayCalendar;
    if !calendar.is_trading_day(start) {
        let err = AipsimError::InvalidStartDate { date: start };
        eprintln!("error: {err}");
        return (&err).into();
    }
    if !calendar.is_trading_day(end) {
        let err = AipsimError::InvalidEndDate { date: end };
        eprintln!("error: {err}");
        return (&err).into();
    }

    let series_port = match open_series_port(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let series = match series_port.get_series(code) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "Simulating {} from {start} to {end}, {amount} per purchase",
        display_name(&config, code)
    );

    if monthly {
        let labels: Vec<String> = match days {
            Some(list) => list.split(',').map(|s| s.trim().to_string()).collect(),
            None => schedule::DEFAULT_MONTHLY_DAYS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };
        let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();

        let results =
            match simulate::simulate_monthly(&series, start, end, amount, &label_refs) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            };

        for (label, r) in &results {
            println!(
                "day {label}: invested {:.2}, proceeds {:.2}, return {:.2}%",
                r.cost,
                r.cost * (1.0 + r.profit_rate),
                r.profit_rate * 100.0
            );
        }
    } else {
        let results = match simulate::simulate_weekly(&series, start, end, amount) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        for r in &results {
            println!(
                "weekday {}: invested {:.2}, proceeds {:.2}, return {:.2}%",
                r.weekday,
                r.cost,
                r.cost * (1.0 + r.profit_rate),
                r.profit_rate * 100.0
            );
        }
    }

    ExitCode::SUCCESS
}

fn run_import(config_path: &PathBuf, dir: &PathBuf, code: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(exit) => return exit,
    };

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;

        let source = CsvSeriesAdapter::new(dir.clone());
        let codes = match code {
            Some(c) => vec![c.to_string()],
            None => match source.list_codes() {
                Ok(codes) => codes,
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            },
        };

        let sink = match SqliteAdapter::from_config(&config) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        if let Err(e) = sink.initialize_schema() {
            eprintln!("error: {e}");
            return (&e).into();
        }

        let mut imported = 0usize;
        for code in &codes {
            let series = match source.get_series(code) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("warning: skipping {code} ({e})");
                    continue;
                }
            };
            if let Err(e) = sink.insert_points(code, &series.points) {
                eprintln!("error: {e}");
                return (&e).into();
            }
            eprintln!("  {}: {} points [OK]", code, series.len());
            imported += 1;
        }

        eprintln!("Imported {imported} of {} funds", codes.len());
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config, dir, code);
        eprintln!("error: sqlite feature is required for import");
        ExitCode::from(1)
    }
}

fn run_funds(config_path: &PathBuf, code: Option<&str>, field: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(exit) => return exit,
    };

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;
        use crate::ports::depository_port::DepositoryPort;

        let adapter = match SqliteAdapter::from_config(&config) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        if let Err(e) = adapter.initialize_schema() {
            eprintln!("error: {e}");
            return (&e).into();
        }

        if let Some(code) = code {
            let fund = match adapter.get_fund(code) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            };
            for (label, value) in fund.display_fields() {
                println!("{label:>12}: {value}");
            }
            return ExitCode::SUCCESS;
        }

        let funds = match field {
            Some(f) => adapter.list_by_field(f),
            None => adapter.list_holding(),
        };
        let funds = match funds {
            Ok(f) => f,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        if funds.is_empty() {
            eprintln!("No funds found");
        } else {
            for f in &funds {
                println!(
                    "{}  {:<24} {:<12} position {:>10.2}  profit {:>8.2} ({:.2}%)",
                    f.code,
                    f.name,
                    f.field,
                    f.position,
                    f.profit,
                    f.profit_rate * 100.0
                );
            }
            eprintln!("{} funds", funds.len());
        }
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config, code, field);
        eprintln!("error: sqlite feature is required for funds");
        ExitCode::from(1)
    }
}

fn run_info(config_path: &PathBuf, code: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(exit) => return exit,
    };

    let series_port = match open_series_port(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let codes = match code {
        Some(c) => vec![c.to_string()],
        None => match series_port.list_codes() {
            Ok(codes) => codes,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        },
    };

    for c in &codes {
        match series_port.get_data_range(c) {
            Ok(Some((first, last, count))) => {
                println!("{c}: {count} points, {first} to {last}");
            }
            Ok(None) => {
                eprintln!("{c}: no data found");
            }
            Err(e) => {
                eprintln!("error querying {c}: {e}");
            }
        }
    }
    ExitCode::SUCCESS
}
