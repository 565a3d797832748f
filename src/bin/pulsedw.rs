use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};

use pulsedw::{
    AnalyticsConfig, DirectoryQuery, GroupBy, LeaderboardEntry, PeriodToken, PulseDW,
    RollupFilter, SortDirection, SortKey, PODIUM_SIZE,
};

#[derive(Parser)]
#[command(name = "pulsedw", about = "Pulse-survey analytics CLI")]
struct Cli {
    /// Database path (default: ~/.pulsedw/pulsedw.db)
    #[arg(long)]
    db: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show row counts for the store
    Status,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Work with period tokens
    Period {
        #[command(subcommand)]
        action: PeriodAction,
    },
    /// Satisfaction and participation per group and period
    Rollup {
        /// department or project
        #[arg(long, default_value = "department")]
        by: String,
        /// Period token (e.g. Jan-2026)
        #[arg(long)]
        period: Option<String>,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        json: bool,
    },
    /// Compare each group between two periods
    Trend {
        #[arg(long, default_value = "department")]
        by: String,
        /// Period to report (default: current month)
        #[arg(long)]
        current: Option<String>,
        /// Period to compare against (default: the month before --current)
        #[arg(long)]
        compare: Option<String>,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        json: bool,
    },
    /// Monthly series ending at a period
    Series {
        /// Last period of the series (default: current month)
        #[arg(long)]
        end: Option<String>,
        /// Number of months (default: trend_months config, 6)
        #[arg(long)]
        months: Option<u32>,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        json: bool,
    },
    /// Burnout alerts from falling sentiment
    Risk {
        /// Check a single person by id
        #[arg(long, conflicts_with_all = ["dept", "project", "manager"])]
        person: Option<String>,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        json: bool,
    },
    /// Manager task follow-through
    Accountability {
        /// Evaluate overdue tasks as of this date (YYYY-MM-DD, default: today)
        #[arg(long)]
        today: Option<String>,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        json: bool,
    },
    /// Most recognised people
    Leaderboard {
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long)]
        json: bool,
    },
    /// People giving the most named recognition
    Givers {
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long)]
        json: bool,
    },
    /// Per-employee performance directory
    Directory {
        /// Case-insensitive search over name, email, department and project
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        dept: Option<String>,
        /// employee or manager
        #[arg(long)]
        role: Option<String>,
        /// name, sentiment, satisfaction, submission_count, workload,
        /// work_life_balance or pending_actions
        #[arg(long, default_value = "name")]
        sort: String,
        /// asc or desc
        #[arg(long, default_value = "asc")]
        direction: String,
        /// Restrict survey aggregates to one period
        #[arg(long)]
        period: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

#[derive(Subcommand)]
enum PeriodAction {
    /// The N periods ending at TOKEN, oldest first
    Last { token: String, n: u32 },
}

#[derive(Args)]
struct FilterArgs {
    /// Department code
    #[arg(long)]
    dept: Option<String>,
    /// Project code
    #[arg(long)]
    project: Option<String>,
    /// Manager email; keeps only their direct reports
    #[arg(long)]
    manager: Option<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> RollupFilter {
        let mut filter = RollupFilter::new();
        if let Some(ref dept) = self.dept {
            filter = filter.department(dept);
        }
        if let Some(ref project) = self.project {
            filter = filter.project(project);
        }
        if let Some(ref manager) = self.manager {
            filter = filter.manager(manager);
        }
        filter
    }
}

#[derive(Args)]
struct WindowArgs {
    /// Window start (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,
    /// Window end (YYYY-MM-DD, default: today)
    #[arg(long)]
    to: Option<String>,
    /// Window length in days when --from is omitted (default: leaderboard_days config, 30)
    #[arg(long)]
    days: Option<u32>,
    /// Ranks to show
    #[arg(long, default_value_t = PODIUM_SIZE)]
    podium: u32,
}

fn parse_date_arg(flag: &str, value: &str) -> anyhow::Result<NaiveDate> {
    pulsedw::date_util::parse_date(value)
        .ok_or_else(|| anyhow::anyhow!("--{flag} must be YYYY-MM-DD, got '{value}'"))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn period_or_current(token: Option<&str>) -> anyhow::Result<PeriodToken> {
    Ok(match token {
        Some(t) => PeriodToken::parse(t)?,
        None => PeriodToken::current()?,
    })
}

/// Sentiment is stored on a 0-1 scale and shown on 0-10.
fn sentiment10(value: f64) -> String {
    format!("{:.1}", value * 10.0)
}

fn opt(value: Option<f64>, fmt: impl Fn(f64) -> String) -> String {
    value.map(fmt).unwrap_or_else(|| "-".to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let db = match &cli.db {
        Some(path) => pulsedw::Database::open_at(path).await?,
        None => pulsedw::Database::open().await?,
    };
    let dw = PulseDW::from_config(db).await?;

    match cli.command {
        Commands::Status => print_status(&dw).await?,
        Commands::Config { action } => handle_config(&dw, action).await?,
        Commands::Period {
            action: PeriodAction::Last { token, n },
        } => {
            let token = PeriodToken::parse(&token)?;
            for p in pulsedw::query::period::last_n_periods(&token, n)? {
                println!("{p}");
            }
        }
        Commands::Rollup {
            by,
            period,
            filter,
            json,
        } => {
            let by: GroupBy = by.parse()?;
            let mut f = filter.to_filter();
            if let Some(p) = period {
                f = f.period(PeriodToken::parse(&p)?);
            }
            let report = dw.group_rollup(by, &f).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Rollup by {by}");
                for r in &report.rows {
                    println!(
                        "  {:<12} {}  sat {:>4.1}  sentiment {:>4}  feedback {:>3}  people {:>3}",
                        r.group_key,
                        r.period,
                        r.avg_sat_score,
                        sentiment10(r.avg_sentiment),
                        r.total_feedback_count,
                        r.distinct_submitter_count
                    );
                }
                print_skipped(report.skipped_rows);
            }
        }
        Commands::Trend {
            by,
            current,
            compare,
            filter,
            json,
        } => {
            let by: GroupBy = by.parse()?;
            let current = period_or_current(current.as_deref())?;
            let comparison = match compare {
                Some(c) => PeriodToken::parse(&c)?,
                None => current.previous()?,
            };
            let report = dw
                .group_trend(by, current, comparison, &filter.to_filter())
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Trend by {by}: {current} vs {comparison}");
                for r in &report.rows {
                    println!(
                        "  {:<12} {:>5} -> {:>5}  delta {:>5}",
                        r.group_key,
                        opt(r.comparison_avg_sat_score, |v| format!("{v:.1}")),
                        opt(r.current_avg_sat_score, |v| format!("{v:.1}")),
                        opt(r.delta, |v| format!("{v:+.1}")),
                    );
                }
                print_skipped(report.skipped_rows);
            }
        }
        Commands::Series {
            end,
            months,
            filter,
            json,
        } => {
            let end = period_or_current(end.as_deref())?;
            let months = match months {
                Some(m) => m,
                None => AnalyticsConfig::load(dw.db()).await?.trend_months,
            };
            let report = dw.trend_series(end, months, &filter.to_filter()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Series: {months} months ending {end}");
                for p in &report.rows {
                    println!(
                        "  {}  sat {:>4}  sentiment {:>4}  feedback {:>3}",
                        p.period,
                        opt(p.avg_sat_score, |v| format!("{v:.1}")),
                        opt(p.avg_sentiment, sentiment10),
                        p.feedback_count
                    );
                }
                print_skipped(report.skipped_rows);
            }
        }
        Commands::Risk {
            person,
            filter,
            json,
        } => {
            let risks = match person {
                Some(id) => dw.risk_for_person(&id).await?.into_iter().collect(),
                None => dw.burnout_risks(&filter.to_filter()).await?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&risks)?);
            } else if risks.is_empty() {
                println!("No burnout risks detected.");
            } else {
                println!("Burnout risks");
                for r in &risks {
                    println!(
                        "  {:?}  {:<24} {:<8} {} -> {}  (-{}%, {} -> {})",
                        r.risk_tier,
                        r.display_name,
                        r.dept_code,
                        sentiment10(r.previous_sentiment),
                        sentiment10(r.current_sentiment),
                        r.drop_percentage,
                        r.previous_period,
                        r.current_period
                    );
                }
            }
        }
        Commands::Accountability {
            today: as_of,
            filter,
            json,
        } => {
            let as_of = match as_of {
                Some(d) => parse_date_arg("today", &d)?,
                None => today(),
            };
            let report = dw.manager_accountability(as_of, &filter.to_filter()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Manager accountability as of {as_of}");
                for m in &report.rows {
                    println!(
                        "  {:<9} {:<24} tasks {:>3}  pending {:>3}  overdue {:>3}  done {:>3}%  reports {:>3}",
                        format!("{:?}", m.health_tier),
                        m.manager_name,
                        m.total_tasks,
                        m.pending_count,
                        m.overdue_count,
                        m.completion_rate,
                        m.direct_reports
                    );
                }
                print_skipped(report.skipped_rows);
            }
        }
        Commands::Leaderboard { window, json } => {
            let (start, end) = resolve_window(&dw, &window).await?;
            let board = dw.leaderboard(start, end, window.podium).await?;
            print_board("Recognition leaderboard", start, end, &board, json)?;
        }
        Commands::Givers { window, json } => {
            let (start, end) = resolve_window(&dw, &window).await?;
            let board = dw.top_givers(start, end, window.podium).await?;
            print_board("Top recognition givers", start, end, &board, json)?;
        }
        Commands::Directory {
            search,
            dept,
            role,
            sort,
            direction,
            period,
            json,
        } => {
            let query = DirectoryQuery {
                search,
                department: dept,
                role: role.as_deref().map(str::parse::<pulsedw::model::Role>).transpose()?,
                sort: sort.parse::<SortKey>()?,
                direction: direction.parse::<SortDirection>()?,
            };
            let mut filter = RollupFilter::new();
            if let Some(p) = period {
                filter = filter.period(PeriodToken::parse(&p)?);
            }
            let rows = dw.directory(&filter, &query).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for r in &rows {
                    println!(
                        "  {:<24} {:<8} {:<8} sentiment {:>4}  sat {:>4.1}  feedback {:>3}  pending {:>3}/{}",
                        r.full_name(),
                        r.dept_code,
                        r.role.as_str(),
                        sentiment10(r.avg_sentiment),
                        r.avg_sat_score,
                        r.total_feedback_count,
                        r.pending_action_count,
                        r.total_action_count
                    );
                }
                println!("{} people", rows.len());
            }
        }
    }

    Ok(())
}

async fn resolve_window(dw: &PulseDW, window: &WindowArgs) -> anyhow::Result<(NaiveDate, NaiveDate)> {
    let end = match window.to {
        Some(ref d) => parse_date_arg("to", d)?,
        None => today(),
    };
    let start = match window.from {
        Some(ref d) => parse_date_arg("from", d)?,
        None => {
            let days = match window.days {
                Some(d) => d,
                None => AnalyticsConfig::load(dw.db()).await?.leaderboard_days,
            };
            let days = pulsedw::config::check_leaderboard_days(days)?;
            let (start, _) = pulsedw::date_util::trailing_window(end, days)
                .ok_or_else(|| anyhow::anyhow!("a {days}-day window ending {end} starts before the earliest date"))?;
            start
        }
    };
    Ok((start, end))
}

fn print_board(
    title: &str,
    start: NaiveDate,
    end: NaiveDate,
    board: &[LeaderboardEntry],
    json: bool,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(board)?);
        return Ok(());
    }
    println!("{title} ({start} to {end})");
    if board.is_empty() {
        println!("  No recognitions in this window.");
    }
    for e in board {
        println!(
            "  #{} {:<24} {:<8} {} kudos",
            e.rank, e.tally.display_name, e.tally.dept_code, e.tally.kudos_count
        );
    }
    Ok(())
}

fn print_skipped(skipped: u64) {
    if skipped > 0 {
        println!("  ({skipped} records skipped: unknown person)");
    }
}

async fn print_status(dw: &PulseDW) -> anyhow::Result<()> {
    let counts = dw.status().await?;
    println!("Store Status");
    for (table, n) in counts {
        println!("  {:<13} {n}", format!("{table}:"));
    }
    let cfg = AnalyticsConfig::load(dw.db()).await?;
    println!(
        "  Config:       trend_months={} leaderboard_days={} fetch_timeout_secs={}",
        cfg.trend_months, cfg.leaderboard_days, cfg.fetch_timeout_secs
    );
    Ok(())
}

async fn handle_config(dw: &PulseDW, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => match dw.config_get(&key).await? {
            Some(v) => println!("{key} = {v}"),
            None => println!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            dw.config_set(&key, &value).await?;
            println!("Config updated.");
        }
        ConfigAction::List => {
            let items = dw.config_list().await?;
            if items.is_empty() {
                println!("No configuration set.");
            } else {
                for (k, v) in items {
                    println!("{k} = {v}");
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_person_rejects_group_filters() {
        for flag in ["--dept", "--project", "--manager"] {
            let parsed = Cli::try_parse_from(["pulsedw", "risk", "--person", "u1", flag, "ENG"]);
            assert_eq!(
                parsed.err().map(|e| e.kind()),
                Some(clap::error::ErrorKind::ArgumentConflict)
            );
        }
        assert!(Cli::try_parse_from(["pulsedw", "risk", "--person", "u1"]).is_ok());
        assert!(Cli::try_parse_from(["pulsedw", "risk", "--dept", "ENG"]).is_ok());
    }
}
