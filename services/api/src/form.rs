use crate::infra::{build_service, parse_date};
use chrono::{Local, NaiveDate};
use clap::Args;
use sleep_smart::config::AppConfig;
use sleep_smart::error::AppError;
use sleep_smart::history::{export_csv, DashboardSummary, HistoryEntry, UserIdentity};
use sleep_smart::report::{ReportFormat, SleepReport};
use sleep_smart::scoring::{train, DEFAULT_ROWS, DEFAULT_SEED};
use sleep_smart::{HabitSample, Prediction, SuggestionProfile};
use std::fmt::Write as _;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    /// Screen time in hours per day
    #[arg(long)]
    pub(crate) screen_time: f64,
    /// Caffeinated drinks in cups per day
    #[arg(long)]
    pub(crate) caffeine: f64,
    /// Steps walked per day
    #[arg(long)]
    pub(crate) steps: u32,
    /// Water intake in liters per day
    #[arg(long)]
    pub(crate) water: f64,
    /// Stress level from 1 to 10
    #[arg(long)]
    pub(crate) stress: u8,
    /// Device used right before bed
    #[arg(long)]
    pub(crate) device_use: bool,
    /// Suggestion profile (desktop or web); defaults to configuration
    #[arg(long, value_parser = parse_profile)]
    pub(crate) profile: Option<SuggestionProfile>,
    /// Write a report to this path
    #[arg(long)]
    pub(crate) report: Option<PathBuf>,
    /// Report format (text or html)
    #[arg(long, default_value = "text", value_parser = parse_format)]
    pub(crate) format: ReportFormat,
    /// Store the result in this user's history
    #[arg(long)]
    pub(crate) user: Option<String>,
    /// Identity token forwarded to a hosted history store
    #[arg(long)]
    pub(crate) token: Option<String>,
    /// Date recorded with the prediction (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct TrainArgs {
    /// Seed for the synthetic dataset
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub(crate) seed: u64,
    /// Number of synthetic rows to generate
    #[arg(long, default_value_t = DEFAULT_ROWS)]
    pub(crate) rows: usize,
    /// Save the fitted model as JSON
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct HistoryListArgs {
    /// User whose history to read
    #[arg(long)]
    pub(crate) user: String,
    /// Identity token forwarded to a hosted history store
    #[arg(long)]
    pub(crate) token: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct HistoryExportArgs {
    /// User whose history to export
    #[arg(long)]
    pub(crate) user: String,
    /// Identity token forwarded to a hosted history store
    #[arg(long)]
    pub(crate) token: Option<String>,
    /// Write CSV to this path instead of stdout
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

fn parse_profile(raw: &str) -> Result<SuggestionProfile, String> {
    raw.parse()
}

fn parse_format(raw: &str) -> Result<ReportFormat, String> {
    raw.parse::<ReportFormat>().map_err(|err| err.to_string())
}

fn identity(user: String, token: Option<String>) -> UserIdentity {
    match token {
        Some(token) => UserIdentity::new(user).with_token(token),
        None => UserIdentity::new(user),
    }
}

pub(crate) async fn run_predict(args: PredictArgs, mut config: AppConfig) -> Result<(), AppError> {
    if let Some(profile) = args.profile {
        config.suggestions = sleep_smart::suggestions::SuggestionConfig::for_profile(profile);
    }
    let service = build_service(&config)?;

    let sample = HabitSample {
        screen_time: args.screen_time,
        caffeine: args.caffeine,
        steps: args.steps,
        water: args.water,
        stress: args.stress,
        device_use: args.device_use,
    };
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let prediction = service.predict(sample, today)?;

    print!("{}", render_prediction(&prediction));

    if let Some(path) = &args.report {
        SleepReport::from_prediction(&prediction).write_to(path, args.format)?;
        println!("Report saved to {}", path.display());
    }

    if let Some(user) = args.user {
        let user = identity(user, args.token);
        let entry = service.record(&user, &prediction).await?;
        println!(
            "Saved to {} history for {} ({})",
            service.store_name(),
            user.user_id,
            entry.date
        );
    }

    Ok(())
}

pub(crate) fn run_train(args: TrainArgs) -> Result<(), AppError> {
    let report = train(args.seed, args.rows)?;

    println!("Sleep-quality model (seed {})", report.seed);
    println!(
        "- {} training rows | {} test rows",
        report.train_rows, report.test_rows
    );
    println!(
        "- test RMSE {:.3} | mean-predictor RMSE {:.3}",
        report.rmse, report.baseline_rmse
    );
    println!("- intercept {:.3}", report.model.intercept);
    for (name, weight) in sleep_smart::FeatureVector::NAMES
        .iter()
        .zip(report.model.coefficients)
    {
        println!("  - {name}: {weight:+.4}");
    }

    if let Some(path) = &args.output {
        report.model.save(path)?;
        println!("Model saved to {}", path.display());
    }

    Ok(())
}

pub(crate) async fn run_history_list(
    args: HistoryListArgs,
    config: AppConfig,
) -> Result<(), AppError> {
    let service = build_service(&config)?;
    let user = identity(args.user, args.token);

    let entries = service.history(&user).await?;
    print!("{}", render_history(&entries));
    Ok(())
}

pub(crate) async fn run_history_export(
    args: HistoryExportArgs,
    config: AppConfig,
) -> Result<(), AppError> {
    let service = build_service(&config)?;
    let user = identity(args.user, args.token);

    let entries = service.history(&user).await?;
    let csv = export_csv(&entries)?;
    match &args.csv {
        Some(path) => {
            std::fs::write(path, csv)?;
            println!("Exported {} entries to {}", entries.len(), path.display());
        }
        None => print!("{csv}"),
    }
    Ok(())
}

pub(crate) fn render_prediction(prediction: &Prediction) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Predicted Sleep Quality Score: {:.1}/100",
        prediction.score
    );
    let _ = writeln!(out, "Suggestions:");
    for suggestion in &prediction.suggestions {
        let _ = writeln!(out, "  {}", suggestion.display_line());
    }
    out
}

pub(crate) fn render_history(entries: &[HistoryEntry]) -> String {
    let Some(summary) = DashboardSummary::from_entries(entries) else {
        return "No sleep data recorded yet.\n".to_string();
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} entries from {} to {}",
        summary.entry_count, summary.first_date, summary.last_date
    );
    for point in &summary.progress {
        let _ = writeln!(
            out,
            "- {} | score {:.1} | screen {:.1} h | stress {}",
            point.date, point.prediction, point.screen_time, point.stress
        );
    }
    let _ = writeln!(out, "Averages:");
    for bar in &summary.habit_bars {
        let _ = writeln!(out, "  - {}: {:.2}", bar.label, bar.value);
    }
    let _ = writeln!(out, "  - Sleep score: {:.2}", summary.averages.prediction);
    out
}
