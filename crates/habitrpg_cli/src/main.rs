//! `habitrpg` command-line front end.
//!
//! # Responsibility
//! - Resolve configuration from flags and `HABITRPG_*` environment variables.
//! - Map each subcommand onto one engine operation and print JSON.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use habitrpg_core::db::open_db;
use habitrpg_core::{
    default_log_level, init_logging, CompletionService, GameError, HabitId, HabitService,
    HabitStore,
    HabitUpdate, NewHabit, SqliteStore, StatsService, SystemClock, User, UserService,
    DEFAULT_XP_REWARD,
};
use log::info;
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "habitrpg", version)]
#[command(about = "Track habits, earn XP and level up")]
struct Cli {
    /// SQLite database file.
    #[arg(long, env = "HABITRPG_DB", default_value = "habitrpg.sqlite3")]
    db: PathBuf,
    #[arg(long, env = "HABITRPG_LOG_LEVEL", default_value = default_log_level())]
    log_level: String,
    /// Absolute directory for rotating log files. Logging is off when unset.
    #[arg(long, env = "HABITRPG_LOG_DIR")]
    log_dir: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand)]
    User(UserCommand),
    #[command(subcommand)]
    Habit(HabitCommand),
    /// Record today's (or `--date`) completion of a habit.
    Complete {
        #[arg(long)]
        user: String,
        habit: HabitId,
        /// Calendar day as YYYY-MM-DD.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Recent completions, newest first.
    Completions {
        #[arg(long)]
        user: String,
        #[arg(long)]
        limit: Option<u32>,
    },
}

#[derive(Debug, Subcommand)]
enum UserCommand {
    Create { username: String, email: String },
    /// Accepts a username or a user id.
    Show { user: String },
    Stats { user: String },
}

#[derive(Debug, Subcommand)]
enum HabitCommand {
    Add {
        #[arg(long)]
        user: String,
        name: String,
        #[command(flatten)]
        details: HabitDetails,
        #[arg(long, default_value_t = DEFAULT_XP_REWARD)]
        xp: i64,
    },
    List {
        #[arg(long)]
        user: String,
        /// Include deactivated habits.
        #[arg(long)]
        all: bool,
    },
    Update {
        #[arg(long)]
        user: String,
        habit: HabitId,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        details: HabitDetails,
        #[arg(long)]
        xp: Option<i64>,
        /// Remove the stored description.
        #[arg(long, conflicts_with = "description")]
        clear_description: bool,
        /// Remove the stored reminder time.
        #[arg(long, conflicts_with = "reminder")]
        clear_reminder: bool,
    },
    /// Soft-delete a habit; its completions are kept.
    Archive {
        #[arg(long)]
        user: String,
        habit: HabitId,
    },
}

#[derive(Debug, Args)]
struct HabitDetails {
    #[arg(long)]
    description: Option<String>,
    /// Reminder time as HH:MM:SS.
    #[arg(long)]
    reminder: Option<NaiveTime>,
    /// Weekday index, Monday = 0. Repeatable.
    #[arg(long = "day", value_parser = clap::value_parser!(u8).range(0..=6))]
    days: Vec<u8>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(&cli.log_level, log_dir).context("failed to initialize logging")?;
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
    let store = SqliteStore::try_new(&conn)?;
    run(store, cli.command)
}

fn run(store: SqliteStore<'_>, command: Command) -> Result<()> {
    let clock = SystemClock;
    let users = UserService::new(store, clock);

    match command {
        Command::User(UserCommand::Create { username, email }) => {
            print_json(&users.register(&username, &email)?)
        }
        Command::User(UserCommand::Show { user }) => print_json(&resolve_user(&users, &user)?),
        Command::User(UserCommand::Stats { user }) => {
            let user = resolve_user(&users, &user)?;
            print_json(&StatsService::new(store, clock).stats(user.id)?)
        }
        Command::Habit(command) => run_habit(store, &users, command),
        Command::Complete { user, habit, date } => {
            let user = resolve_user(&users, &user)?;
            let at = date.map(|day| day.and_time(NaiveTime::MIN).and_utc());
            let completion = CompletionService::new(store, clock).record(user.id, habit, at)?;
            info!("event=cli_complete module=cli status=ok");
            print_json(&completion)
        }
        Command::Completions { user, limit } => {
            let user = resolve_user(&users, &user)?;
            print_json(&CompletionService::new(store, clock).list_completions(user.id, limit)?)
        }
    }
}

fn run_habit<S: HabitStore>(
    store: S,
    users: &UserService<S, SystemClock>,
    command: HabitCommand,
) -> Result<()> {
    let habits = HabitService::new(store, SystemClock);

    match command {
        HabitCommand::Add {
            user,
            name,
            details,
            xp,
        } => {
            let user = resolve_user(users, &user)?;
            let request = NewHabit {
                description: details.description,
                reminder_time: details.reminder,
                days_of_week: details.days,
                xp_reward: xp,
                ..NewHabit::named(name)
            };
            print_json(&habits.create_habit(user.id, request)?)
        }
        HabitCommand::List { user, all } => {
            let user = resolve_user(users, &user)?;
            print_json(&habits.list_habits(user.id, !all)?)
        }
        HabitCommand::Update {
            user,
            habit,
            name,
            details,
            xp,
            clear_description,
            clear_reminder,
        } => {
            let user = resolve_user(users, &user)?;
            let update = HabitUpdate {
                name,
                description: nullable_change(details.description, clear_description),
                reminder_time: nullable_change(details.reminder, clear_reminder),
                days_of_week: (!details.days.is_empty()).then_some(details.days),
                xp_reward: xp,
                is_active: None,
            };
            print_json(&habits.update_habit(user.id, habit, update)?)
        }
        HabitCommand::Archive { user, habit } => {
            let user = resolve_user(users, &user)?;
            habits.deactivate_habit(user.id, habit)?;
            print_json(&habits.get_habit(user.id, habit)?)
        }
    }
}

/// `Some(None)` clears the field, `None` leaves it alone.
fn nullable_change<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

/// Looks a user up by id first, then by username.
fn resolve_user<S: HabitStore>(users: &UserService<S, SystemClock>, key: &str) -> Result<User> {
    if let Ok(id) = Uuid::parse_str(key) {
        match users.get_user(id) {
            Ok(user) => return Ok(user),
            Err(GameError::NotFound { .. }) => {}
            Err(err) => return Err(err.into()),
        }
    }
    match users.find_by_username(key)? {
        Some(user) => Ok(user),
        None => bail!("no user named `{key}`"),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
