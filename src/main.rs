//! Timetable CLI - View class schedules for groups and teachers
//!
//! Stands in for the chat front end: every subcommand goes through the same
//! cache, rate limiter and query engine a conversational bot would use.

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use timetable::bot::{self, ScheduleBot};
use timetable::cache::CacheManager;
use timetable::cli::{parse_period_arg, Cli, Command, DirectoryAction};
use timetable::clock::{Clock, SystemClock};
use timetable::config::{self, Config};
use timetable::data::Directory;
use timetable::limiter::RateLimiter;
use timetable::query;
use timetable::service::ScheduleService;
use timetable::store::{DirectoryStore, FileDirectoryStore, FileSelectionStore, SelectionStore};

/// Logs go to stderr so stdout carries only schedules and replies
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

fn build_service(config: &Config, clock: Arc<dyn Clock>) -> Result<ScheduleService, Box<dyn std::error::Error>> {
    let cache = CacheManager::with_dir(config.cache_dir.clone(), clock);
    let client = config.client()?;
    Ok(ScheduleService::new(Arc::new(cache), Arc::new(client)))
}

fn build_bot(config: &Config, selections: Arc<dyn SelectionStore>) -> Result<ScheduleBot, Box<dyn std::error::Error>> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let service = build_service(config, clock.clone())?;
    let limiter = RateLimiter::with_cooldown(clock.clone(), config.cooldown_secs);
    Ok(ScheduleBot::new(service, selections, limiter, clock))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::load_dotenv();
    init_tracing();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(base_url) = cli.base_url {
        config = config.with_base_url(base_url);
    }

    match cli.command {
        Command::Show { name, period } => {
            let period = parse_period_arg(&period)?;
            let clock: Arc<dyn Clock> = Arc::new(SystemClock);
            let service = build_service(&config, clock.clone())?;

            match service.get_schedule(&name).await {
                Ok(document) => println!("{}", query::render_period(&document, period, clock.today())?),
                Err(e) => {
                    let err = bot::ScheduleError::from(e);
                    println!("{}", err.reply());
                    return Err(err.into());
                }
            }
        }
        Command::Select { user, name } => {
            let selection = bot::normalize_selection(&name)?;
            FileSelectionStore::new(config.selections_path()).record(user, &selection)?;
            info!(user, %selection, "selection saved");
            println!("{}", bot::selection_saved(&selection));
        }
        Command::Ask { user, periods } => {
            let selections = Arc::new(FileSelectionStore::new(config.selections_path()));
            let bot = build_bot(&config, selections)?;
            for period in &periods {
                println!("{}", bot.respond(user, period).await);
            }
        }
        Command::Users { warm } => {
            let selections = Arc::new(FileSelectionStore::new(config.selections_path()));
            if warm {
                let bot = build_bot(&config, selections)?;
                let loaded = bot.warm_selections().await?;
                println!("Pre-loaded {} schedule(s).", loaded);
                for (user, notice) in bot.restart_notices()? {
                    println!("[{}] {}", user, notice);
                }
            } else {
                for user in selections.identities()? {
                    if let Some(selection) = selections.lookup(user)? {
                        println!("[{}] {}", user, bot::restart_notice(&selection));
                    }
                }
            }
        }
        Command::Directory { action } => {
            let store = FileDirectoryStore::new(config.directory_path());
            match action {
                DirectoryAction::Refresh => {
                    let raw = config.client()?.fetch_directory().await?;
                    let directory = Directory::from_raw(raw);
                    store.replace(&directory)?;
                    info!(
                        groups = directory.groups.len(),
                        teachers = directory.teachers.len(),
                        "directory saved"
                    );
                    println!(
                        "Saved {} group(s) and {} teacher(s).",
                        directory.groups.len(),
                        directory.teachers.len()
                    );
                }
                DirectoryAction::Search { query } => {
                    for name in store.search_groups(&query)? {
                        println!("group    {}", name);
                    }
                    for name in store.search_teachers(&query)? {
                        println!("teacher  {}", name);
                    }
                }
            }
        }
    }

    Ok(())
}
