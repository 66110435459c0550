//! TripMind - conversational travel planner
//!
//! CLI entry point: chat, trips, users and itineraries.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use tripmind::agent::{ChatRepl, ChatSession, TripAgent, print_response};
use tripmind::cli::{Cli, Command, ItineraryCommand, TripFields, TripsCommand, UserCommand};
use tripmind::config::{ClassifierKind, Config};
use tripmind::domain::{Activity, Trip, User};
use tripmind::llm::{LlmClient, create_client};
use tripmind::planning::{ItineraryStatus, PlanStatus, TripPatch, TripPlanner, TripRequest};
use tripmind::prompts::PromptLoader;
use tripmind::state::StateManager;

const GUEST_EMAIL: &str = "guest@tripmind.local";

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tripmind")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    let log_file = fs::File::create(log_dir.join("tripmind.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(db) = cli.db {
        config.storage.db_path = db;
    }
    info!(db_path = %config.storage.db_path.display(), "TripMind loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Chat {
            user,
            trip,
            message,
            classifier,
        }) => {
            if let Some(kind) = classifier {
                config.agent.classifier = kind;
            }
            cmd_chat(&config, user, trip, message).await
        }
        None => cmd_chat(&config, None, None, None).await,
        Some(Command::User { command }) => cmd_user(&config, command).await,
        Some(Command::Trips { command }) => cmd_trips(&config, command).await,
        Some(Command::Plan {
            destination,
            fields,
            country,
            user,
        }) => cmd_plan(&config, destination, fields, country, user).await,
        Some(Command::Itinerary { command }) => cmd_itinerary(&config, command).await,
    }
}

/// LLM client if one can be built; its absence only matters to LLM features
fn optional_llm(config: &Config) -> Option<Arc<dyn LlmClient>> {
    match create_client(&config.llm) {
        Ok(llm) => Some(llm),
        Err(e) => {
            warn!(error = %e, "LLM client unavailable");
            None
        }
    }
}

fn build_planner(config: &Config, llm: Option<Arc<dyn LlmClient>>) -> Result<TripPlanner> {
    let state = StateManager::spawn(&config.storage.db_path).context("Failed to open trip store")?;
    let root = std::env::current_dir().context("Failed to read current directory")?;
    let planner = TripPlanner::new(state, config.itinerary.clone()).with_prompts(PromptLoader::new(root));
    Ok(match llm {
        Some(llm) => planner.with_llm(llm, config.llm.max_tokens),
        None => planner,
    })
}

async fn resolve_user(planner: &TripPlanner, user: Option<i64>) -> Result<User> {
    match user {
        Some(id) => Ok(planner.get_user(id).await?),
        None => Ok(planner.get_or_create_user(GUEST_EMAIL, "Guest").await?),
    }
}

async fn cmd_chat(config: &Config, user: Option<i64>, trip: Option<i64>, message: Option<String>) -> Result<()> {
    debug!(?user, ?trip, "cmd_chat: called");
    let needs_llm = config.agent.classifier == ClassifierKind::Llm;
    config.validate(needs_llm)?;

    let llm = optional_llm(config);
    let planner = build_planner(config, llm.clone())?;
    let user = resolve_user(&planner, user).await?;
    let session = match trip {
        Some(trip_id) => {
            let bound = planner.get_trip(trip_id).await?;
            if bound.user_id != user.id {
                return Err(eyre::eyre!("Trip {} not found", trip_id));
            }
            ChatSession::for_trip(user.id, trip_id)
        }
        None => ChatSession::new(user.id),
    };
    let agent = TripAgent::from_config(config, planner, llm)?;

    match message {
        Some(message) => {
            let mut session = session;
            let response = agent.process_message(&mut session, &message).await;
            print_response(&response);
            Ok(())
        }
        None => ChatRepl::new(agent, session).run(None).await,
    }
}

async fn cmd_user(config: &Config, command: UserCommand) -> Result<()> {
    debug!(?command, "cmd_user: called");
    let planner = build_planner(config, None)?;
    match command {
        UserCommand::Create { email, name } => {
            let user = planner.create_user(&email, &name).await?;
            println!("{} Created user #{} {} <{}>", "✓".green(), user.id, user.name, user.email);
        }
        UserCommand::Show { id } => {
            let user = planner.get_user(id).await?;
            let trips = planner.list_trips(id).await?;
            println!("#{} {} <{}>", user.id, user.name.bold(), user.email);
            println!("{} trip(s)", trips.len());
        }
        UserCommand::List => {
            let users = planner.state().list_users().await?;
            if users.is_empty() {
                println!("{}", "No users yet.".dimmed());
            }
            for user in users {
                println!("#{} {} <{}>", user.id, user.name, user.email);
            }
        }
        UserCommand::Delete { id } => {
            let removed = planner.delete_user(id).await?;
            println!("{} Deleted user #{} and {} trip(s)", "✓".green(), id, removed);
        }
    }
    Ok(())
}

async fn cmd_trips(config: &Config, command: TripsCommand) -> Result<()> {
    debug!(?command, "cmd_trips: called");
    let planner = build_planner(config, None)?;
    match command {
        TripsCommand::List { user } => {
            let user = resolve_user(&planner, user).await?;
            let trips = planner.list_trips(user.id).await?;
            if trips.is_empty() {
                println!("{}", "No trips yet.".dimmed());
            }
            for trip in trips {
                println!("{}", trip.summary());
            }
        }
        TripsCommand::Show { id, json } => {
            let trip = planner.get_trip(id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&trip)?);
            } else {
                print_trip(&trip);
            }
        }
        TripsCommand::Update {
            id,
            destination,
            status,
            fields,
        } => {
            let patch = TripPatch {
                destination,
                status,
                start_date: fields.start,
                end_date: fields.end,
                duration_days: fields.days,
                budget: fields.budget,
                travelers_count: fields.travelers,
                preferences: fields.preferences,
                notes: fields.notes,
            };
            if patch.is_empty() {
                return Err(eyre::eyre!("Nothing to update; pass at least one field"));
            }
            let outcome = planner.update_trip(id, patch).await?;
            println!("{} {}", "✓".green(), outcome.message);
            println!("{}", outcome.trip.summary());
        }
        TripsCommand::Delete { id } => {
            planner.delete_trip(id).await?;
            println!("{} Deleted trip #{}", "✓".green(), id);
        }
    }
    Ok(())
}

async fn cmd_plan(
    config: &Config,
    destination: String,
    fields: TripFields,
    country: Option<String>,
    user: Option<i64>,
) -> Result<()> {
    debug!(%destination, ?fields, "cmd_plan: called");
    let planner = build_planner(config, None)?;
    let user = resolve_user(&planner, user).await?;
    let request = TripRequest {
        destination,
        start_date: fields.start,
        end_date: fields.end,
        duration_days: fields.days,
        budget: fields.budget,
        travelers_count: fields.travelers,
        preferences: fields.preferences.unwrap_or_default(),
        country_code: country,
        notes: fields.notes,
    };

    let outcome = planner.plan_or_update_trip(user.id, request).await?;
    let status = match outcome.status {
        PlanStatus::Created | PlanStatus::Updated => outcome.status.to_string().green(),
        PlanStatus::NeedsClarification => outcome.status.to_string().yellow(),
        PlanStatus::ValidationError => {
            return Err(eyre::eyre!("[{}] {}", outcome.status, outcome.message));
        }
    };
    println!("[{}] {}", status, outcome.message);
    if let Some(trip) = &outcome.trip {
        println!("{}", trip.summary());
    }
    Ok(())
}

async fn cmd_itinerary(config: &Config, command: ItineraryCommand) -> Result<()> {
    debug!(?command, "cmd_itinerary: called");
    match command {
        ItineraryCommand::Generate {
            trip_id,
            start_day,
            preferences,
        } => {
            config.validate(true)?;
            let llm = create_client(&config.llm).context("Failed to create LLM client")?;
            let planner = build_planner(config, Some(llm))?;
            println!("{}", "Generating itinerary...".dimmed());
            let outcome = planner.generate_itinerary(trip_id, preferences, start_day).await?;
            match outcome.status {
                ItineraryStatus::Generated => {
                    let trip = planner.get_trip(trip_id).await?;
                    print_trip(&trip);
                    println!();
                    println!("{} {}", "✓".green(), outcome.message);
                }
                ItineraryStatus::GenerationError => {
                    return Err(eyre::eyre!(outcome.message));
                }
            }
        }
        ItineraryCommand::Add {
            trip_id,
            day,
            title,
            time,
            kind,
            location,
            description,
        } => {
            let planner = build_planner(config, None)?;
            let activity = Activity {
                id: String::new(),
                time,
                kind: kind.into(),
                title,
                location,
                description,
                notes: None,
                booking_ref: None,
            };
            let outcome = planner.add_activity(trip_id, day, activity).await?;
            println!(
                "{} Added {} to day {} of trip #{}",
                "✓".green(),
                outcome.activity.id,
                outcome.day,
                outcome.trip_id
            );
        }
        ItineraryCommand::Remove { trip_id, activity_id } => {
            let planner = build_planner(config, None)?;
            let outcome = planner.remove_activity(trip_id, &activity_id).await?;
            println!(
                "{} Removed \"{}\" from day {} of trip #{}",
                "✓".green(),
                outcome.activity.title,
                outcome.day,
                outcome.trip_id
            );
        }
    }
    Ok(())
}

fn print_trip(trip: &Trip) {
    println!("{}", trip.summary().bold());
    if !trip.metadata.preferences.is_empty() {
        println!("Preferences: {}", trip.metadata.preferences.join(", "));
    }
    if let Some(config) = &trip.metadata.itinerary_config
        && config.is_partial
    {
        println!(
            "{}",
            format!(
                "Itinerary covers {} of {} days",
                trip.metadata.itinerary.len(),
                config.total_trip_days
            )
            .yellow()
        );
    }
    for day in &trip.metadata.itinerary {
        println!();
        println!("{} {}", format!("Day {} ({})", day.day, day.date).bright_cyan(), day.title);
        for activity in &day.activities {
            let time = if activity.time.is_empty() { "--:--" } else { activity.time.as_str() };
            println!("  {} {:10} {} {}", time, activity.kind.to_string(), activity.title, activity.id.dimmed());
        }
    }
    for flight in &trip.metadata.flights {
        println!("Flight: {} {} {} -> {}", flight.airline, flight.flight_number, flight.from, flight.to);
    }
    for hotel in &trip.metadata.hotels {
        println!("Hotel: {}", hotel.name);
    }
}
