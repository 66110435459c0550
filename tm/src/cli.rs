//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ClassifierKind;
use crate::domain::TripStatus;

/// TripMind - conversational travel planner
#[derive(Parser)]
#[command(
    name = "tm",
    about = "Plan trips by chatting: validated, deduplicated trips with day-by-day itineraries",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Trip store location, overriding storage.db-path
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Subcommand to execute (defaults to chat)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Chat with the planner (interactive unless --message is given)
    Chat {
        /// Acting user id (defaults to the guest user)
        #[arg(short, long)]
        user: Option<i64>,

        /// Scope the chat to one trip
        #[arg(short, long)]
        trip: Option<i64>,

        /// Send one message, print the reply and exit
        #[arg(short, long)]
        message: Option<String>,

        /// Intent classifier, overriding agent.classifier
        #[arg(long)]
        classifier: Option<ClassifierKind>,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommand,
    },

    /// Inspect and edit trips
    Trips {
        #[command(subcommand)]
        command: TripsCommand,
    },

    /// Plan a trip (validated and deduplicated like a chat request)
    Plan {
        destination: String,

        #[command(flatten)]
        fields: TripFields,

        /// ISO 3166 alpha-2 country code
        #[arg(long)]
        country: Option<String>,

        /// Acting user id (defaults to the guest user)
        #[arg(short, long)]
        user: Option<i64>,
    },

    /// Generate and edit itineraries
    Itinerary {
        #[command(subcommand)]
        command: ItineraryCommand,
    },
}

/// Trip fields shared by `plan` and `trips update`
#[derive(Debug, Clone, Default, clap::Args)]
pub struct TripFields {
    /// Start date (YYYY-MM-DD or "Month YYYY")
    #[arg(long)]
    pub start: Option<String>,

    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,

    /// Trip length in days
    #[arg(long)]
    pub days: Option<i64>,

    /// Total budget in USD
    #[arg(long)]
    pub budget: Option<f64>,

    /// Number of travelers
    #[arg(long)]
    pub travelers: Option<u32>,

    /// Comma-separated interests, e.g. food,culture
    #[arg(long, value_delimiter = ',')]
    pub preferences: Option<Vec<String>>,

    #[arg(long)]
    pub notes: Option<String>,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create a user
    Create {
        email: String,

        #[arg(short, long, default_value = "Traveler")]
        name: String,
    },

    /// Show a user
    Show { id: i64 },

    /// List users
    List,

    /// Delete a user and all their trips
    Delete { id: i64 },
}

/// Trip subcommands
#[derive(Debug, Subcommand)]
pub enum TripsCommand {
    /// List a user's trips
    List {
        /// User id (defaults to the guest user)
        #[arg(short, long)]
        user: Option<i64>,
    },

    /// Show one trip with its itinerary
    Show {
        id: i64,

        /// Print the stored JSON
        #[arg(long)]
        json: bool,
    },

    /// Update fields of a trip
    Update {
        id: i64,

        #[arg(long)]
        destination: Option<String>,

        #[arg(long)]
        status: Option<TripStatus>,

        #[command(flatten)]
        fields: TripFields,
    },

    /// Delete a trip
    Delete { id: i64 },
}

/// Itinerary subcommands
#[derive(Debug, Subcommand)]
pub enum ItineraryCommand {
    /// Generate (or continue) a trip's itinerary
    Generate {
        trip_id: i64,

        /// First day to generate
        #[arg(long)]
        start_day: Option<u32>,

        /// Comma-separated interests, overriding the trip's preferences
        #[arg(long, value_delimiter = ',')]
        preferences: Option<Vec<String>>,
    },

    /// Add an activity to a day
    Add {
        trip_id: i64,

        #[arg(long)]
        day: u32,

        #[arg(long)]
        title: String,

        /// Time of day, HH:MM
        #[arg(long, default_value = "")]
        time: String,

        /// activity, dining, flight, hotel or transport
        #[arg(long, default_value = "activity")]
        kind: String,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Remove an activity by id
    Remove { trip_id: i64, activity_id: String },
}
