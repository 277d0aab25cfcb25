mod commands;
mod output;
mod session;
mod token_store;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::session::GlobalArgs;

#[derive(Parser)]
#[command(name = "calendar-assistant")]
#[command(about = "Query your calendars, find free time and join meetings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Profile whose token and settings are used
    #[arg(short, long, global = true)]
    profile: Option<String>,

    /// Calendars to intersect for availability (comma-separated)
    #[arg(short = 'a', long, global = true, value_delimiter = ',')]
    calendars: Vec<String>,

    /// Enable debug logging
    #[arg(short = 'v', long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Store an access token for a profile
    Authorize {
        /// Profile to store the token under (defaults to the active profile)
        #[arg(value_name = "PROFILE")]
        target: Option<String>,

        /// Bearer token for the calendar API
        #[arg(long)]
        token: String,

        /// How long the token stays valid, e.g. 1h
        #[arg(long)]
        expires_in: Option<String>,
    },

    /// List events
    Show {
        #[arg(default_value = "today")]
        datespec: String,

        /// Only accepted events shared with someone else
        #[arg(long)]
        commitments: bool,
    },

    /// Show, and open, the meeting happening at a time
    Join {
        #[arg(default_value = "now")]
        timespec: String,

        /// Print the meeting without opening it
        #[arg(long)]
        no_join: bool,
    },

    /// Show where you are
    Location {
        #[arg(default_value = "today")]
        datespec: String,
    },

    /// Record where you will be
    LocationSet {
        location: String,

        #[arg(default_value = "today")]
        datespec: String,
    },

    /// List free blocks within working hours
    Availability {
        #[arg(default_value = "today")]
        datespec: String,

        /// Shortest block worth listing, e.g. 30m or 1h30m
        #[arg(short = 'l', long)]
        length: Option<String>,

        /// Start of the working day, e.g. 9am
        #[arg(short = 's', long)]
        start: Option<String>,

        /// End of the working day, e.g. 6pm
        #[arg(short = 'e', long)]
        end: Option<String>,
    },

    /// List events that look wrong
    Lint {
        #[arg(default_value = "today")]
        datespec: String,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("calendar_assistant_cli={log_level},calendar_assistant_core={log_level}")
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let globals = GlobalArgs {
        profile: cli.profile,
        calendars: cli.calendars,
    };

    match cli.command {
        Commands::Authorize {
            target,
            token,
            expires_in,
        } => commands::authorize_command(&globals, target, token, expires_in).await,

        Commands::Show {
            datespec,
            commitments,
        } => commands::show_command(&globals, datespec, commitments).await,

        Commands::Join { timespec, no_join } => {
            commands::join_command(&globals, timespec, no_join).await
        }

        Commands::Location { datespec } => commands::location_command(&globals, datespec).await,

        Commands::LocationSet { location, datespec } => {
            commands::location_set_command(&globals, location, datespec).await
        }

        Commands::Availability {
            datespec,
            length,
            start,
            end,
        } => {
            commands::availability_command(
                &globals,
                commands::AvailabilityParams {
                    datespec,
                    length,
                    start,
                    end,
                },
            )
            .await
        }

        Commands::Lint { datespec } => commands::lint_command(&globals, datespec).await,

        Commands::Config => commands::config_command(&globals).await,
    }
}
