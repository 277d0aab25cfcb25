use std::process::Command;

use anyhow::Result;
use chrono::Utc;

use calendar_assistant_core::{
    auth::{AccessToken, TokenStore},
    config::Settings,
    date::parse_duration,
    event_set::{Predicate, Predicates},
};

use crate::{
    output,
    session::{self, GlobalArgs, Session},
};

/// Store a provider token for a profile.
pub async fn authorize_command(
    globals: &GlobalArgs,
    profile: Option<String>,
    token: String,
    expires_in: Option<String>,
) -> Result<()> {
    let profile = match profile {
        Some(profile) => profile,
        None => globals.config(Settings::default())?.profile().to_string(),
    };
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("Token must not be empty");
    }

    let mut access_token = AccessToken::new(token);
    if let Some(expires_in) = expires_in {
        access_token = access_token.with_expiry(Utc::now() + parse_duration(&expires_in)?);
    }

    session::token_store()?.set(&profile, &access_token).await?;
    tracing::info!(profile = %profile, "stored access token");
    println!("✓ Token stored for profile {profile}");
    Ok(())
}

pub async fn show_command(globals: &GlobalArgs, datespec: String, commitments: bool) -> Result<()> {
    let session = Session::open(globals.config(Settings::default())?).await?;
    let range = session.datespec(&datespec)?;

    let events = if commitments {
        let predicates = Predicates::new().with(Predicate::Commitment, true);
        session
            .assistant
            .find_events_matching(&range, &predicates)
            .await?
    } else {
        session.assistant.find_events(&range).await?
    };

    output::print_events(&events, &session.time_zone(), "No events");
    Ok(())
}

pub async fn join_command(globals: &GlobalArgs, timespec: String, no_join: bool) -> Result<()> {
    let session = Session::open(globals.config(Settings::default())?).await?;
    let target = session.instant(&timespec)?;

    let Some(link) = session.assistant.find_meeting_link(target).await? else {
        println!("No meeting to join");
        return Ok(());
    };

    println!("{}", output::format_event(&link.event, &session.time_zone()));
    println!("{}", link.uri);
    if !no_join {
        open_uri(&link.uri);
    }
    Ok(())
}

pub async fn location_command(globals: &GlobalArgs, datespec: String) -> Result<()> {
    let session = Session::open(globals.config(Settings::default())?).await?;
    let range = session.datespec(&datespec)?;
    let events = session.assistant.find_location_events(&range).await?;
    output::print_locations(&events, &session.time_zone());
    Ok(())
}

pub async fn location_set_command(
    globals: &GlobalArgs,
    location: String,
    datespec: String,
) -> Result<()> {
    let session = Session::open(globals.config(Settings::default())?).await?;
    let range = session.datespec(&datespec)?;
    let created = session
        .assistant
        .create_location_event(&range, &location)
        .await?;
    println!("✓ Created {} location event(s)", created.len());
    output::print_locations(&created, &session.time_zone());
    Ok(())
}

/// Per-invocation working-hours overrides for `availability`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityParams {
    pub datespec: String,
    pub length: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

pub async fn availability_command(globals: &GlobalArgs, params: AvailabilityParams) -> Result<()> {
    let overrides = Settings {
        meeting_length: params.length,
        start_of_day: params.start,
        end_of_day: params.end,
        ..Settings::default()
    };
    let session = Session::open(globals.config(overrides)?).await?;
    let range = session.datespec(&params.datespec)?;

    tracing::info!(
        calendars = ?session.assistant.config().calendars(),
        start = %range.start,
        end = %range.end,
        "computing availability"
    );
    let blocks = session.assistant.availability(&range).await?;
    let tz = session.time_zone();
    if blocks.is_empty() {
        println!("No available time");
    }
    for block in &blocks {
        println!("{}", output::format_span(&block.range(), false, &tz));
    }
    Ok(())
}

pub async fn lint_command(globals: &GlobalArgs, datespec: String) -> Result<()> {
    let session = Session::open(globals.config(Settings::default())?).await?;
    let range = session.datespec(&datespec)?;
    let events = session.assistant.lint_events(&range).await?;
    output::print_lint(&events, &session.time_zone());
    Ok(())
}

/// Print the effective settings as TOML.
pub async fn config_command(globals: &GlobalArgs) -> Result<()> {
    let config = globals.config(Settings::default())?;
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Hand a meeting URL to the platform's opener. Failure is not fatal.
fn open_uri(uri: &str) {
    #[cfg(target_os = "macos")]
    let mut command = Command::new("open");
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut command = Command::new("xdg-open");

    match command.arg(uri).status() {
        Ok(status) if status.success() => tracing::debug!(uri, "opened meeting"),
        Ok(status) => tracing::warn!(uri, %status, "opener exited with failure"),
        Err(e) => tracing::warn!(uri, error = %e, "failed to launch opener"),
    }
}
