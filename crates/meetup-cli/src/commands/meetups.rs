//! Meetup commands.

use super::{failure, Context};
use crate::output::{self, or_dash, truncate, OutputFormat};
use anyhow::Result;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use clap::Args;
use meetup_api::models::{Meetup, MeetupDraft, MeetupStatus, MeetupUpdate};
use meetup_api::{MeetupApi, MeetupFilter};

/// Parse a meetup time: RFC 3339, or `YYYY-MM-DD HH:MM` in local time.
pub fn parse_when(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M")
        .map_err(|_| format!("invalid time '{}', expected YYYY-MM-DD HH:MM", value))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(|| format!("'{}' does not exist in the local time zone", value))
}

#[derive(Debug, Clone, Default, Args)]
pub struct ListMeetupsArgs {
    /// upcoming, completed or cancelled
    #[arg(long)]
    pub status: Option<MeetupStatus>,
    /// Catalogue movie id
    #[arg(long)]
    pub movie: Option<u64>,
    /// Only meetups that have not started yet
    #[arg(long)]
    pub upcoming: bool,
    /// Only meetups you organize
    #[arg(long)]
    pub mine: bool,
}

#[derive(Debug, Clone, Args)]
pub struct CreateMeetupArgs {
    #[arg(short, long)]
    pub title: String,
    /// Catalogue movie id
    #[arg(short, long)]
    pub movie: u64,
    /// When it starts (RFC 3339 or "YYYY-MM-DD HH:MM")
    #[arg(short, long, value_parser = parse_when)]
    pub when: DateTime<Utc>,
    #[arg(short, long)]
    pub location: String,
    #[arg(long, default_value = "")]
    pub theater: String,
    #[arg(long, default_value_t = 10)]
    pub max_participants: u32,
    #[arg(short, long, default_value = "")]
    pub description: String,
}

impl From<CreateMeetupArgs> for MeetupDraft {
    fn from(args: CreateMeetupArgs) -> Self {
        MeetupDraft {
            title: args.title,
            description: args.description,
            movie: args.movie,
            location: args.location,
            theater_name: args.theater,
            meetup_datetime: args.when,
            max_participants: args.max_participants,
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct UpdateMeetupArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub theater: Option<String>,
    #[arg(long, value_parser = parse_when)]
    pub when: Option<DateTime<Utc>>,
    #[arg(long)]
    pub max_participants: Option<u32>,
    #[arg(long)]
    pub status: Option<MeetupStatus>,
}

impl From<UpdateMeetupArgs> for MeetupUpdate {
    fn from(args: UpdateMeetupArgs) -> Self {
        MeetupUpdate {
            title: args.title,
            description: args.description,
            location: args.location,
            theater_name: args.theater,
            meetup_datetime: args.when,
            max_participants: args.max_participants,
            status: args.status,
        }
    }
}

fn local_time(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%a %d %b %Y %H:%M").to_string()
}

fn meetup_line(meetup: &Meetup) -> String {
    let spots = if meetup.is_full {
        "full".to_string()
    } else {
        format!("{}/{}", meetup.participants_count, meetup.max_participants)
    };
    format!(
        "{:>6}  {}  {}  [{}] {} ({})",
        meetup.id,
        local_time(&meetup.meetup_datetime),
        truncate(&meetup.title, 40),
        meetup.status,
        truncate(&meetup.movie.title, 30),
        spots
    )
}

fn print_meetup(meetup: &Meetup) {
    output::print_heading(&meetup.title);
    output::print_row("Id", &meetup.id.to_string());
    output::print_row("Movie", &meetup.movie.title);
    output::print_row("When", &local_time(&meetup.meetup_datetime));
    output::print_row("Where", or_dash(&meetup.location));
    output::print_row("Theater", or_dash(&meetup.theater_name));
    output::print_row("Organizer", &meetup.organizer.display_name());
    output::print_row("Status", meetup.status.as_str());
    output::print_row(
        "Participants",
        &format!(
            "{}/{} ({} spots left)",
            meetup.participants_count,
            meetup.max_participants,
            meetup.available_spots.max(0)
        ),
    );
    if !meetup.description.is_empty() {
        println!("\n{}", meetup.description);
    }
}

pub async fn meetups_list(ctx: &Context, args: ListMeetupsArgs) -> Result<()> {
    if args.mine && !ctx.require_login() {
        return Ok(());
    }

    let filter = MeetupFilter {
        status: args.status,
        movie: args.movie,
        upcoming: args.upcoming,
        my_meetups: args.mine,
    };
    let meetups = MeetupApi::new(ctx.api())
        .list(&filter)
        .await
        .map_err(|e| failure(e, "Failed to load meetups"))?;

    if ctx.format == OutputFormat::Json {
        output::print_json(&meetups);
        return Ok(());
    }
    if meetups.is_empty() {
        println!("No meetups found.");
        return Ok(());
    }
    for meetup in &meetups {
        println!("{}", meetup_line(meetup));
    }
    Ok(())
}

pub async fn meetups_show(ctx: &Context, id: u64) -> Result<()> {
    let detail = MeetupApi::new(ctx.api())
        .get(id)
        .await
        .map_err(|e| failure(e, "Failed to load meetup"))?;

    if ctx.format == OutputFormat::Json {
        output::print_json(&detail);
        return Ok(());
    }

    print_meetup(&detail.meetup);
    if !detail.participants.is_empty() {
        output::print_heading("Participants");
        for participant in &detail.participants {
            println!("  {}", participant.user.display_name());
        }
    }
    if !detail.comments.is_empty() {
        output::print_heading("Comments");
        for comment in &detail.comments {
            println!("  {}: {}", comment.user.username, comment.text);
        }
    }
    Ok(())
}

pub async fn meetups_create(ctx: &Context, args: CreateMeetupArgs) -> Result<()> {
    if !ctx.require_login() {
        return Ok(());
    }

    let created = MeetupApi::new(ctx.api())
        .create(&MeetupDraft::from(args))
        .await
        .map_err(|e| failure(e, "Failed to create meetup"))?;

    if ctx.format == OutputFormat::Json {
        output::print_json(&created);
        return Ok(());
    }
    output::print_success(
        &format!(
            "Created \"{}\" on {}",
            created.title,
            local_time(&created.meetup_datetime)
        ),
        ctx.format,
    );
    Ok(())
}

pub async fn meetups_update(ctx: &Context, id: u64, args: UpdateMeetupArgs) -> Result<()> {
    if !ctx.require_login() {
        return Ok(());
    }
    let update = MeetupUpdate::from(args);
    if update.is_empty() {
        anyhow::bail!("Nothing to update");
    }

    let meetup = MeetupApi::new(ctx.api())
        .update(id, &update)
        .await
        .map_err(|e| failure(e, "Failed to update meetup"))?;

    if ctx.format == OutputFormat::Json {
        output::print_json(&meetup);
    } else {
        print_meetup(&meetup);
    }
    Ok(())
}

pub async fn meetups_delete(ctx: &Context, id: u64) -> Result<()> {
    if !ctx.require_login() {
        return Ok(());
    }
    MeetupApi::new(ctx.api())
        .delete(id)
        .await
        .map_err(|e| failure(e, "Failed to delete meetup"))?;
    output::print_success("Meetup deleted", ctx.format);
    Ok(())
}

pub async fn meetups_join(ctx: &Context, id: u64, message: Option<String>) -> Result<()> {
    if !ctx.require_login() {
        return Ok(());
    }
    MeetupApi::new(ctx.api())
        .join(id, message.as_deref().unwrap_or(""))
        .await
        .map_err(|e| failure(e, "Failed to join meetup"))?;
    output::print_success("You joined the meetup", ctx.format);
    Ok(())
}

pub async fn meetups_leave(ctx: &Context, id: u64) -> Result<()> {
    if !ctx.require_login() {
        return Ok(());
    }
    MeetupApi::new(ctx.api())
        .leave(id)
        .await
        .map_err(|e| failure(e, "Failed to leave meetup"))?;
    output::print_success("You left the meetup", ctx.format);
    Ok(())
}

pub async fn meetups_participants(ctx: &Context, id: u64) -> Result<()> {
    let participants = MeetupApi::new(ctx.api())
        .participants(id)
        .await
        .map_err(|e| failure(e, "Failed to load participants"))?;

    if ctx.format == OutputFormat::Json {
        output::print_json(&participants);
        return Ok(());
    }
    if participants.is_empty() {
        println!("Nobody has joined yet.");
        return Ok(());
    }
    for participant in &participants {
        println!(
            "{}  {:?}  {}",
            participant.user.username,
            participant.status,
            truncate(&participant.message, 60)
        );
    }
    Ok(())
}

pub async fn meetups_comment(ctx: &Context, id: u64, text: &str) -> Result<()> {
    if !ctx.require_login() {
        return Ok(());
    }
    if text.trim().is_empty() {
        anyhow::bail!("Comment text is required");
    }
    MeetupApi::new(ctx.api())
        .comment(id, text.trim())
        .await
        .map_err(|e| failure(e, "Failed to post comment"))?;
    output::print_success("Comment posted", ctx.format);
    Ok(())
}

pub async fn meetups_comments(ctx: &Context, id: u64) -> Result<()> {
    let comments = MeetupApi::new(ctx.api())
        .comments(id)
        .await
        .map_err(|e| failure(e, "Failed to load comments"))?;

    if ctx.format == OutputFormat::Json {
        output::print_json(&comments);
        return Ok(());
    }
    if comments.is_empty() {
        println!("No comments yet.");
        return Ok(());
    }
    for comment in &comments {
        let at = comment.created_at.as_ref().map(local_time).unwrap_or_default();
        println!("{}  {}: {}", at, comment.user.username, comment.text);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_when_accepts_rfc3339() {
        let at = parse_when("2030-01-01T20:00:00+02:00").unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2030, 1, 1, 18, 0, 0).unwrap());
    }

    #[test]
    fn parse_when_accepts_local_minutes() {
        let at = parse_when(" 2030-06-15 19:30 ").unwrap();
        let local = at.with_timezone(&Local);
        assert_eq!(local.format("%Y-%m-%d %H:%M").to_string(), "2030-06-15 19:30");
    }

    #[test]
    fn parse_when_rejects_garbage() {
        let err = parse_when("tomorrow evening").unwrap_err();
        assert!(err.contains("YYYY-MM-DD HH:MM"));
    }

    #[test]
    fn update_args_map_to_partial_update() {
        let update = MeetupUpdate::from(UpdateMeetupArgs {
            theater: Some("Rex".into()),
            status: Some(MeetupStatus::Cancelled),
            ..UpdateMeetupArgs::default()
        });
        assert_eq!(update.theater_name.as_deref(), Some("Rex"));
        assert_eq!(update.status, Some(MeetupStatus::Cancelled));
        assert!(update.title.is_none());
        assert!(MeetupUpdate::from(UpdateMeetupArgs::default()).is_empty());
    }
}
