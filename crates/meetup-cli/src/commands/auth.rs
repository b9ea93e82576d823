//! Authentication and account commands.

use super::{failure, Context};
use crate::output::{self, or_dash, OutputFormat};
use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use meetup_api::models::{Credentials, Identity, ProfileUpdate, Registration};
use meetup_session::SessionError;
use std::io::{self, Write};
use tracing::debug;

/// Registration fields whose errors are reported first, in this order.
const REGISTRATION_FIELDS: [&str; 2] = ["username", "email"];

#[derive(Debug, Clone, Args)]
pub struct RegisterArgs {
    /// Username for the new account
    #[arg(short, long)]
    pub username: Option<String>,
    /// Email address
    #[arg(short, long)]
    pub email: Option<String>,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ProfileArgs {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub bio: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    /// Birth date (YYYY-MM-DD)
    #[arg(long)]
    pub birth_date: Option<NaiveDate>,
}

impl From<ProfileArgs> for ProfileUpdate {
    fn from(args: ProfileArgs) -> Self {
        ProfileUpdate {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            bio: args.bio,
            location: args.location,
            birth_date: args.birth_date,
        }
    }
}

fn prompt_line(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn given_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    match value {
        Some(value) => Ok(value.trim().to_string()),
        None => prompt_line(label),
    }
}

fn registration_failure(err: SessionError) -> anyhow::Error {
    if let SessionError::Api(api_err) = &err {
        if let Some(message) = api_err.field_message(&REGISTRATION_FIELDS) {
            debug!(error = %err, "Registration rejected");
            return anyhow::anyhow!(message);
        }
    }
    failure(err, "Registration failed")
}

fn print_identity(user: &Identity, format: OutputFormat) {
    if format == OutputFormat::Json {
        output::print_json(user);
        return;
    }

    output::print_heading(&user.display_name());
    output::print_row("Username", &user.username);
    output::print_row("Email", or_dash(&user.email));
    if let Some(profile) = &user.profile {
        output::print_row("Bio", or_dash(&profile.bio));
        output::print_row("Location", or_dash(&profile.location));
        if let Some(birth_date) = profile.birth_date {
            output::print_row("Birth date", &birth_date.to_string());
        }
    }
    if let Some(joined) = user.date_joined {
        output::print_row("Joined", &joined.format("%Y-%m-%d").to_string());
    }
}

/// Log in with username and password.
pub async fn login(ctx: &Context, username: Option<String>) -> Result<()> {
    if let Some(user) = ctx.session.current_user() {
        output::print_success(&format!("Already logged in as {}", user.username), ctx.format);
        return Ok(());
    }

    let username = given_or_prompt(username, "Username")?;
    if username.is_empty() {
        anyhow::bail!("Username is required");
    }
    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        anyhow::bail!("Password is required");
    }

    let payload = ctx
        .session
        .login(&Credentials { username, password })
        .await
        .map_err(|e| failure(e, "Login failed"))?;

    output::print_success(
        &format!("Logged in as {}", payload.user.display_name()),
        ctx.format,
    );
    Ok(())
}

/// Create an account and sign in.
pub async fn register(ctx: &Context, args: RegisterArgs) -> Result<()> {
    let username = given_or_prompt(args.username, "Username")?;
    let email = given_or_prompt(args.email, "Email")?;
    if username.is_empty() || email.is_empty() {
        anyhow::bail!("Username and email are required");
    }

    let password = rpassword::prompt_password("Password: ")?;
    let password2 = rpassword::prompt_password("Confirm password: ")?;

    let form = Registration {
        username,
        email,
        password,
        password2,
        first_name: args.first_name.unwrap_or_default(),
        last_name: args.last_name.unwrap_or_default(),
    };

    let payload = ctx
        .session
        .register(&form)
        .await
        .map_err(registration_failure)?;

    output::print_success(
        &format!("Welcome, {}! You are now logged in.", payload.user.display_name()),
        ctx.format,
    );
    Ok(())
}

/// Log out and forget the stored tokens.
pub async fn logout(ctx: &Context) -> Result<()> {
    ctx.session.logout().await;
    output::print_success("Logged out successfully", ctx.format);
    Ok(())
}

/// Show the signed-in user.
pub async fn whoami(ctx: &Context) -> Result<()> {
    if !ctx.require_login() {
        return Ok(());
    }
    if let Some(user) = ctx.session.current_user() {
        print_identity(&user, ctx.format);
    }
    Ok(())
}

/// Update profile fields; with no fields, show the profile.
pub async fn profile(ctx: &Context, args: ProfileArgs) -> Result<()> {
    if !ctx.require_login() {
        return Ok(());
    }

    let update = ProfileUpdate::from(args);
    let user = if update.is_empty() {
        ctx.session
            .refresh_user()
            .await
            .map_err(|e| failure(e, "Failed to load profile"))?
    } else {
        ctx.session
            .update_profile(&update)
            .await
            .map_err(|e| failure(e, "Failed to update profile"))?
    };

    print_identity(&user, ctx.format);
    Ok(())
}
