//! Movie Meetup CLI - browse movies and organize meetups from the terminal.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use commands::{
    Context, CreateMeetupArgs, ListMeetupsArgs, ProfileArgs, RegisterArgs, Settings,
    UpdateMeetupArgs,
};
use meetup_config_and_utils::init_logging;
use std::path::PathBuf;
use tracing::debug;

/// Movie Meetup CLI - find movies, meet people who want to watch them.
#[derive(Parser)]
#[command(name = "moviemeetup")]
#[command(about = "Movie Meetup CLI for movies, favorites and meetups")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Directory for config, tokens and logs (default ~/.moviemeetup)
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// API base URL, e.g. http://localhost:8000/api
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Keep tokens in memory only for this run
    #[arg(long, global = true)]
    ephemeral: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with username and password
    Login {
        /// Username (prompted when omitted)
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Create an account
    Register(RegisterArgs),

    /// Logout and clear session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Show or update your profile
    Profile(ProfileArgs),

    /// Browse movies and manage favorites
    Movies {
        #[command(subcommand)]
        command: MovieCommands,
    },

    /// Find, organize and join meetups
    Meetups {
        #[command(subcommand)]
        command: MeetupCommands,
    },
}

#[derive(Subcommand)]
enum MovieCommands {
    /// List the movie catalogue
    List {
        /// Filter by title
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long)]
        page: Option<u32>,
    },
    /// Search TMDB
    Search {
        query: String,
    },
    /// Popular movies on TMDB
    Popular {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Show movie details
    Show {
        /// Movie ID
        id: u64,
        /// Treat the ID as a TMDB ID
        #[arg(long)]
        tmdb: bool,
    },
    /// Movies similar to a TMDB movie
    Recommendations {
        /// TMDB ID
        tmdb_id: u64,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// TMDB reviews of a movie
    Reviews {
        /// TMDB ID
        tmdb_id: u64,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// List your favorite movies
    Favorites,
    /// Add a movie to your favorites
    Favorite {
        /// Movie ID
        id: u64,
    },
    /// Remove a movie from your favorites
    Unfavorite {
        /// Movie ID
        id: u64,
    },
    /// Rate a movie from 1 to 5
    Rate {
        /// Movie ID
        id: u64,
        rating: u8,
        #[arg(short, long)]
        review: Option<String>,
    },
    /// List ratings of a movie
    Ratings {
        /// Movie ID
        id: u64,
    },
}

#[derive(Subcommand)]
enum MeetupCommands {
    /// List meetups
    List(ListMeetupsArgs),
    /// Show meetup details
    Show {
        /// Meetup ID
        id: u64,
    },
    /// Organize a meetup
    Create(CreateMeetupArgs),
    /// Change a meetup you organize
    Update {
        /// Meetup ID
        id: u64,
        #[command(flatten)]
        args: UpdateMeetupArgs,
    },
    /// Delete a meetup you organize
    Delete {
        /// Meetup ID
        id: u64,
    },
    /// Join a meetup
    Join {
        /// Meetup ID
        id: u64,
        /// Note for the organizer
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Leave a meetup
    Leave {
        /// Meetup ID
        id: u64,
    },
    /// List participants of a meetup
    Participants {
        /// Meetup ID
        id: u64,
    },
    /// Comment on a meetup
    Comment {
        /// Meetup ID
        id: u64,
        text: String,
    },
    /// List comments on a meetup
    Comments {
        /// Meetup ID
        id: u64,
    },
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            base_dir: self.base_dir.clone(),
            api_url: self.api_url.clone(),
            log_level: self.log_level.clone(),
            ephemeral: self.ephemeral,
            format: self.format,
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = cli.settings();
    let paths = settings.paths()?;
    paths.ensure_dirs()?;
    let config = settings.config(&paths)?;

    init_logging(&config.log_level, Some(paths.log_file()), false);
    debug!(api_base_url = %config.api_base_url, "Starting");

    let ctx = Context::open(&settings, &paths, &config).await?;

    match cli.command {
        Commands::Login { username } => commands::login(&ctx, username).await,
        Commands::Register(args) => commands::register(&ctx, args).await,
        Commands::Logout => commands::logout(&ctx).await,
        Commands::Whoami => commands::whoami(&ctx).await,
        Commands::Profile(args) => commands::profile(&ctx, args).await,
        Commands::Movies { command } => match command {
            MovieCommands::List { search, page } => {
                commands::movies_list(&ctx, search, page).await
            }
            MovieCommands::Search { query } => commands::movies_search(&ctx, &query).await,
            MovieCommands::Popular { page } => commands::movies_popular(&ctx, page).await,
            MovieCommands::Show { id, tmdb } => commands::movies_show(&ctx, id, tmdb).await,
            MovieCommands::Recommendations { tmdb_id, page } => {
                commands::movies_recommendations(&ctx, tmdb_id, page).await
            }
            MovieCommands::Reviews { tmdb_id, page } => {
                commands::movies_reviews(&ctx, tmdb_id, page).await
            }
            MovieCommands::Favorites => commands::movies_favorites(&ctx).await,
            MovieCommands::Favorite { id } => commands::movies_favorite(&ctx, id).await,
            MovieCommands::Unfavorite { id } => commands::movies_unfavorite(&ctx, id).await,
            MovieCommands::Rate { id, rating, review } => {
                commands::movies_rate(&ctx, id, rating, review).await
            }
            MovieCommands::Ratings { id } => commands::movies_ratings(&ctx, id).await,
        },
        Commands::Meetups { command } => match command {
            MeetupCommands::List(args) => commands::meetups_list(&ctx, args).await,
            MeetupCommands::Show { id } => commands::meetups_show(&ctx, id).await,
            MeetupCommands::Create(args) => commands::meetups_create(&ctx, args).await,
            MeetupCommands::Update { id, args } => commands::meetups_update(&ctx, id, args).await,
            MeetupCommands::Delete { id } => commands::meetups_delete(&ctx, id).await,
            MeetupCommands::Join { id, message } => {
                commands::meetups_join(&ctx, id, message).await
            }
            MeetupCommands::Leave { id } => commands::meetups_leave(&ctx, id).await,
            MeetupCommands::Participants { id } => commands::meetups_participants(&ctx, id).await,
            MeetupCommands::Comment { id, text } => {
                commands::meetups_comment(&ctx, id, &text).await
            }
            MeetupCommands::Comments { id } => commands::meetups_comments(&ctx, id).await,
        },
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = cli.format;

    if let Err(e) = run(cli).await {
        output::print_error(&e.to_string(), format);
        std::process::exit(1);
    }
}
