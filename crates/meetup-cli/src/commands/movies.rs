//! Movie catalogue, TMDB and favorites commands.

use super::{failure, Context};
use crate::output::{self, or_dash, truncate, OutputFormat};
use anyhow::Result;
use meetup_api::models::{FavoriteOutcome, Movie, NewRating, TmdbMovie, TmdbPage};
use meetup_api::MovieApi;

fn movie_line(movie: &Movie) -> String {
    let year = movie
        .release_date
        .map(|d| d.format(" (%Y)").to_string())
        .unwrap_or_default();
    let rating = match (movie.average_user_rating, movie.rating) {
        (Some(users), _) => format!("{:.1}/5", users),
        (None, Some(tmdb)) => format!("{:.1}/10 TMDB", tmdb),
        (None, None) => "-".to_string(),
    };
    format!("{:>6}  {}{}  {}", movie.id, truncate(&movie.title, 48), year, rating)
}

fn tmdb_line(movie: &TmdbMovie) -> String {
    let year = movie.year().map(|y| format!(" ({})", y)).unwrap_or_default();
    let votes = movie
        .vote_average
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| "-".to_string());
    format!("{:>8}  {}{}  {}", movie.id, truncate(&movie.title, 48), year, votes)
}

fn print_movies(movies: &[Movie], format: OutputFormat) {
    if format == OutputFormat::Json {
        output::print_json(movies);
        return;
    }
    if movies.is_empty() {
        println!("No movies found.");
        return;
    }
    for movie in movies {
        println!("{}", movie_line(movie));
    }
}

fn print_tmdb_page(page: &TmdbPage<TmdbMovie>, format: OutputFormat) {
    if format == OutputFormat::Json {
        output::print_json(page);
        return;
    }
    if page.results.is_empty() {
        println!("No movies found.");
        return;
    }
    for movie in &page.results {
        println!("{}", tmdb_line(movie));
    }
    if page.total_pages > 1 {
        println!("\nPage {} of {}", page.page, page.total_pages);
    }
}

/// List the local catalogue, or search it by title.
pub async fn movies_list(ctx: &Context, query: Option<String>, page: Option<u32>) -> Result<()> {
    let api = MovieApi::new(ctx.api());
    let movies = match query {
        Some(query) => api.search(&query).await,
        None => api.list(page).await,
    }
    .map_err(|e| failure(e, "Failed to load movies"))?;

    print_movies(&movies, ctx.format);
    Ok(())
}

/// Search TMDB.
pub async fn movies_search(ctx: &Context, query: &str) -> Result<()> {
    let page = MovieApi::new(ctx.api())
        .search_tmdb(query)
        .await
        .map_err(|e| failure(e, "Search failed"))?;
    print_tmdb_page(&page, ctx.format);
    Ok(())
}

/// Popular movies on TMDB.
pub async fn movies_popular(ctx: &Context, page: u32) -> Result<()> {
    let page = MovieApi::new(ctx.api())
        .popular(page)
        .await
        .map_err(|e| failure(e, "Failed to load popular movies"))?;
    print_tmdb_page(&page, ctx.format);
    Ok(())
}

/// Show one movie: a catalogue entry, or a TMDB entry with `tmdb`.
pub async fn movies_show(ctx: &Context, id: u64, tmdb: bool) -> Result<()> {
    let api = MovieApi::new(ctx.api());

    if tmdb {
        let movie = api
            .tmdb_details(id)
            .await
            .map_err(|e| failure(e, "Failed to load movie details"))?;
        if ctx.format == OutputFormat::Json {
            output::print_json(&movie);
            return Ok(());
        }
        output::print_heading(&movie.title);
        output::print_row("TMDB id", &movie.id.to_string());
        output::print_row("Released", or_dash(movie.release_date.as_deref().unwrap_or("")));
        if let Some(runtime) = movie.runtime {
            output::print_row("Runtime", &format!("{} min", runtime));
        }
        if let Some(votes) = movie.vote_average {
            output::print_row("Rating", &format!("{:.1}/10", votes));
        }
        if !movie.overview.is_empty() {
            println!("\n{}", movie.overview);
        }
        return Ok(());
    }

    let detail = api
        .get(id)
        .await
        .map_err(|e| failure(e, "Failed to load movie details"))?;
    if ctx.format == OutputFormat::Json {
        output::print_json(&detail);
        return Ok(());
    }

    let movie = &detail.movie;
    output::print_heading(&movie.title);
    output::print_row("Id", &movie.id.to_string());
    if let Some(date) = movie.release_date {
        output::print_row("Released", &date.to_string());
    }
    output::print_row("Genre", or_dash(&movie.genre));
    if let Some(duration) = movie.duration {
        output::print_row("Duration", &format!("{} min", duration));
    }
    if let Some(rating) = movie.rating {
        output::print_row("TMDB rating", &format!("{:.1}/10", rating));
    }
    if let Some(average) = movie.average_user_rating {
        output::print_row(
            "User rating",
            &format!("{:.1}/5 ({} ratings)", average, detail.ratings_count),
        );
    }
    if !movie.description.is_empty() {
        println!("\n{}", movie.description);
    }
    Ok(())
}

pub async fn movies_recommendations(ctx: &Context, tmdb_id: u64, page: u32) -> Result<()> {
    let page = MovieApi::new(ctx.api())
        .tmdb_recommendations(tmdb_id, page)
        .await
        .map_err(|e| failure(e, "Failed to load recommendations"))?;
    print_tmdb_page(&page, ctx.format);
    Ok(())
}

pub async fn movies_reviews(ctx: &Context, tmdb_id: u64, page: u32) -> Result<()> {
    let page = MovieApi::new(ctx.api())
        .tmdb_reviews(tmdb_id, page)
        .await
        .map_err(|e| failure(e, "Failed to load reviews"))?;

    if ctx.format == OutputFormat::Json {
        output::print_json(&page);
        return Ok(());
    }
    if page.results.is_empty() {
        println!("No reviews yet.");
        return Ok(());
    }
    for review in &page.results {
        output::print_heading(or_dash(&review.author));
        println!("{}", truncate(&review.content, 400));
    }
    Ok(())
}

/// The signed-in user's favorite movies.
pub async fn movies_favorites(ctx: &Context) -> Result<()> {
    if !ctx.require_login() {
        return Ok(());
    }
    let favorites = MovieApi::new(ctx.api())
        .favorites()
        .await
        .map_err(|e| failure(e, "Failed to load favorites"))?;

    if ctx.format == OutputFormat::Json {
        output::print_json(&favorites);
        return Ok(());
    }
    let movies: Vec<Movie> = favorites.into_iter().map(|f| f.movie).collect();
    print_movies(&movies, ctx.format);
    Ok(())
}

pub async fn movies_favorite(ctx: &Context, movie_id: u64) -> Result<()> {
    if !ctx.require_login() {
        return Ok(());
    }
    let outcome = MovieApi::new(ctx.api())
        .add_favorite(movie_id)
        .await
        .map_err(|e| failure(e, "Failed to add favorite"))?;

    let message = match outcome {
        FavoriteOutcome::Added(favorite) => format!("Added {} to favorites", favorite.movie.title),
        FavoriteOutcome::AlreadyFavorite => "Already in favorites".to_string(),
    };
    output::print_success(&message, ctx.format);
    Ok(())
}

pub async fn movies_unfavorite(ctx: &Context, movie_id: u64) -> Result<()> {
    if !ctx.require_login() {
        return Ok(());
    }
    MovieApi::new(ctx.api())
        .remove_favorite(movie_id)
        .await
        .map_err(|e| failure(e, "Failed to remove favorite"))?;
    output::print_success("Removed from favorites", ctx.format);
    Ok(())
}

/// Rate a movie from 1 to 5, optionally with a review.
pub async fn movies_rate(
    ctx: &Context,
    movie_id: u64,
    rating: u8,
    review: Option<String>,
) -> Result<()> {
    if !ctx.require_login() {
        return Ok(());
    }
    if !(1..=5).contains(&rating) {
        anyhow::bail!("Rating must be between 1 and 5");
    }

    MovieApi::new(ctx.api())
        .rate(&NewRating {
            movie: movie_id,
            rating,
            review: review.unwrap_or_default(),
        })
        .await
        .map_err(|e| failure(e, "Failed to submit rating"))?;
    output::print_success("Rating saved", ctx.format);
    Ok(())
}

pub async fn movies_ratings(ctx: &Context, movie_id: u64) -> Result<()> {
    let ratings = MovieApi::new(ctx.api())
        .ratings(movie_id)
        .await
        .map_err(|e| failure(e, "Failed to load ratings"))?;

    if ctx.format == OutputFormat::Json {
        output::print_json(&ratings);
        return Ok(());
    }
    if ratings.is_empty() {
        println!("No ratings yet.");
        return Ok(());
    }
    for rating in &ratings {
        let author = rating
            .user
            .as_ref()
            .map(|u| u.username.clone())
            .unwrap_or_else(|| "anonymous".to_string());
        println!("{} {}/5  {}", author, rating.rating, truncate(&rating.review, 80));
    }
    Ok(())
}
