//! Catalog store: movies and series persisted in SQLite.
//!
//! Every lookup re-reads current state; nothing is cached, so handlers always
//! see the result of the latest admin edit.
use crate::model::{Movie, Series};
use anyhow::{Context, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use tracing::instrument;

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let pool = SqlitePool::connect(&normalized).await?;
    // Enable WAL and stricter durability.
    sqlx::query("PRAGMA journal_mode=WAL;").execute(&pool).await?;
    sqlx::query("PRAGMA synchronous=FULL;").execute(&pool).await?;
    Ok(pool)
}

/// For a file-backed SQLite URL, make sure the parent directory exists.
/// In-memory URLs and non-sqlite schemes pass through untouched.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return url.to_string();
    }
    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);
    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };
    if path_part.is_empty() {
        return url.to_string();
    }
    if let Some(parent) = std::path::Path::new(path_part).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }
    let mut rebuilt = String::from("sqlite://");
    rebuilt.push_str(path_part);
    if let Some(q) = query_part {
        rebuilt.push('?');
        rebuilt.push_str(q);
    }
    rebuilt
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn movie_from_row(row: &SqliteRow) -> Result<Movie> {
    let categories: String = row.get("categories");
    let videos: String = row.get("videos");
    Ok(Movie {
        id: row.get("id"),
        name: row.get("name"),
        year: row.get("year"),
        categories: serde_json::from_str(&categories).context("bad categories json")?,
        cover_file_id: row.get("cover_file_id"),
        timer_minutes: row.get::<i64, _>("timer_minutes") as u32,
        videos: serde_json::from_str(&videos).context("bad videos json")?,
    })
}

fn series_from_row(row: &SqliteRow) -> Result<Series> {
    let categories: String = row.get("categories");
    let seasons: String = row.get("seasons");
    Ok(Series {
        id: row.get("id"),
        name: row.get("name"),
        year: row.get("year"),
        categories: serde_json::from_str(&categories).context("bad categories json")?,
        cover_file_id: row.get("cover_file_id"),
        timer_minutes: row.get::<i64, _>("timer_minutes") as u32,
        seasons: serde_json::from_str(&seasons).context("bad seasons json")?,
    })
}

#[instrument(skip_all)]
pub async fn insert_movie(pool: &Pool, movie: &Movie) -> Result<()> {
    sqlx::query(
        "INSERT INTO movies (id, name, year, categories, cover_file_id, timer_minutes, videos) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&movie.id)
    .bind(&movie.name)
    .bind(movie.year)
    .bind(serde_json::to_string(&movie.categories)?)
    .bind(&movie.cover_file_id)
    .bind(movie.timer_minutes as i64)
    .bind(serde_json::to_string(&movie.videos)?)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn all_movies(pool: &Pool) -> Result<Vec<Movie>> {
    let rows = sqlx::query("SELECT * FROM movies ORDER BY created_at, name")
        .fetch_all(pool)
        .await?;
    rows.iter().map(movie_from_row).collect()
}

pub async fn find_movie(pool: &Pool, id: &str) -> Result<Option<Movie>> {
    let row = sqlx::query("SELECT * FROM movies WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(movie_from_row).transpose()
}

pub async fn rename_movie(pool: &Pool, id: &str, name: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE movies SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_movie(pool: &Pool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM movies WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn search_movies(pool: &Pool, query: &str) -> Result<Vec<Movie>> {
    let pattern = format!("%{}%", query.to_lowercase());
    let rows = sqlx::query("SELECT * FROM movies WHERE lower(name) LIKE ? ORDER BY name")
        .bind(pattern)
        .fetch_all(pool)
        .await?;
    rows.iter().map(movie_from_row).collect()
}

pub async fn movies_by_year(pool: &Pool, year: i32) -> Result<Vec<Movie>> {
    let rows = sqlx::query("SELECT * FROM movies WHERE year = ? ORDER BY name")
        .bind(year)
        .fetch_all(pool)
        .await?;
    rows.iter().map(movie_from_row).collect()
}

pub async fn movies_by_category(pool: &Pool, category: &str) -> Result<Vec<Movie>> {
    let movies = all_movies(pool).await?;
    Ok(movies
        .into_iter()
        .filter(|m| m.categories.iter().any(|c| c == category))
        .collect())
}

#[instrument(skip_all)]
pub async fn insert_series(pool: &Pool, series: &Series) -> Result<()> {
    sqlx::query(
        "INSERT INTO series (id, name, year, categories, cover_file_id, timer_minutes, seasons) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&series.id)
    .bind(&series.name)
    .bind(series.year)
    .bind(serde_json::to_string(&series.categories)?)
    .bind(&series.cover_file_id)
    .bind(series.timer_minutes as i64)
    .bind(serde_json::to_string(&series.seasons)?)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn all_series(pool: &Pool) -> Result<Vec<Series>> {
    let rows = sqlx::query("SELECT * FROM series ORDER BY created_at, name")
        .fetch_all(pool)
        .await?;
    rows.iter().map(series_from_row).collect()
}

pub async fn find_series(pool: &Pool, id: &str) -> Result<Option<Series>> {
    let row = sqlx::query("SELECT * FROM series WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(series_from_row).transpose()
}

pub async fn rename_series(pool: &Pool, id: &str, name: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE series SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_series(pool: &Pool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM series WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn search_series(pool: &Pool, query: &str) -> Result<Vec<Series>> {
    let pattern = format!("%{}%", query.to_lowercase());
    let rows = sqlx::query("SELECT * FROM series WHERE lower(name) LIKE ? ORDER BY name")
        .bind(pattern)
        .fetch_all(pool)
        .await?;
    rows.iter().map(series_from_row).collect()
}

pub async fn series_by_year(pool: &Pool, year: i32) -> Result<Vec<Series>> {
    let rows = sqlx::query("SELECT * FROM series WHERE year = ? ORDER BY name")
        .bind(year)
        .fetch_all(pool)
        .await?;
    rows.iter().map(series_from_row).collect()
}

pub async fn series_by_category(pool: &Pool, category: &str) -> Result<Vec<Series>> {
    let series = all_series(pool).await?;
    Ok(series
        .into_iter()
        .filter(|s| s.categories.iter().any(|c| c == category))
        .collect())
}

/// Replace the episode list of one season. An empty list removes the season.
pub async fn set_season_episodes(
    pool: &Pool,
    series_id: &str,
    season: u32,
    episodes: Vec<String>,
) -> Result<bool> {
    let Some(mut series) = find_series(pool, series_id).await? else {
        return Ok(false);
    };
    if episodes.is_empty() {
        series.seasons.remove(&season);
    } else {
        series.seasons.insert(season, episodes);
    }
    update_seasons(pool, series_id, &series.seasons).await
}

async fn update_seasons(
    pool: &Pool,
    series_id: &str,
    seasons: &BTreeMap<u32, Vec<String>>,
) -> Result<bool> {
    let result = sqlx::query("UPDATE series SET seasons = ? WHERE id = ?")
        .bind(serde_json::to_string(seasons)?)
        .bind(series_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Distinct release years across movies and series, newest first.
pub async fn unique_years(pool: &Pool) -> Result<Vec<i32>> {
    let years: Vec<i32> = sqlx::query_scalar(
        "SELECT DISTINCT year FROM (SELECT year FROM movies UNION SELECT year FROM series) \
         ORDER BY year DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(years)
}

/// Distinct categories across movies and series, sorted.
pub async fn unique_categories(pool: &Pool) -> Result<Vec<String>> {
    let mut set = std::collections::BTreeSet::new();
    for movie in all_movies(pool).await? {
        set.extend(movie.categories);
    }
    for series in all_series(pool).await? {
        set.extend(series.categories);
    }
    Ok(set.into_iter().collect())
}
