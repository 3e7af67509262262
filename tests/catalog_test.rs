mod common;

use cineverse_bot::db;

#[tokio::test]
async fn movie_roundtrip_and_delete() {
    let pool = common::setup_pool().await;
    let movie = common::sample_movie("m1", "Inception", 15);
    db::insert_movie(&pool, &movie).await.unwrap();

    let fetched = db::find_movie(&pool, "m1").await.unwrap().unwrap();
    assert_eq!(fetched, movie);

    assert!(db::delete_movie(&pool, "m1").await.unwrap());
    assert!(!db::delete_movie(&pool, "m1").await.unwrap());
    assert!(db::find_movie(&pool, "m1").await.unwrap().is_none());
}

#[tokio::test]
async fn series_roundtrip_preserves_season_order() {
    let pool = common::setup_pool().await;
    let series = common::sample_series("s1", "Dark", 0);
    db::insert_series(&pool, &series).await.unwrap();

    let fetched = db::find_series(&pool, "s1").await.unwrap().unwrap();
    assert_eq!(fetched, series);
    assert_eq!(fetched.seasons.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
}

#[tokio::test]
async fn rename_applies_to_the_right_item() {
    let pool = common::setup_pool().await;
    db::insert_movie(&pool, &common::sample_movie("m1", "Heat", 0))
        .await
        .unwrap();
    db::insert_movie(&pool, &common::sample_movie("m2", "Alien", 0))
        .await
        .unwrap();

    assert!(db::rename_movie(&pool, "m2", "Aliens").await.unwrap());
    assert!(!db::rename_movie(&pool, "missing", "x").await.unwrap());

    assert_eq!(db::find_movie(&pool, "m1").await.unwrap().unwrap().name, "Heat");
    assert_eq!(db::find_movie(&pool, "m2").await.unwrap().unwrap().name, "Aliens");
}

#[tokio::test]
async fn search_is_case_insensitive_substring() {
    let pool = common::setup_pool().await;
    db::insert_movie(&pool, &common::sample_movie("m1", "The Dark Knight", 0))
        .await
        .unwrap();
    db::insert_series(&pool, &common::sample_series("s1", "Dark", 0))
        .await
        .unwrap();

    let movies = db::search_movies(&pool, "dark").await.unwrap();
    assert_eq!(movies.len(), 1);
    let series = db::search_series(&pool, "DARK").await.unwrap();
    assert_eq!(series.len(), 1);
    assert!(db::search_movies(&pool, "zzz").await.unwrap().is_empty());
}

#[tokio::test]
async fn year_and_category_browsing() {
    let pool = common::setup_pool().await;
    let mut movie = common::sample_movie("m1", "Heat", 0);
    movie.year = 1995;
    movie.categories = vec!["Crime".to_string(), "Drama".to_string()];
    db::insert_movie(&pool, &movie).await.unwrap();
    db::insert_series(&pool, &common::sample_series("s1", "Dark", 0))
        .await
        .unwrap();

    // Years from both tables, newest first, deduplicated.
    assert_eq!(db::unique_years(&pool).await.unwrap(), vec![2024, 1995]);

    let cats = db::unique_categories(&pool).await.unwrap();
    assert_eq!(cats, ["Crime", "Drama"]);

    assert_eq!(db::movies_by_year(&pool, 1995).await.unwrap().len(), 1);
    assert!(db::movies_by_year(&pool, 2001).await.unwrap().is_empty());
    assert_eq!(db::series_by_year(&pool, 2024).await.unwrap().len(), 1);
    assert_eq!(
        db::movies_by_category(&pool, "Crime").await.unwrap().len(),
        1
    );
    assert_eq!(
        db::series_by_category(&pool, "Drama").await.unwrap().len(),
        1
    );
    assert!(db::series_by_category(&pool, "Crime").await.unwrap().is_empty());
}

#[tokio::test]
async fn set_season_episodes_adds_replaces_and_removes() {
    let pool = common::setup_pool().await;
    db::insert_series(&pool, &common::sample_series("s1", "Dark", 0))
        .await
        .unwrap();

    // New season.
    assert!(db::set_season_episodes(&pool, "s1", 3, vec!["e1".to_string()])
        .await
        .unwrap());
    let s = db::find_series(&pool, "s1").await.unwrap().unwrap();
    assert_eq!(s.seasons[&3], vec!["e1"]);

    // Replace an existing one.
    assert!(
        db::set_season_episodes(&pool, "s1", 1, vec!["x".to_string(), "y".to_string()])
            .await
            .unwrap()
    );
    let s = db::find_series(&pool, "s1").await.unwrap().unwrap();
    assert_eq!(s.seasons[&1], vec!["x", "y"]);

    // Empty list removes the season.
    assert!(db::set_season_episodes(&pool, "s1", 2, vec![]).await.unwrap());
    let s = db::find_series(&pool, "s1").await.unwrap().unwrap();
    assert!(!s.seasons.contains_key(&2));

    // Unknown series reports false.
    assert!(!db::set_season_episodes(&pool, "nope", 1, vec![]).await.unwrap());
}
