// Exercises PgStore against a live database. Needs DATABASE_URL:
//   DATABASE_URL=postgres://... cargo test --test 40_postgres -- --ignored
//
// Tables are shared, so every test tags its titles with a fresh uuid and only
// looks at its own rows.
use anyhow::{Context, Result};
use uuid::Uuid;

use movie_reviews_api::config::AppConfig;
use movie_reviews_api::database::models::{
    Actor, Genre, MoviePatch, MovieWithReviews, NewMovie, NewReview, NewUser,
};
use movie_reviews_api::database::{PgStore, Store, StoreError};

async fn connect() -> Result<PgStore> {
    let url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set for store tests")?;
    let mut database = AppConfig::development().database;
    database.url = Some(url);
    database.max_connections = 2;
    Ok(PgStore::connect(&database).await?)
}

fn tag() -> String {
    Uuid::new_v4().simple().to_string()
}

fn new_movie(title: &str) -> NewMovie {
    NewMovie {
        title: title.to_string(),
        release_date: 1982,
        genre: Genre::ScienceFiction,
        actors: (1..=3)
            .map(|i| Actor {
                actor_name: format!("Actor {}", i),
                character_name: format!("Role {}", i),
            })
            .collect(),
        image_url: None,
    }
}

fn new_review(movie_id: Uuid, rating: i32) -> NewReview {
    NewReview {
        movie_id: movie_id.to_string(),
        user_name: "pg-test".to_string(),
        review: format!("{} stars", rating),
        rating,
    }
}

async fn cleanup(store: &PgStore, titles: &[String]) -> Result<()> {
    for title in titles {
        if let Some(movie) = store.delete_movie_by_title(title).await? {
            for review in store.list_reviews(&movie.id.to_string()).await? {
                store.delete_review(review.id).await?;
            }
        }
    }
    Ok(())
}

fn own<'a>(listed: &'a [MovieWithReviews], titles: &[String]) -> Vec<&'a MovieWithReviews> {
    listed.iter().filter(|m| titles.contains(&m.movie.title)).collect()
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn aggregate_orders_by_average_then_title_with_unrated_last() -> Result<()> {
    let store = connect().await?;
    let t = tag();
    // Inserted out of order so the result order comes from the query
    let titles = vec![format!("{} C", t), format!("{} B", t), format!("{} A", t)];

    store.insert_movie(new_movie(&titles[0])).await?;
    let b = store.insert_movie(new_movie(&titles[1])).await?;
    let a = store.insert_movie(new_movie(&titles[2])).await?;

    store.insert_review(new_review(b.id, 4)).await?;
    for rating in [5, 3, 4] {
        store.insert_review(new_review(a.id, rating)).await?;
    }

    let listed = store.list_movies_with_reviews().await?;
    let mine = own(&listed, &titles);
    let order: Vec<&str> = mine.iter().map(|m| m.movie.title.as_str()).collect();
    assert_eq!(order, [titles[2].as_str(), titles[1].as_str(), titles[0].as_str()]);

    assert_eq!(mine[0].avg_rating, Some(4.0));
    assert_eq!(mine[0].reviews.len(), 3);
    assert_eq!(mine[1].avg_rating, Some(4.0));
    assert_eq!(mine[2].avg_rating, None);
    assert!(mine[2].reviews.is_empty());

    cleanup(&store, &titles).await
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn single_movie_aggregate_maps_reviews_and_average() -> Result<()> {
    let store = connect().await?;
    let titles = vec![format!("{} rated", tag()), format!("{} unrated", tag())];

    let rated = store.insert_movie(new_movie(&titles[0])).await?;
    let unrated = store.insert_movie(new_movie(&titles[1])).await?;
    for rating in [5, 3, 4] {
        store.insert_review(new_review(rated.id, rating)).await?;
    }

    let found = store.find_movie_with_reviews(rated.id).await?.context("rated movie missing")?;
    assert_eq!(found.movie, rated);
    assert_eq!(found.avg_rating, Some(4.0));
    let mut ratings: Vec<i32> = found.reviews.iter().map(|r| r.rating).collect();
    ratings.sort_unstable();
    assert_eq!(ratings, [3, 4, 5]);
    assert!(found.reviews.iter().all(|r| r.movie_id == rated.id.to_string()));

    let bare = store.find_movie_with_reviews(unrated.id).await?.context("unrated movie missing")?;
    assert_eq!(bare.movie.actors.len(), 3);
    assert!(bare.reviews.is_empty());
    assert_eq!(bare.avg_rating, None);

    assert!(store.find_movie_with_reviews(Uuid::new_v4()).await?.is_none());

    cleanup(&store, &titles).await
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn unique_title_violation_is_duplicate() -> Result<()> {
    let store = connect().await?;
    let titles = vec![format!("{} original", tag()), format!("{} other", tag())];

    store.insert_movie(new_movie(&titles[0])).await?;
    let err = store.insert_movie(new_movie(&titles[0])).await.unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)), "unexpected error: {:?}", err);

    let other = store.insert_movie(new_movie(&titles[1])).await?;
    let rename = MoviePatch {
        title: Some(titles[0].clone()),
        ..Default::default()
    };
    let err = store.update_movie(other.id, rename).await.unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)), "unexpected error: {:?}", err);

    cleanup(&store, &titles).await
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_username_is_duplicate() -> Result<()> {
    let store = connect().await?;
    let username = format!("pg-{}", tag());
    let user = NewUser {
        name: None,
        username: username.clone(),
        password_hash: "$2b$04$notarealhashnotarealhashnotarealhashnotarealhash".to_string(),
    };

    store.insert_user(user.clone()).await?;
    let err = store.insert_user(user).await.unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)), "unexpected error: {:?}", err);
    assert!(store.find_user_by_username(&username).await?.is_some());
    Ok(())
}
