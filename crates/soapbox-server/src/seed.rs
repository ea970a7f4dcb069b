//! Fill a database with demo users, posts and votes.
//!
//! Every seeded account uses the password `password123`. Existing accounts are
//! left alone, so running the seeder twice only adds votes.

mod db;

use anyhow::Result;
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::info;

use soapbox_api::password;
use soapbox_db::Database;
use soapbox_db::models::VoteOutcome;
use soapbox_types::models::VoteDirection;

const USER_NAMES: &[&str] = &[
    "Alice", "Bob", "Charlie", "Diana", "Ethan", "Fiona", "George", "Hannah", "Ivan", "Jasmine",
];
const SEED_PASSWORD: &str = "password123";
const POSTS_PER_USER: usize = 3;
const VOTE_ATTEMPTS: usize = 20;

const WORDS: &[&str] = &[
    "river", "engine", "garden", "quiet", "signal", "winter", "copper", "market", "lantern",
    "orbit", "harbor", "meadow", "rust", "thunder", "paper", "velvet", "canyon", "ember", "forest",
    "library", "bicycle", "summit", "pocket", "compass", "island", "candle", "mirror", "violin",
];

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soapbox_seed=info,soapbox_db=info".into()),
        )
        .init();

    let database_url =
        std::env::var("SOAPBOX_DATABASE_URL").unwrap_or_else(|_| "soapbox.db".into());
    let db = db::open(&database_url)?;
    let mut rng = rand::rng();

    info!("Seeding users...");
    let users = seed_users(&db)?;

    info!("Seeding posts...");
    let posts = seed_posts(&db, &users, &mut rng)?;

    info!("Seeding votes...");
    let votes = seed_votes(&db, &users, &posts, &mut rng)?;

    info!(
        "Seeding completed: {} users, {} posts, {} votes",
        users.len(),
        posts.len(),
        votes
    );
    Ok(())
}

/// Returns the ids of the users created by this run.
fn seed_users(db: &Database) -> Result<Vec<i64>> {
    let mut created = Vec::new();

    for name in USER_NAMES {
        let email = format!("{}@gmail.com", name.to_lowercase());
        if db.get_user_by_email(&email)?.is_some() {
            continue;
        }

        let password_hash = password::hash_password(SEED_PASSWORD)?;
        if let Some(id) = db.create_user(&email, &password_hash)? {
            created.push(id);
        }
    }

    Ok(created)
}

fn seed_posts(db: &Database, users: &[i64], rng: &mut impl Rng) -> Result<Vec<i64>> {
    let mut posts = Vec::with_capacity(users.len() * POSTS_PER_USER);

    for &owner_id in users {
        for _ in 0..POSTS_PER_USER {
            let title = sentence(rng, 6);
            let content = (0..3).map(|_| sentence(rng, 10)).collect::<Vec<_>>().join(" ");
            let post = db.create_post(owner_id, &title, &content, rng.random_bool(0.5))?;
            posts.push(post.id);
        }
    }

    Ok(posts)
}

/// Random (user, post) votes; pairs that already voted are skipped.
fn seed_votes(db: &Database, users: &[i64], posts: &[i64], rng: &mut impl Rng) -> Result<usize> {
    let mut added = 0;

    for _ in 0..VOTE_ATTEMPTS {
        let (Some(&user_id), Some(&post_id)) = (users.choose(rng), posts.choose(rng)) else {
            break;
        };

        if db.cast_vote(user_id, post_id, VoteDirection::Cast)? == VoteOutcome::Added {
            added += 1;
        }
    }

    Ok(added)
}

fn sentence(rng: &mut impl Rng, words: usize) -> String {
    let picked: Vec<&str> = (0..words).filter_map(|_| WORDS.choose(rng).copied()).collect();

    let mut text = picked.join(" ");
    if let Some(first) = text.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    text.push('.');
    text
}
