use plaza_client::{
    config::Env,
    data::DataAccess,
    feed::FeedPager,
    format::relative_time,
    session::Session,
};
use plaza_remote::{client::PlatformClient, http::HttpPlatform, ids::IdGenerator};
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("Error building HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "plaza_client=debug,plaza_remote=debug,plaza_common=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_env() -> Result<Env, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(InitError::from)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = get_env()?;

    let platform = Arc::new(HttpPlatform::new(env.platform_config())?);
    let ids = Arc::new(IdGenerator::random());

    let session = Session::init(platform.clone(), Arc::clone(&ids)).await;
    match session.current_user() {
        Some(account) => info!(user = %account.id, name = %account.name, "Signed in"),
        None => info!("Browsing anonymously"),
    }

    let client = PlatformClient::new(platform.clone(), platform, ids);
    let feed = FeedPager::new(DataAccess::new(Arc::new(client)));

    if let Err(err) = feed.load(0).await {
        warn!(%err, "Could not load the feed");
        return Ok(());
    }

    let page = feed.current();
    let now = OffsetDateTime::now_utc();
    for post in &*page.posts {
        info!(
            post = %post.id,
            author = %post.author_id,
            likes = post.likes,
            posted = %relative_time(post.created_at, now),
            "{}",
            post.content
        );
    }
    info!(
        page = page.page,
        has_next = page.has_next(),
        has_previous = page.has_previous(),
        "Feed loaded"
    );

    Ok(())
}
