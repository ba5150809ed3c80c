use std::{net::SocketAddr, sync::Arc};

use agora_core::{
    api::{AuthToken, Uuid},
    Forum, ForumConfig,
};
use agora_directory::Directory;
use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod error;
mod extractors;
mod fuzz;
mod handlers;

pub use error::Error;

#[derive(structopt::StructOpt)]
struct Opt {
    /// Address to listen on
    #[structopt(long, env = "AGORA_LISTEN", default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    /// Token granting access to the admin routes. Admin routes are disabled
    /// if unset.
    #[structopt(long, env = "ADMIN_TOKEN")]
    admin_token: Option<Uuid>,

    /// Page size used when a listing request does not ask for one
    #[structopt(long, env = "AGORA_COMMENT_PAGE_SIZE", default_value = "50")]
    page_size: usize,

    /// Largest page size a listing request may ask for
    #[structopt(long, env = "AGORA_MAX_PAGE_SIZE", default_value = "200")]
    max_page_size: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opt = <Opt as structopt::StructOpt>::from_args();
    if opt.page_size == 0 || opt.page_size > opt.max_page_size {
        anyhow::bail!(
            "page size {} must be positive and at most the max page size {}",
            opt.page_size,
            opt.max_page_size
        );
    }
    if opt.admin_token.is_none() {
        tracing::warn!("no admin token set, user and community creation is disabled");
    }

    let directory = Arc::new(Directory::new());
    let forum = Arc::new(Forum::with_config(
        ForumConfig {
            default_page_size: opt.page_size,
            max_page_size: opt.max_page_size,
        },
        directory.clone(),
        directory.clone(),
    ));
    let app = app(forum, directory, opt.admin_token.map(AuthToken));

    tracing::info!("listening on {}", opt.listen);
    axum::Server::bind(&opt.listen)
        .serve(app.into_make_service())
        .await
        .context("serving axum webserver")
}

pub fn app(
    forum: Arc<Forum>,
    directory: Arc<Directory>,
    admin_token: Option<AuthToken>,
) -> Router {
    use handlers::*;
    let state = extractors::AppState {
        forum,
        directory,
        admin_token,
    };
    Router::new()
        .route("/api/admin/create-user", post(admin_create_user))
        .route("/api/admin/create-community", post(admin_create_community))
        .route("/api/whoami", get(whoami))
        .route("/api/users", get(fetch_users))
        .route("/api/communities", get(fetch_communities))
        .route(
            "/api/communities/:id/toggle-membership",
            post(toggle_membership),
        )
        .route("/api/posts", post(create_post).get(list_posts))
        .route("/api/posts/:id", get(fetch_post).patch(update_post))
        .route(
            "/api/posts/:id/comments",
            get(fetch_comments).post(submit_comment),
        )
        .route("/api/posts/:id/vote", post(vote_post))
        .route("/api/comments/:id/vote", post(vote_comment))
        .route("/api/feed", get(user_feed))
        .route("/api/feed/:community", get(community_feed))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
