use std::sync::Arc;

use agora_core::{
    api::{
        Comment, CommentId, Community, CommunityId, Entity, FeedQuery, NewComment, NewCommunity,
        NewPost, NewUser, Page, Post, PostId, PostPatch, User, UserId, Uuid, VoteCount,
        VoteRequest,
    },
    Forum, Membership,
};
use agora_directory::Directory;
use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{extractors::*, Error};

pub async fn admin_create_user(
    AdminAuth: AdminAuth,
    State(directory): State<Arc<Directory>>,
    Json(data): Json<NewUser>,
) -> Result<(), Error> {
    Ok(directory.create_user(data)?)
}

pub async fn admin_create_community(
    AdminAuth: AdminAuth,
    State(directory): State<Arc<Directory>>,
    Json(data): Json<NewCommunity>,
) -> Result<(), Error> {
    Ok(directory.create_community(data)?)
}

pub async fn whoami(Auth(user): Auth) -> Json<UserId> {
    Json(user)
}

pub async fn fetch_users(
    Auth(_): Auth,
    State(directory): State<Arc<Directory>>,
) -> Json<Vec<User>> {
    Json(directory.users())
}

pub async fn fetch_communities(
    Auth(_): Auth,
    State(directory): State<Arc<Directory>>,
) -> Json<Vec<Community>> {
    Json(directory.communities())
}

pub async fn toggle_membership(
    Auth(user): Auth,
    State(directory): State<Arc<Directory>>,
    Path(community): Path<Uuid>,
) -> Result<Json<bool>, Error> {
    Ok(Json(
        directory.toggle_membership(&user, &CommunityId(community))?,
    ))
}

pub async fn create_post(
    Auth(user): Auth,
    State(forum): State<Arc<Forum>>,
    Json(p): Json<NewPost>,
) -> Result<Json<PostId>, Error> {
    Ok(Json(forum.create_post(user, p)?))
}

pub async fn list_posts(
    Auth(_): Auth,
    State(forum): State<Arc<Forum>>,
    Query(q): Query<FeedQuery>,
) -> Result<Json<Vec<Post>>, Error> {
    Ok(Json(
        tokio::task::spawn_blocking(move || forum.feeds().posts_without_comments(&q))
            .await
            .with_context(|| format!("listing posts for {q:?}"))?,
    ))
}

pub async fn fetch_post(
    Auth(_): Auth,
    State(forum): State<Arc<Forum>>,
    Path(post): Path<Uuid>,
) -> Result<Json<Post>, Error> {
    Ok(Json(forum.get_post_detail(PostId(post))?))
}

pub async fn update_post(
    Auth(user): Auth,
    State(forum): State<Arc<Forum>>,
    Path(post): Path<Uuid>,
    Json(patch): Json<PostPatch>,
) -> Result<(), Error> {
    Ok(forum.update_post(PostId(post), user, patch)?)
}

pub async fn fetch_comments(
    Auth(_): Auth,
    State(forum): State<Arc<Forum>>,
    Path(post): Path<Uuid>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Comment>>, Error> {
    Ok(Json(forum.get_comments(PostId(post), page)?))
}

pub async fn submit_comment(
    Auth(user): Auth,
    State(forum): State<Arc<Forum>>,
    Path(post): Path<Uuid>,
    Json(c): Json<NewComment>,
) -> Result<Json<CommentId>, Error> {
    Ok(Json(forum.submit_comment(PostId(post), user, c)?))
}

pub async fn vote_post(
    Auth(user): Auth,
    State(forum): State<Arc<Forum>>,
    Path(post): Path<Uuid>,
    Json(v): Json<VoteRequest>,
) -> Result<Json<VoteCount>, Error> {
    Ok(Json(forum.vote(Entity::Post(PostId(post)), user, v.vote)?))
}

pub async fn vote_comment(
    Auth(user): Auth,
    State(forum): State<Arc<Forum>>,
    Path(comment): Path<Uuid>,
    Json(v): Json<VoteRequest>,
) -> Result<Json<VoteCount>, Error> {
    Ok(Json(forum.vote(
        Entity::Comment(CommentId(comment)),
        user,
        v.vote,
    )?))
}

pub async fn user_feed(
    Auth(user): Auth,
    State(forum): State<Arc<Forum>>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Post>>, Error> {
    Ok(Json(
        tokio::task::spawn_blocking(move || forum.feeds().feed_for_user(&user, page))
            .await
            .with_context(|| format!("assembling feed for {user:?}"))?,
    ))
}

pub async fn community_feed(
    Auth(_): Auth,
    State(forum): State<Arc<Forum>>,
    Path(name): Path<String>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Post>>, Error> {
    Ok(Json(
        tokio::task::spawn_blocking(move || forum.feeds().community_feed(&name, page))
            .await
            .context("assembling community feed")?,
    ))
}
