#![cfg(test)]

use std::{
    cmp,
    collections::{BTreeMap, HashMap, HashSet},
    fmt::Debug,
    ops::RangeTo,
    panic::AssertUnwindSafe,
    sync::Arc,
};

use agora_core::{
    api::{
        self, CommentId, CommunityId, Entity, Error as ApiError, NewComment, NewCommunity,
        NewPost, NewUser, PostId, UserId, Uuid, Vote, VoteCount, VoteRequest, DEFAULT_PAGE_SIZE,
    },
    Forum,
};
use agora_directory::Directory;
use axum::{
    extract::FromRequestParts,
    http::{self, request},
    Router,
};
use tower::{Service, ServiceExt};
use bolero::generator::TypeGenerator;

use crate::{app, extractors::*, Error};

macro_rules! do_tokio_test {
    ( $name:ident, $gen:expr, $fn:expr ) => {
        #[test]
        fn $name() {
            let runtime = AssertUnwindSafe(
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("failed initializing tokio runtime"),
            );
            bolero::check!()
                .with_generator($gen)
                .cloned()
                .for_each(move |v| {
                    let () = runtime.block_on($fn(v));
                })
        }
    };
}

do_tokio_test!(
    fuzz_preauth_extractor,
    bolero::generator::gen::<String>(),
    |token| async move {
        if let Ok(req) = http::Request::builder()
            .method(http::Method::GET)
            .uri("/")
            .header(http::header::AUTHORIZATION, token)
            .body(())
        {
            let mut req = req.into_parts().0;
            let res = PreAuth::from_request_parts(&mut req, &()).await;
            match res {
                Ok(_) => (),
                Err(Error::Api(ApiError::PermissionDenied)) => (),
                Err(e) => panic!("got unexpected error: {e}"),
            }
        }
    }
);

async fn call<Req, Resp>(
    app: &mut Router,
    req: request::Request<axum::body::Body>,
    req_body: &Req,
) -> Result<Resp, ApiError>
where
    Req: Debug,
    Resp: 'static + for<'de> serde::Deserialize<'de>,
{
    app.ready().await.expect("waiting for app to be ready");
    let resp = app.call(req).await.expect("running request");
    let status = resp.status();
    let body = hyper::body::to_bytes(resp.into_body())
        .await
        .expect("recovering resp bytes");
    if status == http::StatusCode::OK {
        if std::any::TypeId::of::<Resp>() == std::any::TypeId::of::<()>() {
            // the server returns an empty body in this situation, which does not parse properly with serde_json
            return Ok(serde_json::from_slice(b"null").unwrap());
        } else {
            return Ok(serde_json::from_slice(&body).unwrap_or_else(|err| {
                panic!(
                    r#"
                        Failed parsing resp body!

                        The error is the following:
                        ---
                        {err}
                        ---

                        Response body is:
                        ---
                        {body:?}
                        ---

                        Request was:
                        ---
                        {req_body:?}
                        ---
                    "#
                )
            }));
        }
    }
    let err = ApiError::parse(&body)
        .unwrap_or_else(|err| panic!("parsing error response body {err}, body is {body:?}"));
    assert_eq!(
        status,
        err.status_code(),
        "status code does not match error {err:?}"
    );
    Err(err)
}

async fn run_on_app<Req, Resp>(
    app: &mut Router,
    method: &str,
    uri: &str,
    token: Option<Uuid>,
    body: &Req,
) -> Result<Resp, ApiError>
where
    Req: Debug + serde::Serialize,
    Resp: 'static + for<'de> serde::Deserialize<'de>,
{
    let req = request::Builder::new()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    let req = match token {
        Some(token) => req.header(http::header::AUTHORIZATION, format!("bearer {token}")),
        None => req,
    };
    let req = req
        .body(axum::body::Body::from(
            serde_json::to_vec(body).expect("serializing request body to json"),
        ))
        .expect("building request");
    call(app, req, body).await
}

fn test_app() -> (Uuid, Router) {
    let admin_token = Uuid::new_v4();
    let directory = Arc::new(Directory::new());
    let forum = Arc::new(Forum::new(directory.clone(), directory.clone()));
    (
        admin_token,
        app(forum, directory, Some(api::AuthToken(admin_token))),
    )
}

async fn create_user(app: &mut Router, admin: Uuid, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    let () = run_on_app(
        app,
        "POST",
        "/api/admin/create-user",
        Some(admin),
        &NewUser::new(UserId(id), String::from(name)),
    )
    .await
    .expect("creating user");
    id
}

async fn create_community(app: &mut Router, admin: Uuid, name: &str) -> CommunityId {
    let id = CommunityId(Uuid::new_v4());
    let () = run_on_app(
        app,
        "POST",
        "/api/admin/create-community",
        Some(admin),
        &NewCommunity {
            id,
            name: String::from(name),
            description: String::new(),
        },
    )
    .await
    .expect("creating community");
    id
}

fn new_post(community: Option<CommunityId>, title: &str) -> NewPost {
    NewPost {
        community,
        title: String::from(title),
        description: String::from("description"),
        media: Vec::new(),
    }
}

#[tokio::test]
async fn thread_and_votes_over_http() {
    let (admin, mut app) = test_app();
    let u = create_user(&mut app, admin, "alice").await;

    let post: PostId = run_on_app(&mut app, "POST", "/api/posts", Some(u), &new_post(None, "T"))
        .await
        .unwrap();
    let comments_uri = format!("/api/posts/{}/comments", post.0);
    let c1: CommentId = run_on_app(
        &mut app,
        "POST",
        &comments_uri,
        Some(u),
        &NewComment {
            text: String::from("hi"),
            parent_id: None,
        },
    )
    .await
    .unwrap();
    let r1: CommentId = run_on_app(
        &mut app,
        "POST",
        &comments_uri,
        Some(u),
        &NewComment {
            text: String::from("hello"),
            parent_id: Some(c1),
        },
    )
    .await
    .unwrap();

    let vote_uri = format!("/api/comments/{}/vote", c1.0);
    let down = VoteRequest {
        vote: Some(Vote::Down),
    };
    let up = VoteRequest {
        vote: Some(Vote::Up),
    };
    let count: VoteCount = run_on_app(&mut app, "POST", &vote_uri, Some(u), &down)
        .await
        .unwrap();
    assert_eq!(count, VoteCount { up: 0, down: 1 });
    let count: VoteCount = run_on_app(&mut app, "POST", &vote_uri, Some(u), &up)
        .await
        .unwrap();
    assert_eq!(count, VoteCount { up: 1, down: 0 });

    let detail: api::Post = run_on_app(
        &mut app,
        "GET",
        &format!("/api/posts/{}", post.0),
        Some(u),
        &(),
    )
    .await
    .unwrap();
    assert_eq!(detail.comments.len(), 2);
    assert_eq!(detail.comments[0].id, c1);
    assert_eq!(detail.comments[0].votes, VoteCount { up: 1, down: 0 });
    assert_eq!(detail.comments[0].num_replies, 1);
    assert_eq!(detail.comments[1].id, r1);
    assert_eq!(detail.comments[1].parent_id, Some(c1));
    assert_eq!(detail.comments[1].depth, 1);
    assert_eq!(detail.comments[1].text, "hello");

    let missing = Uuid::new_v4();
    let res: Result<CommentId, _> = run_on_app(
        &mut app,
        "POST",
        &comments_uri,
        Some(u),
        &NewComment {
            text: String::from("orphan"),
            parent_id: Some(CommentId(missing)),
        },
    )
    .await;
    assert_eq!(res, Err(ApiError::CommentNotFound(missing)));

    let list: Vec<api::Post> = run_on_app(&mut app, "GET", "/api/posts", Some(u), &())
        .await
        .unwrap();
    assert_eq!(list.len(), 1);
    assert!(list[0].comments.is_empty());
    assert_eq!(list[0].num_comments, 2);
}

#[tokio::test]
async fn deep_thread_over_http() {
    const DEPTH: usize = 500;
    let (admin, mut app) = test_app();
    let u = create_user(&mut app, admin, "alice").await;
    let post: PostId = run_on_app(&mut app, "POST", "/api/posts", Some(u), &new_post(None, "T"))
        .await
        .unwrap();
    let comments_uri = format!("/api/posts/{}/comments", post.0);
    let mut parent_id = None;
    for i in 0..DEPTH {
        let id: CommentId = run_on_app(
            &mut app,
            "POST",
            &comments_uri,
            Some(u),
            &NewComment {
                text: format!("level {i}"),
                parent_id,
            },
        )
        .await
        .unwrap();
        parent_id = Some(id);
    }

    let detail: api::Post = run_on_app(
        &mut app,
        "GET",
        &format!("/api/posts/{}", post.0),
        Some(u),
        &(),
    )
    .await
    .unwrap();
    assert_eq!(detail.num_comments, DEPTH);
    assert_eq!(detail.comments.len(), DEPTH);
    assert_eq!(detail.comments.last().map(|c| c.id), parent_id);
    assert!(detail.comments.iter().enumerate().all(|(i, c)| c.depth == i));

    let page: Vec<api::Comment> = run_on_app(&mut app, "GET", &comments_uri, Some(u), &())
        .await
        .unwrap();
    assert_eq!(page, detail.comments);
}

#[tokio::test]
async fn feeds_over_http() {
    let (admin, mut app) = test_app();
    let u = create_user(&mut app, admin, "alice").await;
    let rust = create_community(&mut app, admin, "rust").await;
    let go = create_community(&mut app, admin, "go").await;
    for (c, title) in [(rust, "r1"), (go, "g1"), (rust, "r2")] {
        let _: PostId = run_on_app(
            &mut app,
            "POST",
            "/api/posts",
            Some(u),
            &new_post(Some(c), title),
        )
        .await
        .unwrap();
    }

    let feed: Vec<api::Post> = run_on_app(&mut app, "GET", "/api/feed", Some(u), &())
        .await
        .unwrap();
    assert!(feed.is_empty());

    let joined: bool = run_on_app(
        &mut app,
        "POST",
        &format!("/api/communities/{}/toggle-membership", rust.0),
        Some(u),
        &(),
    )
    .await
    .unwrap();
    assert!(joined);
    let feed: Vec<api::Post> = run_on_app(&mut app, "GET", "/api/feed?limit=1", Some(u), &())
        .await
        .unwrap();
    assert_eq!(
        feed.iter().map(|p| p.title.as_str()).collect::<Vec<_>>(),
        vec!["r2"]
    );

    let feed: Vec<api::Post> = run_on_app(&mut app, "GET", "/api/feed/go", Some(u), &())
        .await
        .unwrap();
    assert_eq!(
        feed.iter().map(|p| p.title.as_str()).collect::<Vec<_>>(),
        vec!["g1"]
    );

    let list: Vec<api::Post> = run_on_app(
        &mut app,
        "GET",
        &format!("/api/posts?community={}&direction=asc", rust.0),
        Some(u),
        &(),
    )
    .await
    .unwrap();
    assert_eq!(
        list.iter().map(|p| p.title.as_str()).collect::<Vec<_>>(),
        vec!["r1", "r2"]
    );
}

#[tokio::test]
async fn errors_over_http() {
    let (admin, mut app) = test_app();
    let u = create_user(&mut app, admin, "alice").await;
    let other = create_user(&mut app, admin, "bob").await;

    let res: Result<(), _> = run_on_app(
        &mut app,
        "POST",
        "/api/admin/create-user",
        Some(u),
        &NewUser::new(UserId(Uuid::new_v4()), String::from("eve")),
    )
    .await;
    assert_eq!(res, Err(ApiError::PermissionDenied));

    let res: Result<(), _> = run_on_app(
        &mut app,
        "POST",
        "/api/admin/create-user",
        Some(admin),
        &NewUser::new(UserId(Uuid::new_v4()), String::from("alice")),
    )
    .await;
    assert_eq!(res, Err(ApiError::NameAlreadyUsed(String::from("alice"))));

    let res: Result<UserId, _> = run_on_app(&mut app, "GET", "/api/whoami", None, &()).await;
    assert_eq!(res, Err(ApiError::PermissionDenied));
    let res: Result<UserId, _> =
        run_on_app(&mut app, "GET", "/api/whoami", Some(Uuid::new_v4()), &()).await;
    assert_eq!(res, Err(ApiError::PermissionDenied));
    let me: UserId = run_on_app(&mut app, "GET", "/api/whoami", Some(u), &())
        .await
        .unwrap();
    assert_eq!(me, UserId(u));

    let res: Result<PostId, _> =
        run_on_app(&mut app, "POST", "/api/posts", Some(u), &new_post(None, " ")).await;
    assert_eq!(res, Err(ApiError::EmptyField(String::from("title"))));

    let post: PostId = run_on_app(&mut app, "POST", "/api/posts", Some(u), &new_post(None, "T"))
        .await
        .unwrap();
    let patch = api::PostPatch {
        title: Some(String::from("hijacked")),
        ..api::PostPatch::default()
    };
    let res: Result<(), _> = run_on_app(
        &mut app,
        "PATCH",
        &format!("/api/posts/{}", post.0),
        Some(other),
        &patch,
    )
    .await;
    assert_eq!(res, Err(ApiError::PermissionDenied));

    let missing = Uuid::new_v4();
    let res: Result<api::Post, _> = run_on_app(
        &mut app,
        "GET",
        &format!("/api/posts/{missing}"),
        Some(u),
        &(),
    )
    .await;
    assert_eq!(res, Err(ApiError::PostNotFound(missing)));

    let res: Result<VoteCount, _> = run_on_app(
        &mut app,
        "POST",
        &format!("/api/comments/{missing}/vote"),
        Some(u),
        &VoteRequest { vote: None },
    )
    .await;
    assert_eq!(res, Err(ApiError::CommentNotFound(missing)));
}

fn compare<T>(name: &str, app_res: Result<T, ApiError>, mock_res: Result<T, ApiError>)
where
    T: Debug + PartialEq,
{
    assert_eq!(
        app_res, mock_res,
        "app and mock did not return the same result for {name}"
    );
}

fn resize_int(fuzz_id: usize, RangeTo { end }: RangeTo<usize>) -> Option<usize> {
    if end == 0 {
        return None;
    }
    let bucket_size = cmp::max(1, usize::MAX / end); // in case we rounded to 0
    let id = fuzz_id / bucket_size;
    Some(cmp::min(id, end - 1)) // in case id was actually over end - 1 due to rounding
}

fn count(votes: &HashMap<UserId, Vote>) -> VoteCount {
    let up = votes.values().filter(|v| **v == Vote::Up).count();
    VoteCount {
        up,
        down: votes.len() - up,
    }
}

fn cast(votes: &mut HashMap<UserId, Vote>, user: UserId, vote: Option<Vote>) -> VoteCount {
    match vote {
        Some(v) => votes.insert(user, v),
        None => votes.remove(&user),
    };
    count(votes)
}

struct MockPost {
    id: PostId,
    community: Option<CommunityId>,
    title: String,
    votes: HashMap<UserId, Vote>,

    /// In creation order
    comments: Vec<CommentId>,
}

struct MockComment {
    post: PostId,
    parent: Option<CommentId>,
    text: String,
    votes: HashMap<UserId, Vote>,
}

/// Flat model of the forum: no tree, only parent links and one vote map per
/// entity. Ids are the ones the app handed out.
#[derive(Default)]
struct Mock {
    users: BTreeMap<UserId, String>,
    communities: BTreeMap<CommunityId, String>,
    members: HashSet<(UserId, CommunityId)>,

    /// In creation order
    posts: Vec<MockPost>,
    comments: HashMap<CommentId, MockComment>,
}

impl Mock {
    fn create_user(&mut self, u: &NewUser) -> Result<(), ApiError> {
        u.validate()?;
        if self.users.values().any(|n| *n == u.name) {
            return Err(ApiError::NameAlreadyUsed(u.name.clone()));
        }
        if self.users.contains_key(&u.id) {
            return Err(ApiError::UuidAlreadyUsed(u.id.0));
        }
        self.users.insert(u.id, u.name.clone());
        Ok(())
    }

    fn create_community(&mut self, c: &NewCommunity) -> Result<(), ApiError> {
        c.validate()?;
        if self.communities.values().any(|n| *n == c.name) {
            return Err(ApiError::NameAlreadyUsed(c.name.clone()));
        }
        if self.communities.contains_key(&c.id) {
            return Err(ApiError::UuidAlreadyUsed(c.id.0));
        }
        self.communities.insert(c.id, c.name.clone());
        Ok(())
    }

    fn toggle_membership(&mut self, user: UserId, community: CommunityId) -> bool {
        if self.members.remove(&(user, community)) {
            false
        } else {
            self.members.insert((user, community));
            true
        }
    }

    fn check_post(&self, p: &NewPost) -> Result<(), ApiError> {
        p.validate()?;
        match p.community {
            Some(c) if !self.communities.contains_key(&c) => {
                Err(ApiError::CommunityNotFound(c.0))
            }
            _ => Ok(()),
        }
    }

    fn add_post(&mut self, id: PostId, p: NewPost) {
        self.posts.push(MockPost {
            id,
            community: p.community,
            title: p.title,
            votes: HashMap::new(),
            comments: Vec::new(),
        });
    }

    fn check_comment(&self, post: PostId, c: &NewComment) -> Result<(), ApiError> {
        c.validate()?;
        match c.parent_id {
            Some(parent) if self.comments.get(&parent).map(|p| p.post) != Some(post) => {
                Err(ApiError::CommentNotFound(parent.0))
            }
            _ => Ok(()),
        }
    }

    fn add_comment(&mut self, post: usize, id: CommentId, c: NewComment) {
        let p = &mut self.posts[post];
        p.comments.push(id);
        self.comments.insert(
            id,
            MockComment {
                post: p.id,
                parent: c.parent_id,
                text: c.text,
                votes: HashMap::new(),
            },
        );
    }

    fn vote(&mut self, entity: Entity, user: UserId, vote: Option<Vote>) -> VoteCount {
        match entity {
            Entity::Post(id) => {
                let p = self
                    .posts
                    .iter_mut()
                    .find(|p| p.id == id)
                    .expect("voting on a post the mock never saw");
                cast(&mut p.votes, user, vote)
            }
            Entity::Comment(id) => {
                let c = self
                    .comments
                    .get_mut(&id)
                    .expect("voting on a comment the mock never saw");
                cast(&mut c.votes, user, vote)
            }
        }
    }

    /// (title, votes, number of comments) of the first page of `user`'s feed
    fn feed(&self, user: UserId) -> Vec<(String, VoteCount, usize)> {
        self.posts
            .iter()
            .rev()
            .filter(|p| matches!(p.community, Some(c) if self.members.contains(&(user, c))))
            .take(DEFAULT_PAGE_SIZE)
            .map(|p| (p.title.clone(), count(&p.votes), p.comments.len()))
            .collect()
    }

    /// (id, parent, depth, text, votes) of each comment of `post`, in the
    /// order a reader sees them
    fn thread(
        &self,
        post: &MockPost,
    ) -> Vec<(CommentId, Option<CommentId>, usize, String, VoteCount)> {
        let mut children: HashMap<Option<CommentId>, Vec<CommentId>> = HashMap::new();
        for id in &post.comments {
            children.entry(self.comments[id].parent).or_default().push(*id);
        }
        let mut res = Vec::with_capacity(post.comments.len());
        let mut stack = Vec::new();
        if let Some(roots) = children.get(&None) {
            stack.extend(roots.iter().rev().map(|id| (0, *id)));
        }
        while let Some((depth, id)) = stack.pop() {
            let c = &self.comments[&id];
            res.push((id, c.parent, depth, c.text.clone(), count(&c.votes)));
            if let Some(replies) = children.get(&Some(id)) {
                stack.extend(replies.iter().rev().map(|r| (depth + 1, *r)));
            }
        }
        res
    }
}

#[derive(Clone, Debug, bolero::generator::TypeGenerator)]
enum Target {
    Post(usize),
    Comment(usize),
}

#[derive(Clone, Debug, bolero::generator::TypeGenerator)]
enum FuzzOp {
    CreateUser {
        #[generator(bolero::generator::gen_with::<String>().len(1..20usize))]
        name: String,
    },
    CreateCommunity {
        #[generator(bolero::generator::gen_with::<String>().len(1..20usize))]
        name: String,
    },
    ToggleMembership {
        uid: usize,
        cid: usize,
    },
    CreatePost {
        uid: usize,
        cid: Option<usize>,
        #[generator(bolero::generator::gen_with::<String>().len(0..20usize))]
        title: String,
    },
    Comment {
        uid: usize,
        pid: usize,
        parent: Option<usize>,
        #[generator(bolero::generator::gen_with::<String>().len(0..20usize))]
        text: String,
    },
    Vote {
        uid: usize,
        target: Target,
        vote: Option<Vote>,
    },
    Feed {
        uid: usize,
    },
}

struct ComparativeFuzzer {
    admin_token: Uuid,
    app: Router,
    mock: Mock,
    users: Vec<UserId>,
    communities: Vec<CommunityId>,

    /// Every comment ever created, across all posts
    comments: Vec<CommentId>,
}

impl ComparativeFuzzer {
    fn new() -> ComparativeFuzzer {
        let (admin_token, app) = test_app();
        ComparativeFuzzer {
            admin_token,
            app,
            mock: Mock::default(),
            users: Vec::new(),
            communities: Vec::new(),
            comments: Vec::new(),
        }
    }

    fn user(&self, uid: usize) -> Option<UserId> {
        resize_int(uid, ..self.users.len()).map(|u| self.users[u])
    }

    async fn execute_fuzz_op(&mut self, op: FuzzOp) {
        match op {
            FuzzOp::CreateUser { name } => {
                let new_user = NewUser::new(UserId(Uuid::new_v4()), name);
                let app_res = run_on_app(
                    &mut self.app,
                    "POST",
                    "/api/admin/create-user",
                    Some(self.admin_token),
                    &new_user,
                )
                .await;
                let mock_res = self.mock.create_user(&new_user);
                if mock_res.is_ok() {
                    self.users.push(new_user.id);
                }
                compare("CreateUser", app_res, mock_res);
            }
            FuzzOp::CreateCommunity { name } => {
                let new_community = NewCommunity {
                    id: CommunityId(Uuid::new_v4()),
                    name,
                    description: String::new(),
                };
                let app_res = run_on_app(
                    &mut self.app,
                    "POST",
                    "/api/admin/create-community",
                    Some(self.admin_token),
                    &new_community,
                )
                .await;
                let mock_res = self.mock.create_community(&new_community);
                if mock_res.is_ok() {
                    self.communities.push(new_community.id);
                }
                compare("CreateCommunity", app_res, mock_res);
            }
            FuzzOp::ToggleMembership { uid, cid } => {
                let (Some(user), Some(cid)) =
                    (self.user(uid), resize_int(cid, ..self.communities.len()))
                else {
                    return;
                };
                let community = self.communities[cid];
                let app_res: Result<bool, _> = run_on_app(
                    &mut self.app,
                    "POST",
                    &format!("/api/communities/{}/toggle-membership", community.0),
                    Some(user.0),
                    &(),
                )
                .await;
                let mock_res = Ok(self.mock.toggle_membership(user, community));
                compare("ToggleMembership", app_res, mock_res);
            }
            FuzzOp::CreatePost { uid, cid, title } => {
                let Some(user) = self.user(uid) else {
                    return;
                };
                let community = cid
                    .and_then(|c| resize_int(c, ..self.communities.len()))
                    .map(|c| self.communities[c]);
                let p = NewPost {
                    community,
                    title,
                    description: String::from("description"),
                    media: Vec::new(),
                };
                let app_res: Result<PostId, _> =
                    run_on_app(&mut self.app, "POST", "/api/posts", Some(user.0), &p).await;
                let mock_res = self.mock.check_post(&p);
                compare("CreatePost", app_res.as_ref().map(|_| ()).map_err(Clone::clone), mock_res);
                if let Ok(id) = app_res {
                    self.mock.add_post(id, p);
                }
            }
            FuzzOp::Comment {
                uid,
                pid,
                parent,
                text,
            } => {
                let (Some(user), Some(pid)) =
                    (self.user(uid), resize_int(pid, ..self.mock.posts.len()))
                else {
                    return;
                };
                // parents may live under another post, which must fail
                let c = NewComment {
                    text,
                    parent_id: parent
                        .and_then(|c| resize_int(c, ..self.comments.len()))
                        .map(|c| self.comments[c]),
                };
                let post = self.mock.posts[pid].id;
                let app_res: Result<CommentId, _> = run_on_app(
                    &mut self.app,
                    "POST",
                    &format!("/api/posts/{}/comments", post.0),
                    Some(user.0),
                    &c,
                )
                .await;
                let mock_res = self.mock.check_comment(post, &c);
                compare("Comment", app_res.as_ref().map(|_| ()).map_err(Clone::clone), mock_res);
                if let Ok(id) = app_res {
                    self.comments.push(id);
                    self.mock.add_comment(pid, id, c);
                }
            }
            FuzzOp::Vote { uid, target, vote } => {
                let Some(user) = self.user(uid) else {
                    return;
                };
                let (uri, entity) = match target {
                    Target::Post(p) => {
                        let Some(p) = resize_int(p, ..self.mock.posts.len()) else {
                            return;
                        };
                        let id = self.mock.posts[p].id;
                        (format!("/api/posts/{}/vote", id.0), Entity::Post(id))
                    }
                    Target::Comment(c) => {
                        let Some(c) = resize_int(c, ..self.comments.len()) else {
                            return;
                        };
                        let id = self.comments[c];
                        (format!("/api/comments/{}/vote", id.0), Entity::Comment(id))
                    }
                };
                let app_res = run_on_app(
                    &mut self.app,
                    "POST",
                    &uri,
                    Some(user.0),
                    &VoteRequest { vote },
                )
                .await;
                let mock_res = Ok(self.mock.vote(entity, user, vote));
                compare("Vote", app_res, mock_res);
            }
            FuzzOp::Feed { uid } => {
                let Some(user) = self.user(uid) else {
                    return;
                };
                let app_res: Result<Vec<api::Post>, _> =
                    run_on_app(&mut self.app, "GET", "/api/feed", Some(user.0), &()).await;
                let app_res = app_res.map(|posts| {
                    posts
                        .into_iter()
                        .map(|p| (p.title, p.votes, p.num_comments))
                        .collect::<Vec<_>>()
                });
                compare("Feed", app_res, Ok(self.mock.feed(user)));
            }
        }
    }

    /// Every post must end up with the same thread and the same counts on
    /// both sides
    async fn check_posts(&mut self) {
        let Some(&user) = self.users.first() else {
            return;
        };
        for post in &self.mock.posts {
            let app: api::Post = run_on_app(
                &mut self.app,
                "GET",
                &format!("/api/posts/{}", post.id.0),
                Some(user.0),
                &(),
            )
            .await
            .expect("fetching post from app");
            assert_eq!(app.title, post.title);
            assert_eq!(app.votes, count(&post.votes));
            assert_eq!(app.num_comments, post.comments.len());
            let app_thread = app
                .comments
                .into_iter()
                .map(|c| (c.id, c.parent_id, c.depth, c.text, c.votes))
                .collect::<Vec<_>>();
            assert_eq!(app_thread, self.mock.thread(post));
        }
    }
}

do_tokio_test!(
    compare_with_mock,
    bolero::generator::gen_with::<Vec<FuzzOp>>().len(1..100usize),
    |test: Vec<FuzzOp>| async move {
        let mut fuzzer = ComparativeFuzzer::new();
        for op in test {
            fuzzer.execute_fuzz_op(op).await;
        }
        fuzzer.check_posts().await;
    }
);
