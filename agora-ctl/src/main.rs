use agora_api::{
    AuthToken, CommentId, CommunityId, FeedQuery, NewComment, NewCommunity, NewPost, NewUser,
    OrderType, Page, PostId, PostPatch, SortBy, UserId, Uuid, Vote, VoteRequest,
};
use anyhow::{anyhow, Context};

#[derive(structopt::StructOpt)]
struct Opt {
    #[structopt(short, long)]
    host: String,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Create a user (needs ADMIN_TOKEN)
    CreateUser {
        /// Username
        name: String,
    },

    /// Create a community (needs ADMIN_TOKEN)
    CreateCommunity {
        name: String,

        #[structopt(short, long, default_value = "")]
        description: String,
    },

    /// Join a community, or leave it if already a member
    ToggleMembership { community: Uuid },

    /// Publish a post
    Post {
        title: String,
        description: String,

        #[structopt(short, long)]
        community: Option<Uuid>,

        /// Media URL, may be repeated
        #[structopt(short, long)]
        media: Vec<String>,
    },

    /// Edit the title or description of one of your posts
    Edit {
        post: Uuid,

        #[structopt(short, long)]
        title: Option<String>,

        #[structopt(short, long)]
        description: Option<String>,
    },

    /// Comment on a post, or reply to a comment with --parent
    Comment {
        post: Uuid,
        text: String,

        #[structopt(short, long)]
        parent: Option<Uuid>,
    },

    /// Vote on a post, or on a comment with --comment
    Vote {
        id: Uuid,

        /// "up", "down" or "none" to retract
        vote: String,

        #[structopt(short, long)]
        comment: bool,
    },

    /// List posts
    Posts {
        #[structopt(short, long)]
        community: Option<Uuid>,

        /// "creation-date", "score" or "activity"
        #[structopt(short, long, default_value = "creation-date")]
        sort: String,

        #[structopt(long)]
        asc: bool,

        #[structopt(short, long)]
        limit: Option<usize>,
    },

    /// Show the posts of your communities, or of the named community
    Feed { community: Option<String> },

    /// Show a post with all its comments
    Show { post: Uuid },
}

fn admin_token() -> anyhow::Result<AuthToken> {
    token_from_env("ADMIN_TOKEN")
}

fn user_token() -> anyhow::Result<AuthToken> {
    token_from_env("AGORA_TOKEN")
}

fn token_from_env(var: &str) -> anyhow::Result<AuthToken> {
    let tok = std::env::var(var).with_context(|| format!("retrieving {var} environment variable"))?;
    let tok = Uuid::try_parse(&tok).with_context(|| format!("parsing {var} as an auth token"))?;
    Ok(AuthToken(tok))
}

fn parse_vote(v: &str) -> anyhow::Result<Option<Vote>> {
    match v {
        "up" => Ok(Some(Vote::Up)),
        "down" => Ok(Some(Vote::Down)),
        "none" => Ok(None),
        _ => Err(anyhow!("unknown vote {v:?}, expected up, down or none")),
    }
}

fn parse_sort(s: &str) -> anyhow::Result<SortBy> {
    serde_json::from_value(serde_json::Value::String(String::from(s)))
        .with_context(|| format!("unknown sort order {s:?}"))
}

/// Turns error responses into the server-side error they carry
async fn check(resp: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.bytes().await.context("reading error response")?;
    match agora_api::Error::parse(&body) {
        Ok(err) => Err(anyhow!(err)),
        Err(_) => Err(anyhow!("server answered {status}: {body:?}")),
    }
}

fn print_json<T: serde::Serialize>(v: &T) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(v).context("serializing server response")?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = <Opt as structopt::StructOpt>::from_args();

    let client = reqwest::Client::new();
    let url = |path: &str| format!("{}/api/{path}", opt.host);

    match opt.cmd {
        Command::CreateUser { name } => {
            let id = UserId(Uuid::new_v4());
            let req = client
                .post(url("admin/create-user"))
                .json(&NewUser::new(id, name))
                .bearer_auth(admin_token()?.0);
            check(req.send().await?).await?;
            println!("{}", id.0);
        }
        Command::CreateCommunity { name, description } => {
            let id = CommunityId(Uuid::new_v4());
            let req = client
                .post(url("admin/create-community"))
                .json(&NewCommunity {
                    id,
                    name,
                    description,
                })
                .bearer_auth(admin_token()?.0);
            check(req.send().await?).await?;
            println!("{}", id.0);
        }
        Command::ToggleMembership { community } => {
            let req = client
                .post(url(&format!("communities/{community}/toggle-membership")))
                .bearer_auth(user_token()?.0);
            let member: bool = check(req.send().await?).await?.json().await?;
            println!("{}", if member { "joined" } else { "left" });
        }
        Command::Post {
            title,
            description,
            community,
            media,
        } => {
            let req = client
                .post(url("posts"))
                .json(&NewPost {
                    community: community.map(CommunityId),
                    title,
                    description,
                    media,
                })
                .bearer_auth(user_token()?.0);
            let id: PostId = check(req.send().await?).await?.json().await?;
            println!("{}", id.0);
        }
        Command::Edit {
            post,
            title,
            description,
        } => {
            let req = client
                .patch(url(&format!("posts/{post}")))
                .json(&PostPatch {
                    title,
                    description,
                    media: None,
                })
                .bearer_auth(user_token()?.0);
            check(req.send().await?).await?;
        }
        Command::Comment { post, text, parent } => {
            let req = client
                .post(url(&format!("posts/{post}/comments")))
                .json(&NewComment {
                    text,
                    parent_id: parent.map(CommentId),
                })
                .bearer_auth(user_token()?.0);
            let id: CommentId = check(req.send().await?).await?.json().await?;
            println!("{}", id.0);
        }
        Command::Vote { id, vote, comment } => {
            let entity = if comment { "comments" } else { "posts" };
            let req = client
                .post(url(&format!("{entity}/{id}/vote")))
                .json(&VoteRequest {
                    vote: parse_vote(&vote)?,
                })
                .bearer_auth(user_token()?.0);
            let count: agora_api::VoteCount = check(req.send().await?).await?.json().await?;
            println!("+{} -{} ({})", count.up, count.down, count.score());
        }
        Command::Posts {
            community,
            sort,
            asc,
            limit,
        } => {
            let q = FeedQuery {
                community: community.map(CommunityId),
                sort: parse_sort(&sort)?,
                direction: if asc { OrderType::Asc } else { OrderType::Desc },
                offset: 0,
                limit,
            };
            let req = client
                .get(url("posts"))
                .query(&q)
                .bearer_auth(user_token()?.0);
            let posts: Vec<agora_api::Post> = check(req.send().await?).await?.json().await?;
            print_json(&posts)?;
        }
        Command::Feed { community } => {
            let path = match community {
                None => String::from("feed"),
                Some(name) => format!("feed/{name}"),
            };
            let req = client
                .get(url(&path))
                .query(&Page::default())
                .bearer_auth(user_token()?.0);
            let posts: Vec<agora_api::Post> = check(req.send().await?).await?.json().await?;
            print_json(&posts)?;
        }
        Command::Show { post } => {
            let req = client
                .get(url(&format!("posts/{post}")))
                .bearer_auth(user_token()?.0);
            let post: agora_api::Post = check(req.send().await?).await?.json().await?;
            print_json(&post)?;
        }
    }

    Ok(())
}
