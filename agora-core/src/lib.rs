mod collab;
pub use collab::{Identity, Membership};

mod comment;
pub use comment::Comment;

mod feed;
pub use feed::{FeedAssembler, Listed};

mod order;
pub use order::OrderExt;

mod post;
pub use post::Post;

mod store;
pub use store::{Forum, ForumConfig};

mod tree;
pub use tree::{CommentTree, DepthFirst};

mod votes;
pub use votes::VoteLedger;

pub mod api {
    pub use agora_api::*;
}

pub mod prelude {
    pub use crate::{Identity, Membership, OrderExt};
}
