use crate::{
    api::{self, CommentId, Time, UserId},
    VoteLedger,
};

/// A single comment. Its position in the thread is kept by the `CommentTree`
/// that holds it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Comment {
    pub id: CommentId,

    /// Set by the tree on insertion
    pub parent_id: Option<CommentId>,

    pub author_id: UserId,
    pub date: Time,
    pub text: String,

    pub votes: VoteLedger,
}

impl Comment {
    pub fn new(id: CommentId, author_id: UserId, date: Time, text: String) -> Comment {
        Comment {
            id,
            parent_id: None,
            author_id,
            date,
            text,
            votes: VoteLedger::new(),
        }
    }

    pub fn to_api(&self, depth: usize, num_replies: usize) -> api::Comment {
        api::Comment {
            id: self.id,
            parent_id: self.parent_id,
            depth,
            author_id: self.author_id,
            date: self.date,
            text: self.text.clone(),
            votes: self.votes.count(),
            num_replies,
        }
    }
}
