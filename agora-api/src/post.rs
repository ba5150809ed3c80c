use uuid::Uuid;

use crate::{Comment, CommunityId, Error, Time, UserId, VoteCount};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct PostId(pub Uuid);

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Post {
    pub id: PostId,
    pub community: Option<CommunityId>,
    pub author_id: UserId,
    pub date: Time,
    pub edited: Option<Time>,

    pub title: String,
    pub description: String,
    pub media: Vec<String>,

    pub votes: VoteCount,

    /// Total number of comments in the tree, at any depth
    pub num_comments: usize,

    /// The whole thread in pre-order, see `Comment`. Empty in list views.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewPost {
    #[serde(default)]
    pub community: Option<CommunityId>,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub media: Vec<String>,
}

impl NewPost {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_required("title", &self.title, crate::MAX_TITLE_LEN)?;
        crate::validate_required("description", &self.description, crate::MAX_TEXT_LEN)?;
        crate::validate_media(&self.media)
    }
}

/// Partial update of a post: fields left to None are not touched
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PostPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub media: Option<Vec<String>>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.media.is_none()
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.is_empty() {
            return Err(Error::EmptyPatch);
        }
        if let Some(title) = &self.title {
            crate::validate_required("title", title, crate::MAX_TITLE_LEN)?;
        }
        if let Some(description) = &self.description {
            crate::validate_required("description", description, crate::MAX_TEXT_LEN)?;
        }
        if let Some(media) = &self.media {
            crate::validate_media(media)?;
        }
        Ok(())
    }
}
