use chrono::Utc;

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<Utc>;

mod auth;
pub use auth::AuthToken;

mod comment;
pub use comment::{replies_of, Comment, CommentId, NewComment};

mod community;
pub use community::{Community, CommunityId, NewCommunity};

mod error;
pub use error::{Error, ErrorKind};

mod post;
pub use post::{NewPost, Post, PostId, PostPatch};

mod query;
pub use query::{FeedQuery, Order, OrderType, Page, SortBy, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

mod user;
pub use user::{NewUser, User, UserId};

mod vote;
pub use vote::{Entity, Vote, VoteCount, VoteRequest};

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

pub const MAX_NAME_LEN: usize = 64;
pub const MAX_TITLE_LEN: usize = 300;
pub const MAX_TEXT_LEN: usize = 40_000;
pub const MAX_MEDIA_PER_POST: usize = 32;
pub const MAX_MEDIA_URL_LEN: usize = 2048;

// All the `validate` functions throughout agora-api run at the request
// boundary, before anything reaches the core. A request that fails them must
// not have mutated anything.

pub(crate) fn validate_string(s: &str) -> Result<(), Error> {
    if s.contains('\0') {
        return Err(Error::NullByteInString(String::from(s)));
    }
    Ok(())
}

/// Validates a field that must hold some non-whitespace text of at most `max`
/// characters
pub(crate) fn validate_required(field: &str, s: &str, max: usize) -> Result<(), Error> {
    validate_string(s)?;
    if s.trim().is_empty() {
        return Err(Error::EmptyField(String::from(field)));
    }
    if s.chars().count() > max {
        return Err(Error::TooLong {
            field: String::from(field),
            max,
        });
    }
    Ok(())
}

/// User and community names: short, and restricted to characters that are
/// safe in an url path segment
pub(crate) fn validate_name(name: &str) -> Result<(), Error> {
    validate_required("name", name, MAX_NAME_LEN)?;
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(Error::InvalidName(String::from(name)));
    }
    Ok(())
}

pub(crate) fn validate_media(media: &[String]) -> Result<(), Error> {
    if media.len() > MAX_MEDIA_PER_POST {
        return Err(Error::TooLong {
            field: String::from("media"),
            max: MAX_MEDIA_PER_POST,
        });
    }
    for m in media {
        validate_required("media", m, MAX_MEDIA_URL_LEN)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_fields() {
        assert_eq!(
            validate_required("title", "", 10),
            Err(Error::EmptyField(String::from("title")))
        );
        assert_eq!(
            validate_required("title", "  \n", 10),
            Err(Error::EmptyField(String::from("title")))
        );
        assert_eq!(
            validate_required("title", "a\0b", 10),
            Err(Error::NullByteInString(String::from("a\0b")))
        );
        assert_eq!(
            validate_required("title", "éééé", 3),
            Err(Error::TooLong {
                field: String::from("title"),
                max: 3
            })
        );
        assert_eq!(validate_required("title", "éé", 3), Ok(()));
    }

    #[test]
    fn names() {
        assert_eq!(validate_name("rust-lang_fans.2"), Ok(()));
        assert_eq!(
            validate_name("with space"),
            Err(Error::InvalidName(String::from("with space")))
        );
        assert_eq!(
            validate_name("a/b"),
            Err(Error::InvalidName(String::from("a/b")))
        );
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn media_list() {
        assert_eq!(validate_media(&[]), Ok(()));
        assert_eq!(
            validate_media(&[String::from("https://cdn.example/a.png")]),
            Ok(())
        );
        assert_eq!(
            validate_media(&[String::new()]),
            Err(Error::EmptyField(String::from("media")))
        );
        assert!(validate_media(&vec![String::from("u"); MAX_MEDIA_PER_POST + 1]).is_err());
    }
}
