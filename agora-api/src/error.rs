use std::str::FromStr;

use anyhow::{anyhow, Context};
use serde_json::json;
use uuid::Uuid;

/// Coarse classification of an `Error`, as seen by callers deciding what to
/// do about a failed request
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    PermissionDenied,
    Unknown,
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Post not found {0}")]
    PostNotFound(Uuid),

    #[error("Comment not found {0}")]
    CommentNotFound(Uuid),

    #[error("User not found {0}")]
    UserNotFound(Uuid),

    #[error("Community not found {0}")]
    CommunityNotFound(Uuid),

    #[error("Required field is empty: {0}")]
    EmptyField(String),

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),

    #[error("Field {field} is longer than {max} characters")]
    TooLong { field: String, max: usize },

    #[error("Invalid character in name {0:?}")]
    InvalidName(String),

    #[error("Patch does not change anything")]
    EmptyPatch,

    #[error("Uuid already used {0}")]
    UuidAlreadyUsed(Uuid),

    #[error("Name already used {0}")]
    NameAlreadyUsed(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Unknown(_) => ErrorKind::Unknown,
            Error::PermissionDenied => ErrorKind::PermissionDenied,
            Error::PostNotFound(_)
            | Error::CommentNotFound(_)
            | Error::UserNotFound(_)
            | Error::CommunityNotFound(_) => ErrorKind::NotFound,
            Error::EmptyField(_)
            | Error::NullByteInString(_)
            | Error::TooLong { .. }
            | Error::InvalidName(_)
            | Error::EmptyPatch => ErrorKind::Validation,
            Error::UuidAlreadyUsed(_) | Error::NameAlreadyUsed(_) => ErrorKind::Conflict,
        }
    }

    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "message": msg,
                "type": "unknown",
            }),
            Error::PermissionDenied => json!({
                "message": "permission denied",
                "type": "permission-denied",
            }),
            Error::PostNotFound(u) => json!({
                "message": "post not found",
                "type": "post-not-found",
                "uuid": u,
            }),
            Error::CommentNotFound(u) => json!({
                "message": "comment not found",
                "type": "comment-not-found",
                "uuid": u,
            }),
            Error::UserNotFound(u) => json!({
                "message": "user not found",
                "type": "user-not-found",
                "uuid": u,
            }),
            Error::CommunityNotFound(u) => json!({
                "message": "community not found",
                "type": "community-not-found",
                "uuid": u,
            }),
            Error::EmptyField(f) => json!({
                "message": "a required field was empty",
                "type": "empty-field",
                "field": f,
            }),
            Error::NullByteInString(s) => json!({
                "message": "there was a null byte in argument string",
                "type": "null-byte",
                "string": s,
            }),
            Error::TooLong { field, max } => json!({
                "message": "a field was too long",
                "type": "too-long",
                "field": field,
                "max": max,
            }),
            Error::InvalidName(n) => json!({
                "message": "there was an invalid character in a name",
                "type": "invalid-name",
                "name": n,
            }),
            Error::EmptyPatch => json!({
                "message": "the patch does not change anything",
                "type": "empty-patch",
            }),
            Error::UuidAlreadyUsed(u) => json!({
                "message": "uuid conflict",
                "type": "conflict-uuid",
                "uuid": u,
            }),
            Error::NameAlreadyUsed(n) => json!({
                "message": "name already used",
                "type": "conflict-name",
                "name": n,
            }),
        })
        .expect("serializing error contents")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let uuid = || {
            data.get("uuid")
                .and_then(|uuid| uuid.as_str())
                .and_then(|uuid| Uuid::from_str(uuid).ok())
                .ok_or_else(|| anyhow!("error should carry a uuid but does not"))
        };
        let string = |key: &str| {
            data.get(key)
                .and_then(|s| s.as_str())
                .map(String::from)
                .ok_or_else(|| anyhow!("error should carry a {key:?} string but does not"))
        };
        Ok(
            match data
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error type is not a string"))?
            {
                "unknown" => Error::Unknown(String::from(
                    data.get("message")
                        .and_then(|msg| msg.as_str())
                        .unwrap_or(""),
                )),
                "permission-denied" => Error::PermissionDenied,
                "post-not-found" => Error::PostNotFound(uuid()?),
                "comment-not-found" => Error::CommentNotFound(uuid()?),
                "user-not-found" => Error::UserNotFound(uuid()?),
                "community-not-found" => Error::CommunityNotFound(uuid()?),
                "empty-field" => Error::EmptyField(string("field")?),
                "null-byte" => Error::NullByteInString(string("string")?),
                "too-long" => Error::TooLong {
                    field: string("field")?,
                    max: data
                        .get("max")
                        .and_then(|m| m.as_u64())
                        .ok_or_else(|| anyhow!("error is about a too-long field without a max"))?
                        as usize,
                },
                "invalid-name" => Error::InvalidName(string("name")?),
                "empty-patch" => Error::EmptyPatch,
                "conflict-uuid" => Error::UuidAlreadyUsed(uuid()?),
                "conflict-name" => Error::NameAlreadyUsed(string("name")?),
                _ => return Err(anyhow!("error contents has unknown type")),
            },
        )
    }
}
