use uuid::Uuid;

use crate::{Error, STUB_UUID};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommunityId(pub Uuid);

impl CommunityId {
    pub fn stub() -> CommunityId {
        CommunityId(STUB_UUID)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Community {
    pub id: CommunityId,
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewCommunity {
    pub id: CommunityId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl NewCommunity {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_name(&self.name)?;
        crate::validate_string(&self.description)?;
        if self.description.chars().count() > crate::MAX_TEXT_LEN {
            return Err(Error::TooLong {
                field: String::from("description"),
                max: crate::MAX_TEXT_LEN,
            });
        }
        Ok(())
    }
}
