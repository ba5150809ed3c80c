use std::cmp;

use crate::CommunityId;

/// Page size used when a request does not ask for one
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Largest page a request may ask for; larger limits are clamped to this
pub const MAX_PAGE_SIZE: usize = 200;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Page {
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Page {
    pub fn all() -> Page {
        Page {
            offset: 0,
            limit: Some(usize::MAX),
        }
    }

    /// Returns the effective (offset, limit) pair, with `default` used for an
    /// unset limit and `max` capping any limit
    pub fn bounds(&self, default: usize, max: usize) -> (usize, usize) {
        (self.offset, cmp::min(self.limit.unwrap_or(default), max))
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
    #[default]
    CreationDate,
    Score,
    Activity,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Asc,
    #[default]
    Desc,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Order {
    pub by: SortBy,
    pub direction: OrderType,
}

/// Listing parameters. Kept flat so that it can travel as a query string.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct FeedQuery {
    pub community: Option<CommunityId>,
    pub sort: SortBy,
    pub direction: OrderType,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl FeedQuery {
    pub fn community(community: CommunityId) -> FeedQuery {
        FeedQuery {
            community: Some(community),
            ..FeedQuery::default()
        }
    }

    pub fn order(&self) -> Order {
        Order {
            by: self.sort,
            direction: self.direction,
        }
    }

    pub fn page(&self) -> Page {
        Page {
            offset: self.offset,
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_bounds() {
        assert_eq!(Page::default().bounds(50, 200), (0, 50));
        let p = Page {
            offset: 10,
            limit: Some(5),
        };
        assert_eq!(p.bounds(50, 200), (10, 5));
        let p = Page {
            offset: 0,
            limit: Some(10_000),
        };
        assert_eq!(p.bounds(50, 200), (0, 200));
    }

    #[test]
    fn default_order_is_newest_first() {
        let q = FeedQuery::default();
        assert_eq!(
            q.order(),
            Order {
                by: SortBy::CreationDate,
                direction: OrderType::Desc
            }
        );
    }
}
