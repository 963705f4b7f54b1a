//! Cache key layout for StudyBridge entities.

use std::fmt;
use std::str::FromStr;

use crate::cache::escape_glob;
use crate::error::CacheError;

/// Entity families cached by the application. Each owns the keys under
/// `<namespace>:` so a mutation can drop the whole family at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    Universities,
    Locations,
    Tags,
    Agents,
    StudyOffers,
}

impl CacheNamespace {
    pub const ALL: [CacheNamespace; 5] = [
        CacheNamespace::Universities,
        CacheNamespace::Locations,
        CacheNamespace::Tags,
        CacheNamespace::Agents,
        CacheNamespace::StudyOffers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheNamespace::Universities => "universities",
            CacheNamespace::Locations => "locations",
            CacheNamespace::Tags => "tags",
            CacheNamespace::Agents => "agents",
            CacheNamespace::StudyOffers => "study-offers",
        }
    }

    /// Key of a single entity, e.g. `universities:42`.
    pub fn key(&self, id: impl fmt::Display) -> String {
        format!("{}:{}", self.as_str(), id)
    }

    /// Key of a cached listing page, e.g. `tags:list:page=2`.
    pub fn list_key(&self, query: impl fmt::Display) -> String {
        format!("{}:list:{}", self.as_str(), query)
    }

    /// Glob matching every key in the namespace.
    pub fn pattern(&self) -> String {
        format!("{}:*", escape_glob(self.as_str()))
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheNamespace {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CacheNamespace::ALL
            .into_iter()
            .find(|ns| ns.as_str() == s)
            .ok_or_else(|| CacheError::InvalidRequest(format!("Unknown cache namespace '{s}'")))
    }
}
