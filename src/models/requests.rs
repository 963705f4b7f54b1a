//! Request DTOs for the cache API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

/// Body of `PUT /cache/:key`
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// Any JSON value
    pub value: Value,
    /// TTL in seconds; backend default when omitted
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_ttl(self.ttl)
    }
}

/// Body of `PATCH /cache/:key/ttl`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTtlRequest {
    pub ttl: u64,
}

impl UpdateTtlRequest {
    pub fn validate(&self) -> Option<String> {
        validate_ttl(Some(self.ttl))
    }
}

/// Query of `DELETE /cache?pattern=...`
#[derive(Debug, Clone, Deserialize)]
pub struct ClearPatternQuery {
    pub pattern: String,
}

fn validate_ttl(ttl: Option<u64>) -> Option<String> {
    match ttl {
        Some(0) => Some("TTL must be at least 1 second".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_request_accepts_any_json_value() {
        let req: SetRequest =
            serde_json::from_str(r#"{"value": {"name": "ETH Zurich", "tags": [1, 2]}}"#).unwrap();
        assert_eq!(req.value["name"], "ETH Zurich");
        assert!(req.ttl.is_none());
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_set_request_with_ttl() {
        let req: SetRequest = serde_json::from_str(r#"{"value": 3, "ttl": 60}"#).unwrap();
        assert_eq!(req.ttl, Some(60));
    }

    #[test]
    fn test_zero_ttl_is_invalid() {
        let req: SetRequest = serde_json::from_str(r#"{"value": 3, "ttl": 0}"#).unwrap();
        assert!(req.validate().is_some());
        assert!(UpdateTtlRequest { ttl: 0 }.validate().is_some());
        assert!(UpdateTtlRequest { ttl: 5 }.validate().is_none());
    }

    #[test]
    fn test_set_request_requires_value() {
        assert!(serde_json::from_str::<SetRequest>(r#"{"ttl": 60}"#).is_err());
    }
}
