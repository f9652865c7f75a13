//! Website restriction DTOs.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize)]
pub struct RestrictionsResponse {
    pub enabled: bool,
    pub blocked_domains: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckUrlRequest {
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckUrlResponse {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub blocked: bool,
    /// The blocked entry that matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<String>,
}
