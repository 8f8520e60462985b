use serde::{Deserialize, Serialize};

use crate::domain::catalog::CatalogConfig;

/// Configuration for the storefront module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorefrontConfig {
    /// HMAC secret used to sign and verify bearer tokens.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Lifetime of tokens minted by `issue-token`.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    #[serde(default = "default_allowed_categories")]
    pub allowed_categories: Vec<String>,
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_secs: default_token_ttl_secs(),
            allowed_categories: default_allowed_categories(),
            max_name_length: default_max_name_length(),
        }
    }
}

impl StorefrontConfig {
    pub fn catalog(&self) -> CatalogConfig {
        CatalogConfig {
            allowed_categories: self.allowed_categories.clone(),
            max_name_length: self.max_name_length,
        }
    }
}

fn default_jwt_secret() -> String {
    "change-me".to_string()
}

fn default_token_ttl_secs() -> u64 {
    3600
}

fn default_allowed_categories() -> Vec<String> {
    CatalogConfig::default().allowed_categories
}

fn default_max_name_length() -> usize {
    CatalogConfig::default().max_name_length
}
