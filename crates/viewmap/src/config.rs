//! Host-facing service configuration.
use crate::db::PaginationPolicy;
use serde::{Deserialize, Serialize};

///
/// ServiceConfig
///
/// Settings applied when a service is built. Every field has a default, so
/// hosts can deserialize partial documents.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub pagination: PaginationPolicy,
}

impl ServiceConfig {
    #[must_use]
    pub const fn new(pagination: PaginationPolicy) -> Self {
        Self { pagination }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: ServiceConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.pagination.max_page_size, PaginationPolicy::MAX_PAGE_SIZE);
    }

    #[test]
    fn nested_pagination_overrides() {
        let config: ServiceConfig = serde_json::from_str(
            r#"{ "pagination": { "default_page_size": 25, "max_page_size": 50 } }"#,
        )
        .unwrap();

        assert_eq!(config.pagination.default_page, 1);
        assert_eq!(config.pagination.limit_page_size(None), Some(25));
        assert_eq!(config.pagination.limit_page_size(Some(80)), Some(50));
    }

    #[test]
    fn round_trips_through_json() {
        let config = ServiceConfig::new(PaginationPolicy::new().with_max_page_size(10));
        let json = serde_json::to_string(&config).unwrap();

        assert_eq!(serde_json::from_str::<ServiceConfig>(&json).unwrap(), config);
    }
}
