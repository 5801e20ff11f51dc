//! Application Configuration
//!
//! Configuration for the Reviews application layer.

use kernel::pagination::DEFAULT_PAGE_SIZE;

/// Reviews application configuration
#[derive(Debug, Clone)]
pub struct ReviewsConfig {
    /// Items per page on every list endpoint
    pub page_size: u32,
}

impl Default for ReviewsConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ReviewsConfig {
    /// Create config for development
    pub fn development() -> Self {
        Self::default()
    }

    pub fn with_page_size(page_size: u32) -> Self {
        Self { page_size }
    }
}
