//! Application constants for MODIS Fetcher
//!
//! This module centralizes all constants used throughout the library,
//! organized by functional domain.

use std::time::Duration;

/// Environment variable names
pub mod env {
    /// Environment variable holding the LAADS bearer token
    pub const API_TOKEN: &str = "MODIS_API_TOKEN";

    /// Environment variable overriding the archive base URL
    pub const BASE_URL: &str = "MODIS_BASE_URL";
}

/// LAADS archive endpoints
pub mod laads {
    /// Root of the MODIS archive tree
    pub const BASE_URL: &str = "https://ladsweb.modaps.eosdis.nasa.gov/archive/allData/";

    /// Key under which some listings wrap their record array
    pub const LISTING_CONTENT_KEY: &str = "content";

    /// Content type that marks a response body as JSON
    pub const JSON_CONTENT_TYPE: &str = "application/json";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "MODIS-Fetcher/0.1.0 (Earth Observation Tool)";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 8;
}

/// Rate limiting configuration
pub mod limits {
    /// Default rate limit for archive requests (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 10;
}

/// MODIS sinusoidal grid bounds
pub mod grid {
    /// Largest valid horizontal tile index
    pub const MAX_HORIZONTAL: i32 = 35;

    /// Largest valid vertical tile index
    pub const MAX_VERTICAL: i32 = 17;
}

/// File handling constants
pub mod files {
    /// Suffix appended to a directory URL to get its listing
    pub const JSON_SUFFIX: &str = ".json";

    /// Temporary file suffix for atomic downloads
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Application directory name under the user config dir
    pub const APP_DIR_NAME: &str = "modis_fetcher";

    /// Configuration file name
    pub const CONFIG_FILE_NAME: &str = "config.toml";
}

/// Logging defaults
pub mod logging {
    /// Default log level for the crate target
    pub const DEFAULT_LEVEL: &str = "info";
}
