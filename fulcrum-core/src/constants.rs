//! Constant values shared by the dispatch and improvements clients.
//!
pub const DEFAULT_TIMEOUT_MS: u64 = 1500;
pub const DEFAULT_MAX_BYTES: usize = 64 * 1024; // 64KB

pub const SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_SOURCE: &str = "sdk";

// Field limits enforced before a request leaves the process
pub mod limits {
    pub const SUMMARY_MAX_CHARS: usize = 512;
    pub const KIND_MAX_CHARS: usize = 64;
    pub const SOURCE_MAX_CHARS: usize = 32;
    pub const TITLE_MAX_CHARS: usize = 256;
    pub const DEDUPE_KEY_MAX_CHARS: usize = 256;
    pub const ACTION_MAX_CHARS: usize = 64;
}

// HTTP-related constants
pub mod http {
    pub const USER_AGENT: &str = concat!("fulcrum-sdk/", env!("CARGO_PKG_VERSION"));
    pub const CONTENT_TYPE_JSON: &str = "application/json";
}

pub mod redaction {
    pub const REDACTED_VALUE: &str = "[REDACTED]";

    // Matched case-insensitively as substrings of mapping keys
    pub const DEFAULT_SENSITIVE_FRAGMENTS: [&str; 10] = [
        "api_key", "apikey", "token",
        "secret", "password", "passwd",
        "access_key", "private_key", "authorization",
        "credential",
    ];

    pub const TRUNCATION_NOTE: &str = "payload omitted: exceeded max size";
}

pub mod env {
    pub const RUN_TOKEN: &str = "FULCRUM_RUN_TOKEN";
    pub const DEPRECATED_DISPATCH_TOKEN: &str = "FULCRUM_DISPATCH_TOKEN";
    pub const RUN_UUID: &str = "FULCRUM_RUN_UUID";
    pub const TICKET_UUID: &str = "FULCRUM_TICKET_UUID";
    pub const PROJECT_UUID: &str = "FULCRUM_PROJECT_UUID";
    pub const MESSAGE_UUID: &str = "FULCRUM_MESSAGE_UUID";

    pub const DISPATCH_URL: &str = "FULCRUM_DISPATCH_URL";
    pub const DISPATCH_DEBUG: &str = "FULCRUM_DISPATCH_DEBUG";
    pub const DISPATCH_TIMEOUT_MS: &str = "FULCRUM_DISPATCH_TIMEOUT_MS";
    pub const DISPATCH_MAX_BYTES: &str = "FULCRUM_DISPATCH_MAX_BYTES";

    pub const IMPROVEMENTS_URL: &str = "FULCRUM_IMPROVEMENTS_URL";
    pub const IMPROVEMENTS_DEBUG: &str = "FULCRUM_IMPROVEMENTS_DEBUG";
    pub const IMPROVEMENTS_TIMEOUT_MS: &str = "FULCRUM_IMPROVEMENTS_TIMEOUT_MS";
    pub const IMPROVEMENTS_MAX_BYTES: &str = "FULCRUM_IMPROVEMENTS_MAX_BYTES";
}
