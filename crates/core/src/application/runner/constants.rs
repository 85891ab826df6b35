// Runner constants (no magic values)

/// Default retry base delay (1000ms = 1s)
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;

/// Default backoff multiplier between attempts
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Upper bound for a single retry delay (5 minutes)
pub const MAX_RETRY_DELAY_MS: u64 = 5 * 60 * 1000;
