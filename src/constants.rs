pub const DEVICE_PORT: u16 = 5000;
pub const DEFAULT_GATEWAY: &str = "localhost";

pub const POLL_INTERVAL_MS: u64 = 1000;
pub const RETRY_DELAY_MS: u64 = 2000;
pub const MAX_RETRIES: u32 = 3;
pub const REQUEST_TIMEOUT_MS: u64 = 5000;

pub const WINDOW_SIZE: usize = 20;
pub const UI_TICK_RATE_MS: u64 = 250;

// Sentinel texts shown when a tick fails terminally
pub const VALUE_ERROR_TEXT: &str = "Error-Ecg-value";
pub const STATUS_ERROR_TEXT: &str = "Error-status";
pub const RESOLVE_ERROR_TEXT: &str = "Error: Unable to retrieve IP";
