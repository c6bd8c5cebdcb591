/// Default interval between retention sweeps (30 minutes)
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 30 * 60;

/// Maximum length of a file display name
pub const MAX_FILE_NAME_LENGTH: u64 = 200;

/// Maximum length of an organization id
pub const MAX_ORG_ID_LENGTH: u64 = 128;

/// Blob URL lookups kept in flight while listing files
pub const MAX_CONCURRENT_URL_LOOKUPS: usize = 16;

/// Files purged concurrently within one retention sweep
pub const MAX_CONCURRENT_PURGES: usize = 8;
