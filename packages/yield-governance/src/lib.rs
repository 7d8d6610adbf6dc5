pub mod locker;
pub mod utils;

/// Default page size for paginated queries
pub const DEFAULT_LIMIT: u32 = 30;
/// Maximum page size for paginated queries
pub const MAX_LIMIT: u32 = 100;
