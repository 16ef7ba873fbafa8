//! Centralized default constants for jam.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// REMOTE STORE
// =============================================================================

/// Default base URL of the collection store.
pub const API_URL: &str = "http://localhost:8000";

/// Default per-request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for a collection view.
pub const PAGE_SIZE: usize = 25;

/// Default page offset.
pub const PAGE_OFFSET: usize = 0;

// =============================================================================
// MOVES
// =============================================================================

/// Maximum number of company ids carried by one move call.
pub const BATCH_SIZE: usize = 100;

/// Chunks in flight at once (1 = sequential dispatch).
pub const MAX_IN_FLIGHT: usize = 1;

// =============================================================================
// WELL-KNOWN COLLECTION NAMES
// =============================================================================

/// Name of the user's working list.
pub const MY_LIST_NAME: &str = "My List";

/// Name of the liked-companies list.
pub const LIKED_LIST_NAME: &str = "Liked Companies List";

/// Name of the list that is never offered as source or destination.
pub const IGNORE_LIST_NAME: &str = "Companies to Ignore List";

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

pub const ENV_API_URL: &str = "JAM_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "JAM_TIMEOUT_SECS";
pub const ENV_BATCH_SIZE: &str = "JAM_BATCH_SIZE";
pub const ENV_PAGE_SIZE: &str = "JAM_PAGE_SIZE";
pub const ENV_MAX_IN_FLIGHT: &str = "JAM_MAX_IN_FLIGHT";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_size_fits_page_size() {
        assert!(BATCH_SIZE >= PAGE_SIZE);
    }

    #[test]
    fn test_well_known_names_are_distinct() {
        assert_ne!(MY_LIST_NAME, LIKED_LIST_NAME);
        assert_ne!(MY_LIST_NAME, IGNORE_LIST_NAME);
        assert_ne!(LIKED_LIST_NAME, IGNORE_LIST_NAME);
    }
}
