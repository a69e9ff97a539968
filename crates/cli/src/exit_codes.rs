//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, bad field)    |
//! | 10-19   | api              | Catalog backend communication            |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `api_exit_code` or the command's error handling

use stockgrid_api_client::ApiError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown field, value that does not parse.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// API (10-19)
// =============================================================================

/// Backend unreachable (connection refused, DNS, timeout).
pub const EXIT_API_NETWORK: u8 = 10;

/// Backend answered with an error status not covered below.
pub const EXIT_API_HTTP: u8 = 11;

/// Backend rejected the request body (400/422).
pub const EXIT_API_VALIDATION: u8 = 12;

/// Product not found (404).
pub const EXIT_API_NOT_FOUND: u8 = 13;

/// Backend answered 2xx with a body we could not read.
pub const EXIT_API_BAD_RESPONSE: u8 = 14;

/// Map an API error to its exit code.
pub fn api_exit_code(err: &ApiError) -> u8 {
    match err {
        ApiError::Network(_) => EXIT_API_NETWORK,
        ApiError::Http(..) => EXIT_API_HTTP,
        ApiError::Validation(_) => EXIT_API_VALIDATION,
        ApiError::NotFound(_) => EXIT_API_NOT_FOUND,
        ApiError::Parse(_) => EXIT_API_BAD_RESPONSE,
    }
}
