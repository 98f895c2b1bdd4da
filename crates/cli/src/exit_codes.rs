//! CLI Exit Code Registry
//!
//! Single source of truth for `gradecheck` exit codes. Admissions scripts
//! branch on them, so they are part of the shell contract.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain      | Description                                   |
//! |---------|-------------|-----------------------------------------------|
//! | 0       | Universal   | Success (clean verdict, valid config)         |
//! | 1       | Universal   | General error (unspecified)                   |
//! | 2       | Universal   | Usage error (bad args, unreadable input file) |
//! | 20-29   | check       | Verdicts and rejected inputs                  |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - clean verdict, or a config command that found nothing wrong.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure (write error, serialization).
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing or unreadable input file.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Check (20-29)
// =============================================================================

/// Reconciliation found grade anomalies (verdict WITH_DISCREPANCIES).
pub const EXIT_CHECK_DISCREPANCIES: u8 = 20;

/// The name on the form matches none of the document names.
/// Takes precedence over grade anomalies.
pub const EXIT_CHECK_FRAUD: u8 = 21;

/// Config file failed to parse or validate.
pub const EXIT_CHECK_INVALID_CONFIG: u8 = 22;

/// Grade records rejected at the boundary (bad CSV, bad JSON, out-of-range score).
pub const EXIT_CHECK_INVALID_RECORDS: u8 = 23;
