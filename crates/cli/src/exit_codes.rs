//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success; for `run`, every view matched                    |
//! | 1    | `run` finished with divergent rows or unmapped postings   |
//! | 2    | CLI usage error (bad args)                                |
//! | 3    | File or external tool error (missing file, no pdftotext)  |
//! | 4    | Input could not be parsed (word-box dump, mapping JSON)   |
//! | 5    | Invalid `recon.toml`                                      |
//! | 6    | Mapping resource missing or malformed                     |
//! | 7    | Nothing extracted from an input document                  |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Reconciliation found divergences. Like `diff(1)`, 1 means "inputs differ".
pub const EXIT_DIVERGENT: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// IO error - unreadable/unwritable file, `pdftotext` missing or failing.
pub const EXIT_IO: u8 = 3;

/// Parse error - malformed input document.
pub const EXIT_PARSE: u8 = 4;

/// Run configuration failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 5;

/// Mapping resource not found or not usable. `run` still writes its
/// outputs before exiting with this code.
pub const EXIT_MAPPING: u8 = 6;

/// A document yielded no event lines or postings.
pub const EXIT_EMPTY_INPUT: u8 = 7;
