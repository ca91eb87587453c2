//! Stable exit codes for conductor CLI commands.
//!
//! Code 2 is left to clap, which exits with it on usage errors.

/// Command succeeded (or a next phase was found).
pub const OK: i32 = 0;
/// Command failed due to invalid config, unreadable files, or other errors.
pub const INVALID: i32 = 1;
/// `conductor next` / `conductor is-complete` found every phase complete.
pub const COMPLETE: i32 = 3;
/// No current session document exists.
pub const NO_SESSION: i32 = 4;
/// Project is not ready for orchestration (agents dir or registry invalid).
pub const NOT_READY: i32 = 5;
/// `conductor complete` referenced a phase number absent from the session.
pub const PHASE_NOT_FOUND: i32 = 6;

#[cfg(test)]
mod tests {
    use super::*;

    /// Outcome codes are distinct and never collide with clap's usage-error code.
    #[test]
    fn codes_are_distinct_and_avoid_usage_error() {
        let codes = [OK, INVALID, COMPLETE, NO_SESSION, NOT_READY, PHASE_NOT_FOUND];
        for (idx, code) in codes.iter().enumerate() {
            assert_ne!(*code, 2);
            assert!(!codes[idx + 1..].contains(code));
        }
    }
}
