//! Run-level errors and the exit codes the binary maps them to.

use {crate::session::Outcome, std::path::PathBuf};

/// Exit code constants.
pub mod codes {
    /// Input exhausted and every record written.
    pub const SUCCESS: u8 = 0;
    /// Invalid command line or configuration. Matches clap's usage error code.
    pub const INVALID_ARGS: u8 = 2;
    /// An output file could not be created for lack of permissions.
    pub const PERMISSION_DENIED: u8 = 3;
    /// Reading standard input failed.
    pub const READ_FAILURE: u8 = 4;
    /// Writing a record failed or was short.
    pub const WRITE_FAILURE: u8 = 5;
    /// Any other failure while creating an output file.
    pub const OTHER_FAILURE: u8 = 6;
    /// Every rotation candidate was taken or full.
    pub const ROTATION_EXHAUSTED: u8 = 7;
}

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum RollError {
    #[error("Output path must not be empty")]
    EmptyOutputPath,
    #[error("Maximum size of {size} bytes cannot hold a single record; need at least {minimum}")]
    SizeTooSmall { size: u64, minimum: u64 },
    #[error("Invalid file mode {0:#o}: only permission bits (0o7777) are allowed")]
    InvalidFileMode(u32),
    #[error("Could not continue logging to '{path}' ({outcome}): {detail}")]
    Session {
        path: PathBuf,
        outcome: Outcome,
        detail: String,
    },
    #[error("Maximum log file number reached: {attempts} candidates after '{base}' are taken")]
    RotationExhausted { base: PathBuf, attempts: usize },
}

/// Map a run error to the process exit code.
pub fn exit_code(error: &RollError) -> u8 {
    match error {
        RollError::EmptyOutputPath | RollError::SizeTooSmall { .. } | RollError::InvalidFileMode(_) => {
            codes::INVALID_ARGS
        }
        RollError::Session { outcome, .. } => match outcome {
            Outcome::PermissionDenied => codes::PERMISSION_DENIED,
            Outcome::ReadFailure => codes::READ_FAILURE,
            Outcome::WriteFailure => codes::WRITE_FAILURE,
            Outcome::OtherFailure => codes::OTHER_FAILURE,
            // Not produced by the roller as errors.
            Outcome::Completed | Outcome::AlreadyExists | Outcome::SizeLimitReached => codes::OTHER_FAILURE,
        },
        RollError::RotationExhausted { .. } => codes::ROTATION_EXHAUSTED,
    }
}
