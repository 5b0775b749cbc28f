//! Rotation across output files.
//!
//! The roller runs sessions against `base`, `base.0`, `base.1`, ... in that
//! order. A candidate that already exists or has filled up hands over to the
//! next one; end of input finishes the run; anything else stops it.

use {
    crate::{
        config::Config,
        error::RollError,
        session::{self, Outcome, SessionReport},
    },
    std::{
        ffi::OsString,
        io::Read,
        iter,
        path::{Path, PathBuf},
    },
    tracing::{debug, info},
};

/// What a successful run produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Files created during the run, in the order they were filled.
    pub files: Vec<PathBuf>,
    pub bytes_written: u64,
    pub records: u64,
}

/// `base` with a numeric suffix: `app.log` -> `app.log.3`.
pub fn suffixed(base: &Path, index: usize) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

/// Every path the roller may try, in order: the base path, then
/// `max_rotations` suffixed candidates.
pub fn candidates(base: &Path, max_rotations: usize) -> impl Iterator<Item = PathBuf> + '_ {
    iter::once(base.to_path_buf()).chain((0..max_rotations).map(move |index| suffixed(base, index)))
}

/// Drains one input into a family of rotated files.
pub struct Roller<'a, R> {
    config: &'a Config,
    input: R,
    /// Input read by a session that ran out of room before writing it.
    carry: Vec<u8>,
}

impl<'a, R: Read> Roller<'a, R> {
    pub fn new(config: &'a Config, input: R) -> Self {
        Roller {
            config,
            input,
            carry: Vec::new(),
        }
    }

    /// Run a single session against `path`.
    pub fn run_session(&mut self, path: &Path) -> SessionReport {
        session::run_session(self.config, path, &mut self.input, &mut self.carry)
    }

    /// Run sessions over the candidate paths until the input is exhausted.
    pub fn run(&mut self) -> Result<RunSummary, RollError> {
        let config = self.config;
        let base = config.output();
        let mut summary = RunSummary::default();
        for path in candidates(base, config.max_rotations()) {
            let report = self.run_session(&path);
            summary.bytes_written += report.bytes_written;
            summary.records += report.records;
            if report.created {
                summary.files.push(path.clone());
            }
            match report.outcome {
                Outcome::Completed => {
                    info!(
                        files = summary.files.len(),
                        bytes = summary.bytes_written,
                        records = summary.records,
                        "input exhausted"
                    );
                    return Ok(summary);
                }
                Outcome::AlreadyExists | Outcome::SizeLimitReached => {
                    debug!(path = %path.display(), outcome = %report.outcome, "rotating");
                }
                Outcome::PermissionDenied
                | Outcome::ReadFailure
                | Outcome::WriteFailure
                | Outcome::OtherFailure => {
                    let detail = report
                        .error
                        .map(|err| err.to_string())
                        .unwrap_or_else(|| report.outcome.to_string());
                    return Err(RollError::Session {
                        path,
                        outcome: report.outcome,
                        detail,
                    });
                }
            }
        }
        Err(RollError::RotationExhausted {
            base: base.to_path_buf(),
            attempts: config.max_rotations(),
        })
    }

    /// Hand back the input, e.g. to check what was left unread.
    pub fn into_input(self) -> R {
        self.input
    }
}
