//! One session: stream input into a single, freshly created output file.

use {
    crate::{config::Config, format},
    std::{
        fmt,
        fs::{self, OpenOptions},
        io::{self, Read, Write},
        path::Path,
    },
    tracing::{debug, trace, warn},
};

#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

/// Largest number of bytes taken from the input in one read.
pub const CHUNK_SIZE: usize = 4095;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Input reached end of file and everything read was written.
    Completed,
    /// The target path already exists; it was not touched.
    AlreadyExists,
    /// The target path could not be created for lack of permissions.
    PermissionDenied,
    /// Reading the input failed.
    ReadFailure,
    /// Writing a record failed or wrote fewer bytes than rendered.
    WriteFailure,
    /// The file holds as much as the configured maximum allows.
    SizeLimitReached,
    /// Creating the target failed for any other reason.
    OtherFailure,
}

impl Outcome {
    /// Whether the roller should move on to the next candidate path.
    pub fn rotates(self) -> bool {
        match self {
            Outcome::AlreadyExists | Outcome::SizeLimitReached => true,
            Outcome::Completed
            | Outcome::PermissionDenied
            | Outcome::ReadFailure
            | Outcome::WriteFailure
            | Outcome::OtherFailure => false,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::Completed => "completed",
            Outcome::AlreadyExists => "file exists",
            Outcome::PermissionDenied => "permission denied",
            Outcome::ReadFailure => "read failure",
            Outcome::WriteFailure => "write failure",
            Outcome::SizeLimitReached => "size limit reached",
            Outcome::OtherFailure => "other failure",
        })
    }
}

/// What a session did before it ended.
#[derive(Debug)]
pub struct SessionReport {
    pub outcome: Outcome,
    /// Whether the target file was created by this session.
    pub created: bool,
    pub bytes_written: u64,
    pub records: u64,
    /// The I/O error behind a failure outcome.
    pub error: Option<io::Error>,
}

impl SessionReport {
    fn new(created: bool) -> Self {
        SessionReport {
            outcome: Outcome::Completed,
            created,
            bytes_written: 0,
            records: 0,
            error: None,
        }
    }

    fn end(mut self, stop: Stop) -> Self {
        self.outcome = stop.outcome;
        self.error = stop.error;
        self
    }
}

struct Stop {
    outcome: Outcome,
    error: Option<io::Error>,
}

impl Stop {
    fn new(outcome: Outcome) -> Self {
        Stop { outcome, error: None }
    }

    fn failed(outcome: Outcome, error: io::Error) -> Self {
        Stop {
            outcome,
            error: Some(error),
        }
    }
}

/// Create `path` for appending, failing if it already exists.
///
/// On Unix the file is created with `file_mode` and the mode is then applied
/// to the open handle, so the result does not depend on the umask.
pub fn open_exclusive(path: &Path, file_mode: u32) -> io::Result<fs::File> {
    let mut options = OpenOptions::new();
    options.append(true).create_new(true);
    #[cfg(unix)]
    options.mode(file_mode);
    let file = options.open(path)?;
    #[cfg(unix)]
    file.set_permissions(fs::Permissions::from_mode(file_mode))?;
    #[cfg(not(unix))]
    let _ = file_mode;
    Ok(file)
}

/// Map a failed create to the outcome that names it.
pub fn classify_open_error(error: &io::Error) -> Outcome {
    match error.kind() {
        io::ErrorKind::AlreadyExists => Outcome::AlreadyExists,
        io::ErrorKind::PermissionDenied => Outcome::PermissionDenied,
        _ => Outcome::OtherFailure,
    }
}

/// Run one session against `path`.
///
/// `carry` holds input a previous session read but had no room for; it is
/// written first. When this session ends on the size limit with unwritten
/// input, that input is left in `carry` for the next one. The file is closed
/// before returning on every path.
pub fn run_session<R: Read + ?Sized>(
    config: &Config,
    path: &Path,
    input: &mut R,
    carry: &mut Vec<u8>,
) -> SessionReport {
    debug!(path = %path.display(), "trying");
    let mut file = match open_exclusive(path, config.file_mode()) {
        Ok(file) => file,
        Err(err) => {
            let outcome = classify_open_error(&err);
            if outcome.rotates() {
                debug!(path = %path.display(), "file exists");
            } else {
                warn!(path = %path.display(), error = %err, "cannot create log file");
            }
            return SessionReport::new(false).end(Stop::failed(outcome, err));
        }
    };
    let report = pump(config, input, &mut file, carry);
    debug!(
        path = %path.display(),
        outcome = %report.outcome,
        bytes = report.bytes_written,
        records = report.records,
        "session ended"
    );
    report
}

/// Stream `input` into `output` until end of input, the size limit, or an error.
pub fn pump<R: Read + ?Sized, W: Write + ?Sized>(
    config: &Config,
    input: &mut R,
    output: &mut W,
    carry: &mut Vec<u8>,
) -> SessionReport {
    let mut report = SessionReport::new(true);
    if !carry.is_empty() {
        let pending = std::mem::take(carry);
        trace!(bytes = pending.len(), "writing carried input");
        if let Err(stop) = write_record(config, output, &pending, carry, &mut report) {
            return report.end(stop);
        }
    }
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let budget = match config.max_size() {
            Some(max) => max.saturating_sub(report.bytes_written),
            None => CHUNK_SIZE as u64,
        };
        if budget == 0 {
            debug!("size limit reached");
            return report.end(Stop::new(Outcome::SizeLimitReached));
        }
        let to_read = budget.min(CHUNK_SIZE as u64) as usize;
        let amount = match read_chunk(input, &mut buffer[..to_read]) {
            Ok(0) => {
                debug!("end of input");
                return report.end(Stop::new(Outcome::Completed));
            }
            Ok(amount) => amount,
            Err(err) => {
                warn!(error = %err, "read error");
                return report.end(Stop::failed(Outcome::ReadFailure, err));
            }
        };
        trace!(amount, to_read, "read");
        if let Err(stop) = write_record(config, output, &buffer[..amount], carry, &mut report) {
            return report.end(stop);
        }
    }
}

fn read_chunk<R: Read + ?Sized>(input: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    loop {
        match input.read(buffer) {
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}

/// Render `chunk` and write it, respecting the remaining size budget.
///
/// A record that does not fit is never written. On a file that already holds
/// records the whole chunk goes to `carry`; on an empty file the part that
/// fits, cut at a line boundary when possible, is written and only the rest
/// is carried.
fn write_record<W: Write + ?Sized>(
    config: &Config,
    output: &mut W,
    chunk: &[u8],
    carry: &mut Vec<u8>,
    report: &mut SessionReport,
) -> Result<(), Stop> {
    let mode = config.mode();
    let prefix = format::prefix(&format::timestamp(&config.now()), config.tag());
    let (head, rest) = match config.max_size() {
        None => (chunk, &[][..]),
        Some(max) => {
            let room = usize::try_from(max.saturating_sub(report.bytes_written)).unwrap_or(usize::MAX);
            let fit = if format::rendered_len(mode, prefix.len(), chunk) <= room {
                chunk.len()
            } else if report.bytes_written > 0 {
                0
            } else {
                format::split_point(mode, prefix.len(), chunk, room)
            };
            if fit == 0 {
                carry.extend_from_slice(chunk);
                debug!(carried = chunk.len(), "size limit reached");
                return Err(Stop::new(Outcome::SizeLimitReached));
            }
            chunk.split_at(fit)
        }
    };

    let record = format::render_with_prefix(mode, prefix.as_bytes(), head);
    match output.write(&record) {
        Ok(written) => {
            report.bytes_written += written as u64;
            if written != record.len() {
                warn!(written, expected = record.len(), "short write");
                return Err(Stop::failed(
                    Outcome::WriteFailure,
                    io::Error::new(
                        io::ErrorKind::WriteZero,
                        format!("short write: {written} of {} bytes", record.len()),
                    ),
                ));
            }
            report.records += 1;
            trace!(written, "wrote");
        }
        Err(err) => {
            warn!(error = %err, "write error");
            return Err(Stop::failed(Outcome::WriteFailure, err));
        }
    }

    if !rest.is_empty() {
        carry.extend_from_slice(rest);
        debug!(carried = rest.len(), "size limit reached");
        return Err(Stop::new(Outcome::SizeLimitReached));
    }
    Ok(())
}
