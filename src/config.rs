//! Run configuration.
//!
//! A [`Config`] is built once, validated, and then only read: the roller
//! borrows it for the whole run and every session sees the same values.

use {
    crate::{error::RollError, format},
    chrono::{DateTime, FixedOffset, Local, Utc},
    std::path::{Path, PathBuf},
};

/// Default output file when none is given.
pub const DEFAULT_OUTPUT: &str = "output.log";

/// Default permission bits for created log files: owner rw, group r, others none.
pub const DEFAULT_FILE_MODE: u32 = 0o640;

/// Default number of suffixed candidates (`base.0` .. `base.8191`) tried after
/// the base path.
pub const DEFAULT_MAX_ROTATIONS: usize = 8192;

/// How each chunk read from the input is laid out in the output file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormatMode {
    /// `<timestamp> <tag> <payload>` followed by a single newline.
    #[default]
    Default,
    /// Like [`FormatMode::Default`], but continuation lines of a multi-line
    /// payload are indented to align under the payload's first line.
    Deluxe,
}

/// Specifies the time zone used for record timestamps.
///
/// # Examples
/// ```
/// use logspool::TimeZone;
/// use chrono::FixedOffset;
///
/// let utc = TimeZone::UTC;
/// let local = TimeZone::Local;
/// let china = TimeZone::Fix(FixedOffset::east_opt(8 * 3600).unwrap());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub enum TimeZone {
    /// Use UTC time zone.
    UTC,
    /// Use the system's local time zone, resolved at every timestamp so
    /// daylight saving changes during a run are followed.
    #[default]
    Local,
    /// Use a fixed time zone offset.
    Fix(FixedOffset),
}

/// Immutable settings for one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base output path; rotated files append `.0`, `.1`, ... to it.
    output: PathBuf,
    /// Tag written between the timestamp and the payload. May be empty.
    tag: String,
    /// Maximum size of a single output file in bytes. `None` is unbounded.
    max_size: Option<u64>,
    mode: FormatMode,
    time_zone: TimeZone,
    /// Permission bits for created files (Unix only, ignored elsewhere).
    file_mode: u32,
    /// How many suffixed candidates are tried after the base path.
    max_rotations: usize,
}

impl Config {
    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn max_size(&self) -> Option<u64> {
        self.max_size
    }

    pub fn mode(&self) -> FormatMode {
        self.mode
    }

    pub fn time_zone(&self) -> TimeZone {
        self.time_zone
    }

    pub fn file_mode(&self) -> u32 {
        self.file_mode
    }

    pub fn max_rotations(&self) -> usize {
        self.max_rotations
    }

    /// Get the current time in the configured time zone.
    pub fn now(&self) -> DateTime<FixedOffset> {
        match self.time_zone {
            TimeZone::UTC => Utc::now().fixed_offset(),
            TimeZone::Local => Local::now().fixed_offset(),
            TimeZone::Fix(offset) => Utc::now().with_timezone(&offset),
        }
    }

    /// Smallest file size that still holds one record with a one-byte payload.
    pub fn min_size(&self) -> u64 {
        (format::prefix_len(&self.tag) + 2) as u64
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            output: PathBuf::from(DEFAULT_OUTPUT),
            tag: String::new(),
            max_size: None,
            mode: FormatMode::Default,
            time_zone: TimeZone::Local,
            file_mode: DEFAULT_FILE_MODE,
            max_rotations: DEFAULT_MAX_ROTATIONS,
        }
    }
}

/// Fluent construction of a [`Config`].
///
/// # Examples
///
/// ```rust
/// use logspool::{ConfigBuilder, FormatMode, TimeZone};
///
/// let config = ConfigBuilder::new("./app.log")
///     .tag("worker-1")
///     .max_size(1024 * 1024)
///     .mode(FormatMode::Deluxe)
///     .time_zone(TimeZone::UTC)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_size(), Some(1024 * 1024));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Start from the defaults with the given base output path.
    pub fn new<P: AsRef<Path>>(output: P) -> Self {
        ConfigBuilder {
            config: Config {
                output: output.as_ref().to_path_buf(),
                ..Config::default()
            },
        }
    }

    /// Set the tag written into every record.
    pub fn tag(self, tag: impl Into<String>) -> Self {
        Self {
            config: Config {
                tag: tag.into(),
                ..self.config
            },
        }
    }

    /// Set the maximum size of each output file. Zero means unbounded.
    pub fn max_size(self, bytes: u64) -> Self {
        Self {
            config: Config {
                max_size: (bytes > 0).then_some(bytes),
                ..self.config
            },
        }
    }

    /// Set the record layout.
    pub fn mode(self, mode: FormatMode) -> Self {
        Self {
            config: Config { mode, ..self.config },
        }
    }

    /// Set the time zone for record timestamps.
    pub fn time_zone(self, time_zone: TimeZone) -> Self {
        Self {
            config: Config {
                time_zone,
                ..self.config
            },
        }
    }

    /// Set the permission bits for created files (Unix-like systems only),
    /// in octal notation like when using chmod.
    pub fn file_mode(self, mode: u32) -> Self {
        Self {
            config: Config {
                file_mode: mode,
                ..self.config
            },
        }
    }

    /// Set how many suffixed candidates are tried before giving up.
    pub fn max_rotations(self, max_rotations: usize) -> Self {
        Self {
            config: Config {
                max_rotations,
                ..self.config
            },
        }
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<Config, RollError> {
        let config = self.config;
        if config.output.as_os_str().is_empty() {
            return Err(RollError::EmptyOutputPath);
        }
        if config.file_mode > 0o7777 {
            return Err(RollError::InvalidFileMode(config.file_mode));
        }
        if let Some(size) = config.max_size {
            let minimum = config.min_size();
            if size < minimum {
                return Err(RollError::SizeTooSmall { size, minimum });
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConfigBuilder::default().build().unwrap();
        assert_eq!(config.output(), Path::new(DEFAULT_OUTPUT));
        assert_eq!(config.tag(), "");
        assert_eq!(config.max_size(), None);
        assert_eq!(config.mode(), FormatMode::Default);
        assert_eq!(config.file_mode(), 0o640);
        assert_eq!(config.max_rotations(), DEFAULT_MAX_ROTATIONS);
        assert!(matches!(config.time_zone(), TimeZone::Local));
    }

    #[test]
    fn test_zero_size_is_unbounded() {
        let config = ConfigBuilder::new("a.log").max_size(0).build().unwrap();
        assert_eq!(config.max_size(), None);
    }

    #[test]
    fn test_min_size_accounts_for_tag() {
        let config = ConfigBuilder::new("a.log").tag("TAG").build().unwrap();
        // 19-byte timestamp, two spaces, tag, one payload byte, newline.
        assert_eq!(config.min_size(), 19 + 2 + 3 + 2);
    }

    #[test]
    fn test_rejects_size_below_one_record() {
        let result = ConfigBuilder::new("a.log").tag("T").max_size(10).build();
        match result {
            Err(RollError::SizeTooSmall { size, minimum }) => {
                assert_eq!(size, 10);
                assert_eq!(minimum, 24);
            }
            other => panic!("expected SizeTooSmall, got {other:?}"),
        }
        assert!(ConfigBuilder::new("a.log").tag("T").max_size(24).build().is_ok());
    }

    #[test]
    fn test_rejects_empty_output() {
        assert!(matches!(
            ConfigBuilder::new("").build(),
            Err(RollError::EmptyOutputPath)
        ));
    }

    #[test]
    fn test_rejects_non_permission_mode_bits() {
        assert!(matches!(
            ConfigBuilder::new("a.log").file_mode(0o100644).build(),
            Err(RollError::InvalidFileMode(0o100644))
        ));
    }

    #[test]
    fn test_fixed_offset_now() {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let config = ConfigBuilder::new("a.log")
            .time_zone(TimeZone::Fix(offset))
            .build()
            .unwrap();
        assert_eq!(config.now().offset(), &offset);
    }
}
