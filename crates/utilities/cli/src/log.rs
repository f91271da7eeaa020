//! Log output configuration.

use crate::{LogArgs, LogFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// How often the log file rolls over.
#[derive(
    Default, Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[clap(rename_all = "lowercase")]
pub enum LogRotation {
    /// A new file every minute.
    Minutely,
    /// A new file every hour.
    Hourly,
    /// A new file every day.
    #[default]
    Daily,
    /// A single file.
    Never,
}

/// Stdout log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StdoutLogConfig {
    /// The log format.
    pub format: LogFormat,
}

/// File log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLogConfig {
    /// The directory the log files are written to.
    pub directory_path: PathBuf,
    /// The log format.
    pub format: LogFormat,
    /// The rotation of the log files.
    pub rotation: LogRotation,
}

/// The log outputs and the global level filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// The global level filter.
    pub global_level: LevelFilter,
    /// Stdout logs, if enabled.
    pub stdout_logs: Option<StdoutLogConfig>,
    /// File logs, if enabled.
    pub file_logs: Option<FileLogConfig>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global_level: LevelFilter::INFO,
            stdout_logs: Some(StdoutLogConfig::default()),
            file_logs: None,
        }
    }
}

impl LogConfig {
    /// Builds the config from the parsed [`LogArgs`].
    pub fn new(args: LogArgs) -> Self {
        let global_level = match args.level {
            0 => LevelFilter::OFF,
            1 => LevelFilter::ERROR,
            2 => LevelFilter::WARN,
            3 => LevelFilter::INFO,
            4 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        };
        let stdout_logs = (!args.stdout_quiet).then_some(StdoutLogConfig { format: args.stdout_format });
        let file_logs = args.file_directory.map(|directory_path| FileLogConfig {
            directory_path,
            format: args.file_format,
            rotation: args.file_rotation,
        });
        Self { global_level, stdout_logs, file_logs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rstest::rstest;

    #[derive(Parser, Debug)]
    struct MockCommand {
        #[command(flatten)]
        log: LogArgs,
    }

    #[rstest]
    #[case::default(&["test"], LevelFilter::INFO)]
    #[case::one(&["test", "-v"], LevelFilter::ERROR)]
    #[case::four(&["test", "-vvvv"], LevelFilter::DEBUG)]
    #[case::many(&["test", "-vvvvvvv"], LevelFilter::TRACE)]
    fn test_verbosity(#[case] args: &[&str], #[case] expected: LevelFilter) {
        let command = MockCommand::parse_from(args);
        assert_eq!(LogConfig::new(command.log).global_level, expected);
    }

    #[test]
    fn test_stdout_and_file_logs() {
        let command = MockCommand::parse_from([
            "test",
            "--log.stdout.format",
            "json",
            "--log.file.directory",
            "/tmp/kakarot",
            "--log.file.rotation",
            "never",
        ]);
        let config = LogConfig::new(command.log);
        assert_eq!(config.stdout_logs, Some(StdoutLogConfig { format: LogFormat::Json }));
        assert_eq!(
            config.file_logs,
            Some(FileLogConfig {
                directory_path: PathBuf::from("/tmp/kakarot"),
                format: LogFormat::Full,
                rotation: LogRotation::Never,
            })
        );
    }

    #[test]
    fn test_quiet_stdout() {
        let command = MockCommand::parse_from(["test", "--log.stdout.quiet"]);
        let config = LogConfig::new(command.log);
        assert!(config.stdout_logs.is_none());
        assert!(config.file_logs.is_none());
    }
}
