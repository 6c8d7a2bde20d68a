use flexi_logger::{
    colored_default_format, opt_format, Cleanup, Criterion, FileSpec, FlexiLoggerError, Logger,
    LoggerHandle, Naming,
};
use std::path::Path;

/// Starts the global logger.
///
/// `RUST_LOG` wins over `default_level`. With a `directory` the log goes to
/// rotated files there, otherwise to stderr in color. Keep the returned
/// handle alive for as long as logging is needed.
pub fn setup_logging(
    default_level: &str,
    directory: Option<&Path>,
) -> Result<LoggerHandle, FlexiLoggerError> {
    let logger = Logger::try_with_env_or_str(default_level)?;

    match directory {
        Some(directory) => logger
            .log_to_file(FileSpec::default().directory(directory))
            .format(opt_format)
            .rotate(
                Criterion::Size(10 * 1024 * 1024), // 10 MB per file
                Naming::Numbers,
                Cleanup::KeepLogFiles(3),
            )
            .start(),
        None => logger.format(colored_default_format).start(),
    }
}
