use std::io::Write;
use std::path::Path;

use anyhow::Result;
use env_logger::{Builder, Env, Target};

fn builder() -> Builder {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} [{:<5}] {} - {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        )
    });
    builder
}

/// Init the global logger, writing to stderr.
/// Fails if a global logger is already installed.
pub fn init_logger() -> Result<()> {
    builder().try_init()?;
    Ok(())
}

/// Init the global logger, appending to the given log file.
pub fn init_file_logger(log_path: impl AsRef<Path>) -> Result<()> {
    let log_path = log_path.as_ref();
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    builder()
        .target(Target::Pipe(Box::new(log_file)))
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod test_logger {
    use crate::logger::{init_file_logger, init_logger};

    #[test]
    fn test_file_logger() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("logs").join("fluid.log");
        init_file_logger(&log_path).unwrap();
        log::warn!("logger test line");
        assert!(log_path.exists());

        // The global logger is set once per process.
        assert!(init_logger().is_err());
        assert!(init_file_logger(&log_path).is_err());
    }
}
