use crate::TdigestError;
use chrono::Local;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Writes everything to both sinks.
pub struct Tee<A, B> {
    first: A,
    second: B,
}

impl<A: Write, B: Write> Tee<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.first.write_all(buf)?;
        self.second.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.first.flush()?;
        self.second.flush()
    }
}

/// Initialise env_logger. `RUST_LOG` wins over the default level. With a
/// log directory, output also goes to `execution_<timestamp>.log` there.
pub fn init(verbose: bool, log_dir: Option<&Path>) -> Result<Option<PathBuf>, TdigestError> {
    let default_level = if verbose { "debug" } else { "info" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));
    builder.format_timestamp_secs();

    let mut log_path = None;
    if let Some(dir) = log_dir {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("execution_{}.log", Local::now().format("%Y%m%d_%H%M%S")));
        let file = File::create(&path)?;
        builder.target(env_logger::Target::Pipe(Box::new(Tee::new(file, io::stderr()))));
        log_path = Some(path);
    }

    builder
        .try_init()
        .map_err(|e| TdigestError::Config(format!("logger: {e}")))?;
    Ok(log_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tee_writes_both() {
        let mut tee = Tee::new(Vec::new(), Vec::new());
        write!(tee, "hello {}", 42).unwrap();
        tee.flush().unwrap();
        assert_eq!(tee.first, b"hello 42");
        assert_eq!(tee.second, b"hello 42");
    }
}
