use std::{
    fmt,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use crate::{PoolError, Result};

/// Destination for a fully rendered document.
///
/// A sink receives the whole document at once; implementations either commit
/// all of it or report an error without leaving partial output behind.
pub trait Sink {
    fn write_document(&mut self, document: &str) -> Result<()>;
}

/// Where an export should go, parsed from a path-like identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

impl Destination {
    /// Every non-empty identifier names a file; standard output is only
    /// reachable through [`Destination::Stdout`].
    pub fn parse(identifier: &str) -> Result<Self> {
        if identifier.is_empty() {
            return Err(PoolError::EmptyDestination);
        }
        Ok(Self::File(PathBuf::from(identifier)))
    }

    /// Acquires the sink. Fails before anything is written if the
    /// destination cannot be used.
    pub fn open(&self) -> Result<Box<dyn Sink>> {
        match self {
            Self::Stdout => Ok(Box::new(StdoutSink)),
            Self::File(path) => Ok(Box::new(FileSink::open(path)?)),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("<stdout>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Writes into a temporary file next to the target and renames it into place
/// once the document is complete.
#[derive(Debug)]
pub struct FileSink {
    target: PathBuf,
    staging: Option<NamedTempFile>,
}

impl FileSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let target = path.as_ref().to_path_buf();
        if target.as_os_str().is_empty() {
            return Err(PoolError::EmptyDestination);
        }
        if target.is_dir() {
            return Err(PoolError::Destination {
                path: target,
                source: io::Error::new(io::ErrorKind::InvalidInput, "destination is a directory"),
            });
        }

        let parent = target
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let staging = tempfile::Builder::new()
            .prefix(".pool-export")
            .tempfile_in(parent)
            .map_err(|source| PoolError::Destination {
                path: target.clone(),
                source,
            })?;

        Ok(Self {
            target,
            staging: Some(staging),
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    fn destination_error(&self, source: io::Error) -> PoolError {
        PoolError::Destination {
            path: self.target.clone(),
            source,
        }
    }
}

impl Sink for FileSink {
    fn write_document(&mut self, document: &str) -> Result<()> {
        let mut staging = self
            .staging
            .take()
            .ok_or_else(|| PoolError::msg("file sink has already been committed"))?;

        staging
            .write_all(document.as_bytes())
            .and_then(|()| staging.as_file().sync_all())
            .map_err(|source| self.destination_error(source))?;
        staging
            .persist(&self.target)
            .map_err(|err| self.destination_error(err.error))?;

        Ok(())
    }
}

/// Writes the document to the process's standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn write_document(&mut self, document: &str) -> Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(document.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

/// Keeps the last document in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    document: Option<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<&str> {
        self.document.as_deref()
    }
}

impl Sink for MemorySink {
    fn write_document(&mut self, document: &str) -> Result<()> {
        self.document = Some(document.to_string());
        Ok(())
    }
}
