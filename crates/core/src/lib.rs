//! Core library for the Descriptor Pool.
//!
//! Analysis steps append named measurements to a [`Pool`] under dotted keys
//! (`lowlevel.mfcc`). At export time the flat key set is turned into a
//! [`KeyTree`] and rendered by the [`Exporter`] into a canonical, nested
//! YAML document that is handed to a [`Sink`].

pub mod analysis;
pub mod config;
pub mod error;
pub mod format;
pub mod output;
pub mod pool;
pub mod sink;
pub mod tree;
pub mod value;

pub use analysis::{AnalysisSummary, FrameAnalyzer, FrameCutter};
pub use config::{AnalysisConfig, AppConfig, ExportConfig, OutputFormat, DEFAULT_VERSION};
pub use error::{PoolError, Result};
pub use output::Exporter;
pub use pool::Pool;
pub use sink::{Destination, FileSink, MemorySink, Sink, StdoutSink};
pub use tree::{KeyTree, Node};
pub use value::{Matrix, Real, StereoSample, Value, ValueKind};
