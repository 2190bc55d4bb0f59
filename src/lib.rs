//! # Sinkroll
//!
//! Runtime-switchable log sinks with windowed file rotation and output
//! stream fan-out.
//!
//! ## Features
//!
//! - Structured console and file logging over the `tracing` ecosystem
//! - Hourly/daily file rotation into date-partitioned archive directories
//! - Gzip compression of completed windows and retention-count pruning
//! - Interception of raw stdout/stderr writes with fan-out to named
//!   subscribers
//! - Sinks attach and detach at runtime, from any thread, while other
//!   threads keep emitting
//!
//! ## Example
//!
//! ```rust
//! use sinkroll::{Configurator, SinkConfig, SinkKind};
//!
//! let configurator = Configurator::new();
//! configurator.setup(SinkConfig::new().with_sinks([SinkKind::ConsoleLog]))?;
//!
//! tracing::dispatcher::with_default(&configurator.dispatch(), || {
//!     tracing::info!("This is an info message");
//! });
//! # Ok::<(), sinkroll::Error>(())
//! ```

pub mod clock;
pub mod config;
pub mod configurator;
pub mod error;
pub mod multiplexer;
pub mod rotation;
pub mod writer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{SinkConfig, SinkKind};
pub use configurator::{Channel, ChannelStream, Configurator};
pub use error::{Error, Result};
pub use multiplexer::{ForwardToWriter, PassThrough, StreamMultiplexer, Subscriber};
pub use rotation::{RetentionPolicy, RotationWindow, WindowUnit};
pub use writer::{RotatingWriter, WriterHandle};

pub use tracing_subscriber::filter::LevelFilter;
