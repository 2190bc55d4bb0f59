//! Runtime sink registry.
//!
//! A [`Configurator`] composes the rotating writers and stream
//! multiplexers into four named sinks that can be attached and detached at
//! any time, from any thread, while other threads continue emitting:
//!
//! - `console-log`: structured records rendered to the real console
//! - `file-log`: structured records into an hourly-rotated, compressed file
//! - `console-raw`: raw stream writes passed through to the real console
//! - `file-raw`: raw stream writes captured into daily-rotated files
//!
//! Structured records flow through the `tracing` dispatcher built by the
//! configurator; raw writes flow through the [`ChannelStream`] handles it
//! hands out in place of the real stdout/stderr.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing::{Dispatch, Event, span};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::Registry;
use tracing_subscriber::{fmt, reload};

use crate::clock::{Clock, SystemClock};
use crate::config::{SinkConfig, SinkKind};
use crate::error::{Error, Result};
use crate::multiplexer::{ForwardToWriter, PassThrough, SharedStream, StreamMultiplexer};
use crate::rotation::{RetentionPolicy, RotationWindow};
use crate::writer::{RotatingWriter, WriterHandle};

/// Fixed subscriber names the configurator registers on the multiplexers.
const CONSOLE_SUBSCRIBER: &str = "console";
const FILE_SUBSCRIBER: &str = "file";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;
/// Slots for the two structured-log handlers: 0 = console, 1 = file.
type HandlerChain = Vec<Option<LevelGate>>;
type ChainHandle = reload::Handle<HandlerChain, Registry>;

const CONSOLE_SLOT: usize = 0;
const FILE_SLOT: usize = 1;

/// Logical output channel intercepted by the raw sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Stdout,
    Stderr,
}

/// Composes rotating writers and stream multiplexers into runtime-
/// switchable sinks.
///
/// Cloning a configurator shares its state; all methods take `&self` and
/// may be called concurrently with in-flight writes from other threads.
#[derive(Clone)]
pub struct Configurator {
    inner: Arc<Inner>,
}

struct Inner {
    dispatch: Dispatch,
    chain: ChainHandle,
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
}

struct State {
    config: SinkConfig,
    /// The real output streams, captured once at construction and written
    /// to directly whenever no raw sink intercepts the channel.
    real_out: SharedStream,
    real_err: SharedStream,
    out_mux: Arc<StreamMultiplexer>,
    err_mux: Arc<StreamMultiplexer>,
    file_log_writer: Option<Arc<RotatingWriter>>,
    raw_out_writer: Option<Arc<RotatingWriter>>,
    raw_err_writer: Option<Arc<RotatingWriter>>,
    console_log: bool,
    file_log: bool,
    console_raw: bool,
    file_raw: bool,
}

impl State {
    /// The channel handles route through the multiplexers only while at
    /// least one raw sink is active.
    fn raw_active(&self) -> bool {
        self.console_raw || self.file_raw
    }
}

impl Configurator {
    /// Create a configurator over the process's real stdout/stderr.
    pub fn new() -> Self {
        Self::with_streams(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// Create a configurator over substitute output streams.
    pub fn with_streams(out: Box<dyn Write + Send>, err: Box<dyn Write + Send>) -> Self {
        Self::with_parts(out, err, Arc::new(SystemClock))
    }

    /// Create a configurator with substitute streams and an injected clock.
    pub fn with_parts(
        out: Box<dyn Write + Send>,
        err: Box<dyn Write + Send>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (chain_layer, chain) = reload::Layer::new(vec![None, None]);
        let dispatch = Dispatch::new(Registry::default().with(chain_layer));

        let state = State {
            config: SinkConfig::new(),
            real_out: Arc::new(Mutex::new(out)),
            real_err: Arc::new(Mutex::new(err)),
            out_mux: Arc::new(StreamMultiplexer::new()),
            err_mux: Arc::new(StreamMultiplexer::new()),
            file_log_writer: None,
            raw_out_writer: None,
            raw_err_writer: None,
            console_log: false,
            file_log: false,
            console_raw: false,
            file_raw: false,
        };

        Self {
            inner: Arc::new(Inner {
                dispatch,
                chain,
                clock,
                state: Mutex::new(state),
            }),
        }
    }

    /// The `tracing` dispatcher carrying the structured-log sinks.
    ///
    /// Use with `tracing::dispatcher::with_default` for scoped emission;
    /// tests build independent configurators this way to avoid cross-test
    /// bleed.
    pub fn dispatch(&self) -> Dispatch {
        self.inner.dispatch.clone()
    }

    /// Install the dispatcher as the process-wide default.
    pub fn init(&self) -> Result<()> {
        tracing::dispatcher::set_global_default(self.inner.dispatch.clone())
            .map_err(|e| Error::Init(e.to_string()))
    }

    /// Drop-in replacement for the standard output channel.
    pub fn stdout(&self) -> ChannelStream {
        ChannelStream {
            channel: Channel::Stdout,
            inner: self.inner.clone(),
        }
    }

    /// Drop-in replacement for the standard error channel.
    pub fn stderr(&self) -> ChannelStream {
        ChannelStream {
            channel: Channel::Stderr,
            inner: self.inner.clone(),
        }
    }

    /// Full reset: tear down every active sink, install two fresh
    /// multiplexers, then activate exactly the sinks named in `config` at
    /// its severity floor.
    ///
    /// This is the only operation that replaces the multiplexers; `enable`
    /// and `disable` mutate the existing ones in place.
    pub fn setup(&self, config: SinkConfig) -> Result<()> {
        let level = parse_level(&config.level)?;
        let mut state = self.inner.state.lock().unwrap();
        self.teardown_locked(&mut state)?;
        state.out_mux = Arc::new(StreamMultiplexer::new());
        state.err_mux = Arc::new(StreamMultiplexer::new());
        state.config = config;
        for sink in state.config.sinks.clone() {
            self.enable_locked(&mut state, sink, level)?;
        }
        Ok(())
    }

    /// Activate `sink`. Idempotent; for the structured-log sinks `level`
    /// sets that sink's severity floor without touching the other's.
    pub fn enable(&self, sink: SinkKind, level: LevelFilter) -> Result<()> {
        let mut state = self.inner.state.lock().unwrap();
        self.enable_locked(&mut state, sink, level)
    }

    /// Deactivate `sink`, removing exactly what it added. Idempotent.
    pub fn disable(&self, sink: SinkKind) -> Result<()> {
        let mut state = self.inner.state.lock().unwrap();
        self.disable_locked(&mut state, sink)
    }

    /// Activate sinks by name. An empty list or an empty name is a
    /// configuration fault.
    pub fn enable_named(&self, names: &[&str], level: &str) -> Result<()> {
        if names.is_empty() {
            return Err(Error::Config("no sink names given".to_string()));
        }
        let level = parse_level(level)?;
        for name in names {
            self.enable(name.parse()?, level)?;
        }
        Ok(())
    }

    /// Deactivate sinks by name. An empty list or an empty name is a
    /// configuration fault.
    pub fn disable_named(&self, names: &[&str]) -> Result<()> {
        if names.is_empty() {
            return Err(Error::Config("no sink names given".to_string()));
        }
        for name in names {
            self.disable(name.parse()?)?;
        }
        Ok(())
    }

    /// Deactivate every sink. Safe to call when none are active.
    pub fn teardown(&self) -> Result<()> {
        let mut state = self.inner.state.lock().unwrap();
        self.teardown_locked(&mut state)
    }

    /// Whether `sink` is currently active.
    pub fn is_active(&self, sink: SinkKind) -> bool {
        let state = self.inner.state.lock().unwrap();
        match sink {
            SinkKind::ConsoleLog => state.console_log,
            SinkKind::FileLog => state.file_log,
            SinkKind::ConsoleRaw => state.console_raw,
            SinkKind::FileRaw => state.file_raw,
        }
    }

    fn enable_locked(&self, state: &mut State, sink: SinkKind, level: LevelFilter) -> Result<()> {
        match sink {
            SinkKind::ConsoleLog => {
                // Structured console records go to the real stderr, the
                // conventional stream for diagnostics, so they are never
                // re-intercepted by the raw sinks.
                let writer = StreamWriter::new(state.real_err.clone());
                let handler = build_handler(&state.config.format, writer, level);
                self.inner
                    .chain
                    .modify(|chain| chain[CONSOLE_SLOT] = Some(handler))
                    .map_err(|e| Error::Init(e.to_string()))?;
                state.console_log = true;
            }
            SinkKind::FileLog => {
                let writer = match &state.file_log_writer {
                    Some(writer) => writer.clone(),
                    None => {
                        let path = state
                            .config
                            .root_dir
                            .join(format!("{}.log", state.config.prefix));
                        let writer = Arc::new(RotatingWriter::with_clock(
                            &path,
                            RotationWindow::hourly(),
                            RetentionPolicy::new(state.config.retention_days, true),
                            self.inner.clock.clone(),
                        )?);
                        state.file_log_writer = Some(writer.clone());
                        writer
                    }
                };
                let handler =
                    build_handler(&state.config.format, WriterHandle::new(writer), level);
                self.inner
                    .chain
                    .modify(|chain| chain[FILE_SLOT] = Some(handler))
                    .map_err(|e| Error::Init(e.to_string()))?;
                state.file_log = true;
            }
            SinkKind::ConsoleRaw => {
                state.out_mux.subscribe(
                    CONSOLE_SUBSCRIBER,
                    Box::new(PassThrough::new(state.real_out.clone())),
                );
                state.err_mux.subscribe(
                    CONSOLE_SUBSCRIBER,
                    Box::new(PassThrough::new(state.real_err.clone())),
                );
                state.console_raw = true;
            }
            SinkKind::FileRaw => {
                let out_writer = match &state.raw_out_writer {
                    Some(writer) => writer.clone(),
                    None => {
                        let writer = Arc::new(self.raw_writer(&state.config, "stdout")?);
                        state.raw_out_writer = Some(writer.clone());
                        writer
                    }
                };
                let err_writer = match &state.raw_err_writer {
                    Some(writer) => writer.clone(),
                    None => {
                        let writer = Arc::new(self.raw_writer(&state.config, "stderr")?);
                        state.raw_err_writer = Some(writer.clone());
                        writer
                    }
                };
                state
                    .out_mux
                    .subscribe(FILE_SUBSCRIBER, Box::new(ForwardToWriter::new(out_writer)));
                state
                    .err_mux
                    .subscribe(FILE_SUBSCRIBER, Box::new(ForwardToWriter::new(err_writer)));
                state.file_raw = true;
            }
        }
        Ok(())
    }

    fn disable_locked(&self, state: &mut State, sink: SinkKind) -> Result<()> {
        match sink {
            SinkKind::ConsoleLog => {
                self.inner
                    .chain
                    .modify(|chain| chain[CONSOLE_SLOT] = None)
                    .map_err(|e| Error::Init(e.to_string()))?;
                state.console_log = false;
            }
            SinkKind::FileLog => {
                self.inner
                    .chain
                    .modify(|chain| chain[FILE_SLOT] = None)
                    .map_err(|e| Error::Init(e.to_string()))?;
                // The live file handle is released; archives are untouched.
                state.file_log_writer = None;
                state.file_log = false;
            }
            SinkKind::ConsoleRaw => {
                if state.console_raw {
                    state.out_mux.unsubscribe(CONSOLE_SUBSCRIBER)?;
                    state.err_mux.unsubscribe(CONSOLE_SUBSCRIBER)?;
                    state.console_raw = false;
                }
            }
            SinkKind::FileRaw => {
                if state.file_raw {
                    state.out_mux.unsubscribe(FILE_SUBSCRIBER)?;
                    state.err_mux.unsubscribe(FILE_SUBSCRIBER)?;
                    state.raw_out_writer = None;
                    state.raw_err_writer = None;
                    state.file_raw = false;
                }
            }
        }
        Ok(())
    }

    fn teardown_locked(&self, state: &mut State) -> Result<()> {
        for sink in SinkKind::ALL {
            self.disable_locked(state, sink)?;
        }
        Ok(())
    }

    /// Raw stream captures rotate daily and stay uncompressed so they can
    /// be tailed.
    fn raw_writer(&self, config: &SinkConfig, ext: &str) -> Result<RotatingWriter> {
        let path = config.root_dir.join(format!("{}.{}", config.prefix, ext));
        RotatingWriter::with_clock(
            &path,
            RotationWindow::daily(),
            RetentionPolicy::new(config.retention_days, false),
            self.inner.clock.clone(),
        )
    }
}

impl Default for Configurator {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop-in `io::Write` replacement for one of the standard output
/// channels. Producers write to it unaware of interception.
#[derive(Clone)]
pub struct ChannelStream {
    channel: Channel,
    inner: Arc<Inner>,
}

enum Route {
    Direct(SharedStream),
    Fanout(Arc<StreamMultiplexer>),
}

impl ChannelStream {
    fn route(&self) -> Route {
        let state = self.inner.state.lock().unwrap();
        if state.raw_active() {
            Route::Fanout(match self.channel {
                Channel::Stdout => state.out_mux.clone(),
                Channel::Stderr => state.err_mux.clone(),
            })
        } else {
            Route::Direct(match self.channel {
                Channel::Stdout => state.real_out.clone(),
                Channel::Stderr => state.real_err.clone(),
            })
        }
    }
}

impl Write for ChannelStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // The registry lock is released before delivery so sink toggles on
        // other threads are not serialized behind filesystem work.
        match self.route() {
            Route::Direct(stream) => stream.lock().unwrap().write_all(buf)?,
            Route::Fanout(mux) => mux.write(buf).map_err(io::Error::other)?,
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Route::Direct(stream) = self.route() {
            stream.lock().unwrap().flush()?;
        }
        Ok(())
    }
}

/// MakeWriter over one of the saved real streams.
#[derive(Clone)]
struct StreamWriter {
    stream: SharedStream,
}

impl StreamWriter {
    fn new(stream: SharedStream) -> Self {
        Self { stream }
    }
}

impl io::Write for StreamWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.lock().unwrap().flush()
    }
}

impl<'a> MakeWriter<'a> for StreamWriter {
    type Writer = StreamWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// A format layer together with its sink's severity floor, applied on
/// delivery.
///
/// The floor is checked inside the layer rather than hung off the
/// registry as a per-layer filter: filters get their identity when the
/// registry is built, and these handlers are swapped in afterwards
/// through the reload handle.
struct LevelGate {
    floor: LevelFilter,
    inner: BoxedLayer,
}

impl Layer<Registry> for LevelGate {
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, Registry>) {
        self.inner.on_new_span(attrs, id, ctx);
    }

    fn on_record(&self, span: &span::Id, values: &span::Record<'_>, ctx: Context<'_, Registry>) {
        self.inner.on_record(span, values, ctx);
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, Registry>) {
        if event.metadata().level() <= &self.floor {
            self.inner.on_event(event, ctx);
        }
    }

    fn on_enter(&self, id: &span::Id, ctx: Context<'_, Registry>) {
        self.inner.on_enter(id, ctx);
    }

    fn on_exit(&self, id: &span::Id, ctx: Context<'_, Registry>) {
        self.inner.on_exit(id, ctx);
    }

    fn on_close(&self, id: span::Id, ctx: Context<'_, Registry>) {
        self.inner.on_close(id, ctx);
    }
}

fn build_handler<W>(format: &str, writer: W, level: LevelFilter) -> LevelGate
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = fmt::layer::<Registry>()
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer);
    let inner: BoxedLayer = if format == "json" {
        base.json().boxed()
    } else {
        base.boxed()
    };
    LevelGate {
        floor: level,
        inner,
    }
}

fn parse_level(level: &str) -> Result<LevelFilter> {
    level
        .parse::<LevelFilter>()
        .map_err(|_| Error::Config(format!("invalid log level: {level:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::fs;
    use time::macros::datetime;

    #[derive(Clone, Default)]
    struct Capture {
        bytes: Arc<Mutex<Vec<u8>>>,
    }

    impl Capture {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.bytes.lock().unwrap()).into_owned()
        }
    }

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.bytes.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn captured_configurator() -> (Configurator, Capture, Capture) {
        let out = Capture::default();
        let err = Capture::default();
        let configurator = Configurator::with_parts(
            Box::new(out.clone()),
            Box::new(err.clone()),
            Arc::new(ManualClock::new(datetime!(2024-03-16 12:00 UTC))),
        );
        (configurator, out, err)
    }

    #[test]
    fn test_console_log_renders_to_saved_stream() {
        let (configurator, _out, err) = captured_configurator();
        configurator
            .setup(SinkConfig::new().with_sinks([SinkKind::ConsoleLog]))
            .unwrap();

        tracing::dispatcher::with_default(&configurator.dispatch(), || {
            tracing::info!("console record");
        });

        assert!(err.contents().contains("console record"));
    }

    #[test]
    fn test_console_log_level_floor() {
        let (configurator, _out, err) = captured_configurator();
        configurator
            .setup(
                SinkConfig::new()
                    .with_level("warn")
                    .with_sinks([SinkKind::ConsoleLog]),
            )
            .unwrap();

        tracing::dispatcher::with_default(&configurator.dispatch(), || {
            tracing::info!("too quiet");
            tracing::warn!("loud enough");
        });

        let rendered = err.contents();
        assert!(!rendered.contains("too quiet"));
        assert!(rendered.contains("loud enough"));
    }

    #[test]
    fn test_enable_after_setup_renders_first_event() {
        let (configurator, _out, err) = captured_configurator();
        configurator.setup(SinkConfig::new()).unwrap();

        // The handler is swapped in through the reload handle after the
        // registry was built; the very next record must render.
        configurator
            .enable(SinkKind::ConsoleLog, LevelFilter::INFO)
            .unwrap();
        tracing::dispatcher::with_default(&configurator.dispatch(), || {
            tracing::info!("attached at runtime");
        });

        assert!(err.contents().contains("attached at runtime"));
    }

    #[test]
    fn test_per_sink_level_floors_are_independent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (configurator, _out, err) = captured_configurator();
        configurator
            .setup(SinkConfig::new().with_root_dir(dir.path()))
            .unwrap();

        configurator
            .enable(SinkKind::ConsoleLog, LevelFilter::WARN)
            .unwrap();
        configurator
            .enable(SinkKind::FileLog, LevelFilter::INFO)
            .unwrap();

        tracing::dispatcher::with_default(&configurator.dispatch(), || {
            tracing::info!("quiet detail");
            tracing::warn!("loud problem");
        });

        let rendered = err.contents();
        assert!(!rendered.contains("quiet detail"));
        assert!(rendered.contains("loud problem"));

        let content = fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert!(content.contains("quiet detail"));
        assert!(content.contains("loud problem"));
    }

    #[test]
    fn test_file_log_writes_through_rotating_writer() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (configurator, _out, _err) = captured_configurator();
        configurator
            .setup(
                SinkConfig::new()
                    .with_root_dir(dir.path())
                    .with_sinks([SinkKind::FileLog]),
            )
            .unwrap();

        tracing::dispatcher::with_default(&configurator.dispatch(), || {
            tracing::info!("file record");
        });

        let content = fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert!(content.contains("file record"));
        assert!(!content.contains('\x1b'), "ANSI escape found in log file");
    }

    #[test]
    fn test_disable_twice_does_not_raise() {
        let (configurator, _out, _err) = captured_configurator();
        configurator.setup(SinkConfig::new()).unwrap();

        configurator.disable(SinkKind::FileLog).unwrap();
        configurator.disable(SinkKind::FileLog).unwrap();
        configurator.disable(SinkKind::ConsoleRaw).unwrap();
        configurator.disable(SinkKind::ConsoleRaw).unwrap();
    }

    #[test]
    fn test_enable_console_raw_twice_delivers_once() {
        let (configurator, out, _err) = captured_configurator();
        configurator.setup(SinkConfig::new()).unwrap();

        configurator
            .enable(SinkKind::ConsoleRaw, LevelFilter::INFO)
            .unwrap();
        configurator
            .enable(SinkKind::ConsoleRaw, LevelFilter::INFO)
            .unwrap();

        let mut stdout = configurator.stdout();
        stdout.write_all(b"once\n").unwrap();

        assert_eq!(out.contents(), "once\n");
    }

    #[test]
    fn test_raw_writes_bypass_mux_after_teardown() {
        let (configurator, out, _err) = captured_configurator();
        configurator
            .setup(SinkConfig::new().with_sinks([SinkKind::ConsoleRaw]))
            .unwrap();

        let mut stdout = configurator.stdout();
        stdout.write_all(b"through mux\n").unwrap();

        configurator.teardown().unwrap();
        assert!(!configurator.is_active(SinkKind::ConsoleRaw));

        // With no raw sink active, writes go straight to the saved stream.
        stdout.write_all(b"direct\n").unwrap();
        assert_eq!(out.contents(), "through mux\ndirect\n");
    }

    #[test]
    fn test_file_raw_skips_blank_chunks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (configurator, _out, _err) = captured_configurator();
        configurator
            .setup(
                SinkConfig::new()
                    .with_root_dir(dir.path())
                    .with_sinks([SinkKind::FileRaw]),
            )
            .unwrap();

        let mut stdout = configurator.stdout();
        stdout.write_all(b"hello").unwrap();
        stdout.write_all(b"\n").unwrap();
        stdout.write_all(b"world\n").unwrap();

        let content = fs::read_to_string(dir.path().join("app.stdout")).unwrap();
        assert_eq!(content, "hello\nworld\n");
    }

    #[test]
    fn test_file_raw_channels_do_not_cross_deliver() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (configurator, _out, _err) = captured_configurator();
        configurator
            .setup(
                SinkConfig::new()
                    .with_root_dir(dir.path())
                    .with_sinks([SinkKind::FileRaw]),
            )
            .unwrap();

        configurator.stdout().write_all(b"to stdout\n").unwrap();
        configurator.stderr().write_all(b"to stderr\n").unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("app.stdout")).unwrap(),
            "to stdout\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("app.stderr")).unwrap(),
            "to stderr\n"
        );
    }

    #[test]
    fn test_setup_resets_previous_sinks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (configurator, _out, err) = captured_configurator();
        configurator
            .setup(SinkConfig::new().with_sinks([SinkKind::ConsoleLog]))
            .unwrap();
        assert!(configurator.is_active(SinkKind::ConsoleLog));

        configurator
            .setup(
                SinkConfig::new()
                    .with_root_dir(dir.path())
                    .with_sinks([SinkKind::FileLog]),
            )
            .unwrap();
        assert!(!configurator.is_active(SinkKind::ConsoleLog));
        assert!(configurator.is_active(SinkKind::FileLog));

        tracing::dispatcher::with_default(&configurator.dispatch(), || {
            tracing::info!("after reset");
        });

        assert!(!err.contents().contains("after reset"));
        let content = fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert!(content.contains("after reset"));
    }

    #[test]
    fn test_named_operations_reject_empty_arguments() {
        let (configurator, _out, _err) = captured_configurator();
        configurator.setup(SinkConfig::new()).unwrap();

        assert!(matches!(
            configurator.enable_named(&[], "info"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            configurator.enable_named(&[""], "info"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            configurator.disable_named(&[]),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            configurator.disable_named(&["nonsense"]),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_named_operations_round_trip() {
        let (configurator, out, _err) = captured_configurator();
        configurator.setup(SinkConfig::new()).unwrap();

        configurator
            .enable_named(&["console-raw"], "info")
            .unwrap();
        assert!(configurator.is_active(SinkKind::ConsoleRaw));

        configurator.stdout().write_all(b"ping\n").unwrap();
        assert_eq!(out.contents(), "ping\n");

        configurator.disable_named(&["console-raw"]).unwrap();
        assert!(!configurator.is_active(SinkKind::ConsoleRaw));
    }

    #[test]
    fn test_invalid_level_rejected() {
        let (configurator, _out, _err) = captured_configurator();
        let result = configurator.setup(
            SinkConfig::new()
                .with_level("shout")
                .with_sinks([SinkKind::ConsoleLog]),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
