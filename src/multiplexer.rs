use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::writer::RotatingWriter;

/// A write callback registered with a [`StreamMultiplexer`] under a
/// unique name.
pub trait Subscriber: Send {
    fn deliver(&mut self, chunk: &[u8]) -> Result<()>;
}

/// A saved real output stream, shareable across sinks and threads.
pub type SharedStream = Arc<Mutex<Box<dyn Write + Send>>>;

type SharedSubscriber = Arc<Mutex<Box<dyn Subscriber>>>;

/// Fans every write aimed at one logical output channel out to a dynamic
/// set of named subscribers.
///
/// One instance exists per channel (stdout, stderr); they never
/// cross-deliver.
pub struct StreamMultiplexer {
    /// Insertion order is preserved for iteration; delivery order across
    /// subscribers is not a contract.
    subscribers: Mutex<Vec<(String, SharedSubscriber)>>,
}

impl StreamMultiplexer {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Register `subscriber` under `name`. Re-subscribing an existing name
    /// supersedes the previous subscriber and keeps its position.
    pub fn subscribe(&self, name: &str, subscriber: Box<dyn Subscriber>) {
        let mut subscribers = self.subscribers.lock().unwrap();
        let shared = Arc::new(Mutex::new(subscriber));
        match subscribers.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = shared,
            None => subscribers.push((name.to_string(), shared)),
        }
    }

    /// Remove the subscriber registered under `name`.
    ///
    /// Unsubscribing an absent name signals a configurator bug and is
    /// surfaced, not swallowed.
    pub fn unsubscribe(&self, name: &str) -> Result<()> {
        let mut subscribers = self.subscribers.lock().unwrap();
        match subscribers.iter().position(|(n, _)| n == name) {
            Some(idx) => {
                subscribers.remove(idx);
                Ok(())
            }
            None => Err(Error::SubscriberNotFound(name.to_string())),
        }
    }

    /// Names of the currently registered subscribers, in registration order.
    pub fn subscriber_names(&self) -> Vec<String> {
        self.subscribers
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.lock().unwrap().is_empty()
    }

    /// Deliver `chunk` to every registered subscriber, in registration
    /// order, synchronously on the caller's thread.
    ///
    /// Iteration uses a snapshot taken up front, so a subscriber may change
    /// the set without invalidating the broadcast in progress. A failing
    /// subscriber does not stop delivery to the rest; the first failure is
    /// returned once the broadcast completes.
    pub fn write(&self, chunk: &[u8]) -> Result<()> {
        let snapshot: Vec<(String, SharedSubscriber)> =
            self.subscribers.lock().unwrap().iter().cloned().collect();

        let mut first_failure = None;
        for (name, subscriber) in snapshot {
            if let Err(e) = subscriber.lock().unwrap().deliver(chunk)
                && first_failure.is_none()
            {
                first_failure = Some(Error::Subscriber {
                    name,
                    source: Box::new(e),
                });
            }
        }

        match first_failure {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

impl Default for StreamMultiplexer {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscriber that writes every chunk verbatim to the saved real stream.
pub struct PassThrough {
    stream: SharedStream,
}

impl PassThrough {
    pub fn new(stream: SharedStream) -> Self {
        Self { stream }
    }
}

impl Subscriber for PassThrough {
    fn deliver(&mut self, chunk: &[u8]) -> Result<()> {
        let mut stream = self.stream.lock().unwrap();
        stream.write_all(chunk)?;
        stream.flush()?;
        Ok(())
    }
}

/// Subscriber that forwards each chunk into a rotating writer.
pub struct ForwardToWriter {
    writer: Arc<RotatingWriter>,
}

impl ForwardToWriter {
    pub fn new(writer: Arc<RotatingWriter>) -> Self {
        Self { writer }
    }
}

impl Subscriber for ForwardToWriter {
    fn deliver(&mut self, chunk: &[u8]) -> Result<()> {
        // print-style producers emit bare newlines as separate writes;
        // skip them so the archive has no blank lines.
        if chunk.iter().all(|b| matches!(b, b'\n' | b'\r')) {
            return Ok(());
        }
        self.writer.append(chunk)?;
        if !chunk.ends_with(b"\n") {
            self.writer.append(b"\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recording {
        chunks: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl Recording {
        fn pair() -> (Box<dyn Subscriber>, Arc<Mutex<Vec<Vec<u8>>>>) {
            let chunks = Arc::new(Mutex::new(Vec::new()));
            (
                Box::new(Recording {
                    chunks: chunks.clone(),
                }),
                chunks,
            )
        }
    }

    impl Subscriber for Recording {
        fn deliver(&mut self, chunk: &[u8]) -> Result<()> {
            self.chunks.lock().unwrap().push(chunk.to_vec());
            Ok(())
        }
    }

    struct Failing;

    impl Subscriber for Failing {
        fn deliver(&mut self, _chunk: &[u8]) -> Result<()> {
            Err(Error::Config("broken on purpose".to_string()))
        }
    }

    #[test]
    fn test_fan_out_delivers_to_each_subscriber_once() {
        let mux = StreamMultiplexer::new();
        let (a, a_chunks) = Recording::pair();
        let (b, b_chunks) = Recording::pair();
        mux.subscribe("a", a);
        mux.subscribe("b", b);

        mux.write(b"x").unwrap();

        assert_eq!(*a_chunks.lock().unwrap(), vec![b"x".to_vec()]);
        assert_eq!(*b_chunks.lock().unwrap(), vec![b"x".to_vec()]);

        mux.unsubscribe("a").unwrap();
        mux.write(b"y").unwrap();

        assert_eq!(a_chunks.lock().unwrap().len(), 1);
        assert_eq!(b_chunks.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_resubscribe_replaces_without_duplicating() {
        let mux = StreamMultiplexer::new();
        let (old, old_chunks) = Recording::pair();
        let (new, new_chunks) = Recording::pair();
        mux.subscribe("a", old);
        mux.subscribe("a", new);

        mux.write(b"x").unwrap();

        assert_eq!(mux.subscriber_names(), vec!["a".to_string()]);
        assert!(old_chunks.lock().unwrap().is_empty());
        assert_eq!(new_chunks.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unsubscribe_absent_name_is_surfaced() {
        let mux = StreamMultiplexer::new();
        match mux.unsubscribe("ghost") {
            Err(Error::SubscriberNotFound(name)) => assert_eq!(name, "ghost"),
            other => panic!("expected SubscriberNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_failing_subscriber_does_not_block_others() {
        let mux = StreamMultiplexer::new();
        mux.subscribe("bad", Box::new(Failing));
        let (good, good_chunks) = Recording::pair();
        mux.subscribe("good", good);

        let err = mux.write(b"x").unwrap_err();
        match err {
            Error::Subscriber { name, .. } => assert_eq!(name, "bad"),
            other => panic!("expected Subscriber error, got {other:?}"),
        }
        assert_eq!(good_chunks.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_registration_order_preserved() {
        let mux = StreamMultiplexer::new();
        let (a, _) = Recording::pair();
        let (b, _) = Recording::pair();
        let (c, _) = Recording::pair();
        mux.subscribe("a", a);
        mux.subscribe("b", b);
        mux.subscribe("c", c);
        mux.unsubscribe("b").unwrap();

        assert_eq!(
            mux.subscriber_names(),
            vec!["a".to_string(), "c".to_string()]
        );
    }
}
