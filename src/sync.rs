use tokio::sync::watch;

/// The triggering side of a pipeline's termination signal.
///
/// A pipeline run owns exactly one of these. Triggering it is one-way: once terminated, every
/// [TerminateSignal] subscribed to it reports termination for good. Dropping the handle without
/// triggering it has the same effect, so stages can never wait on a signal nobody can send.
#[derive(Debug)]
pub struct Terminate {
    tx: watch::Sender<bool>,
}

impl Default for Terminate {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminate {
    /// Create a new, untriggered termination signal.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Create a new observer of this signal.
    pub fn subscribe(&self) -> TerminateSignal {
        TerminateSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Tell every observer to stop. Calling this more than once does nothing extra.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Check if the signal was already triggered.
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

/// The observing side of a pipeline's termination signal.
///
/// Every stage holds its own clone; observing the signal never consumes it.
#[derive(Debug, Clone)]
pub struct TerminateSignal {
    rx: watch::Receiver<bool>,
}

impl TerminateSignal {
    /// Resolve once the pipeline has been told to terminate.
    ///
    /// Resolves immediately if that already happened. This is cancel safe, so it can be used as a
    /// branch of [tokio::select!].
    pub async fn terminated(&mut self) {
        // An error means the trigger was dropped, which counts as termination.
        let _ = self.rx.wait_for(|terminated| *terminated).await;
    }

    /// Check for termination without waiting.
    pub fn is_terminated(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }
}
