//! Single-shot trailing debounce timer.
//!
//! Restarting aborts the pending timer task. Every timer also carries a token,
//! so an elapsed message already queued when its task was aborted is rejected
//! by [`DebounceTimer::fire`].

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Identifies one armed timer
pub type DebounceToken = u64;

#[derive(Debug)]
pub struct DebounceTimer {
    delay: Duration,
    next_token: DebounceToken,
    pending: Option<(DebounceToken, JoinHandle<()>)>,
}

impl DebounceTimer {
    pub fn new(delay: Duration) -> Self {
        DebounceTimer {
            delay,
            next_token: 0,
            pending: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Cancel any pending timer and arm a new one.
    ///
    /// When it elapses, `make_event(token)` is sent on `events`.
    pub fn restart<E, F>(&mut self, events: &UnboundedSender<E>, make_event: F) -> DebounceToken
    where
        E: Send + 'static,
        F: FnOnce(DebounceToken) -> E + Send + 'static,
    {
        self.cancel();
        let token = self.next_token;
        self.next_token += 1;

        let delay = self.delay;
        let events = events.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(make_event(token));
        });
        self.pending = Some((token, handle));
        token
    }

    /// Abort the pending timer, if any
    pub fn cancel(&mut self) {
        if let Some((_, handle)) = self.pending.take() {
            handle.abort();
        }
    }

    /// Accept an elapsed token. Returns true only for the currently armed timer,
    /// which is then disarmed.
    pub fn fire(&mut self, token: DebounceToken) -> bool {
        match self.pending {
            Some((current, _)) if current == token => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}

impl Drop for DebounceTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
