//! Single-flight coordination for token refresh.
//!
//! When several concurrent requests hit authorization expiry at once,
//! exactly one of them performs the refresh call; the rest park on a
//! waiter list and are released in arrival order once the refresh
//! settles. The flag exists to prevent redundant network calls, not to
//! protect memory.

use std::sync::Mutex;

use tokio::sync::oneshot;

/// Outcome delivered to every parked waiter.
pub(crate) type RefreshResult = Result<String, RefreshFailed>;

/// The refresh call itself failed; the session has been cleared by the
/// leader before settling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("token refresh failed")]
pub(crate) struct RefreshFailed;

#[derive(Debug)]
enum RefreshState {
    Idle,
    /// A refresh call is in flight. Waiters are drained in push order.
    InFlight {
        waiters: Vec<oneshot::Sender<RefreshResult>>,
    },
}

/// What a caller that hit authorization expiry should do next.
#[derive(Debug)]
pub(crate) enum Ticket {
    /// No refresh was in flight; this caller performs it and must call
    /// [RefreshCoordinator::settle] exactly once.
    Leader,
    /// A refresh is already in flight; await the result.
    Waiter(oneshot::Receiver<RefreshResult>),
}

#[derive(Debug)]
pub(crate) struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub(crate) fn new() -> Self {
        RefreshCoordinator {
            state: Mutex::new(RefreshState::Idle),
        }
    }

    /// Joins the current expiry event.
    pub(crate) fn join(&self) -> Ticket {
        let mut state = self.state.lock().expect("refresh lock poisoned");
        match *state {
            RefreshState::Idle => {
                *state = RefreshState::InFlight { waiters: vec![] };
                Ticket::Leader
            },
            RefreshState::InFlight { ref mut waiters } => {
                let (tx, rx) = oneshot::channel();
                waiters.push(tx);
                Ticket::Waiter(rx)
            },
        }
    }

    /// Settles the in-flight refresh, releasing waiters in arrival order.
    ///
    /// Only the leader calls this.
    pub(crate) fn settle(&self, result: RefreshResult) {
        let waiters = {
            let mut state = self.state.lock().expect("refresh lock poisoned");
            match std::mem::replace(&mut *state, RefreshState::Idle) {
                RefreshState::InFlight { waiters } => waiters,
                // settle without join is a bug, but not worth a panic
                RefreshState::Idle => vec![],
            }
        };
        for waiter in waiters {
            // a dropped receiver means the caller went away; fine
            let _ = waiter.send(result.clone());
        }
    }
}
