use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RepositoryState {
    Load,
    Reload,
}

/// A repository-wide transaction starting (`done == false`) or finishing (`done == true`).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RepositoryEvent {
    pub state: RepositoryState,
    pub done: bool,
}

pub(crate) fn new() -> RepositoryEventNotifier {
    let (snd, _) = broadcast::channel(64);
    RepositoryEventNotifier { snd }
}

pub(crate) struct RepositoryEventNotifier {
    snd: broadcast::Sender<RepositoryEvent>,
}

impl RepositoryEventNotifier {
    pub(crate) fn notify(&self, state: RepositoryState, done: bool) {
        // No subscribers is fine.
        let _ = self.snd.send(RepositoryEvent { state, done });
    }

    pub(crate) fn listener(&self) -> RepositoryEventListener {
        RepositoryEventListener {
            rcv: self.snd.subscribe(),
        }
    }
}

pub struct RepositoryEventListener {
    rcv: broadcast::Receiver<RepositoryEvent>,
}

impl RepositoryEventListener {
    /// `next()` waits for the next event. Events missed by a slow listener are skipped.
    pub async fn next(&mut self) -> Option<RepositoryEvent> {
        loop {
            match self.rcv.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// `try_next()` returns an already delivered event, if any.
    pub fn try_next(&mut self) -> Option<RepositoryEvent> {
        loop {
            match self.rcv.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
