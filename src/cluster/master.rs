use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Told about every master transition of every cluster this node belongs to.
pub trait MasterSwitcher: Send + Sync {
    fn master_switched(&self, cluster_id: &str, new_master: Option<&str>, is_master: bool);
}

/// MasterSwitchRegistry holds the switchers to notify on master transitions.
#[derive(Default)]
pub struct MasterSwitchRegistry {
    switchers: Mutex<Vec<Arc<dyn MasterSwitcher>>>,
}

fn same_switcher(a: &Arc<dyn MasterSwitcher>, b: &Arc<dyn MasterSwitcher>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

impl MasterSwitchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the switcher was already registered.
    pub fn register(&self, switcher: Arc<dyn MasterSwitcher>) -> bool {
        let mut switchers = self
            .switchers
            .lock()
            .expect("MasterSwitchRegistry.register() mutex guard poison");
        if switchers.iter().any(|known| same_switcher(known, &switcher)) {
            return false;
        }
        switchers.push(switcher);
        true
    }

    pub fn unregister(&self, switcher: &Arc<dyn MasterSwitcher>) -> bool {
        let mut switchers = self
            .switchers
            .lock()
            .expect("MasterSwitchRegistry.unregister() mutex guard poison");
        let before = switchers.len();
        switchers.retain(|known| !same_switcher(known, switcher));
        switchers.len() != before
    }

    pub(crate) fn notify(&self, cluster_id: &str, new_master: Option<&str>, is_master: bool) {
        // Switchers may register others while being notified.
        let switchers = self
            .switchers
            .lock()
            .expect("MasterSwitchRegistry.notify() mutex guard poison")
            .clone();
        for switcher in switchers {
            switcher.master_switched(cluster_id, new_master, is_master);
        }
    }
}

/// Follows the master of one cluster.
#[derive(Clone)]
pub struct MasterListener {
    rcv: watch::Receiver<Option<String>>,
}

impl MasterListener {
    pub(crate) fn new(rcv: watch::Receiver<Option<String>>) -> Self {
        MasterListener { rcv }
    }

    pub fn current(&self) -> Option<String> {
        self.rcv.borrow().clone()
    }

    /// Waits for the next master transition. None once the membership is gone.
    pub async fn next(&mut self) -> Option<Option<String>> {
        match self.rcv.changed().await {
            Ok(_) => Some(self.rcv.borrow().clone()),
            Err(_) => None,
        }
    }

    /// Returns as soon as a master is known.
    pub async fn wait_for_master(&mut self) -> Option<String> {
        loop {
            if let Some(master) = self.current() {
                return Some(master);
            }
            if self.rcv.changed().await.is_err() {
                return None;
            }
        }
    }
}
