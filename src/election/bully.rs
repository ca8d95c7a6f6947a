use crate::cluster::ClusterError;
use crate::config::{BullyOptions, BullyOptionsValidated};
use crate::election::api::{
    ElectionClient, ElectionClientFactory, ElectionRecord, ElectionSetup, ElectionTransport, MasterController,
};
use crate::election::message::{BullyKind, BullyMessage};
use crate::election::timers::{self, Clock, HeartbeatHandle, HeartbeatTarget, SystemClock};
use crate::peer::{DispatchError, PeerError, RequestHandler};
use bytes::Bytes;
use chrono::Utc;
use rand::Rng;
use std::convert::TryFrom;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::Notify;
use tokio::time::{Duration, Instant};

const MAX_HISTORY: usize = 100;

/// Creates bully election clients.
#[derive(Clone, Debug, Default)]
pub struct BullyClientFactory {
    options: BullyOptions,
}

impl BullyClientFactory {
    pub fn new(options: BullyOptions) -> Self {
        BullyClientFactory { options }
    }
}

impl ElectionClientFactory for BullyClientFactory {
    fn create(&self, setup: ElectionSetup) -> Result<Arc<dyn ElectionClient>, ClusterError> {
        Ok(Arc::new(BullyClient::new(setup, self.options.clone())?))
    }
}

/// BullyClient elects the member with the highest identity that is alive.
///
/// Starting an election sends `Election` to every higher member. If none answers, this node becomes master
/// and announces it with `Coordinator`. Otherwise it waits for a higher member to announce itself, and
/// starts over if none does in time. The master is pinged periodically and a new election starts when it
/// stops answering.
pub struct BullyClient {
    inner: Arc<BullyInner>,
    _heartbeat: HeartbeatHandle,
}

impl BullyClient {
    /// Must be called from within a tokio runtime.
    pub fn new(setup: ElectionSetup, options: BullyOptions) -> Result<Self, ClusterError> {
        Self::with_clock(setup, options, SystemClock)
    }

    pub(crate) fn with_clock<C: Clock>(setup: ElectionSetup, options: BullyOptions, clock: C) -> Result<Self, ClusterError> {
        let options = BullyOptionsValidated::try_from(options).map_err(|e| ClusterError::Configuration(e.to_string()))?;
        let ElectionSetup {
            logger,
            identity,
            peers,
            callback_path,
            controller,
            transport,
        } = setup;
        let peers = peers.into_iter().filter(|peer| *peer != identity).collect();

        let inner = Arc::new(BullyInner {
            logger,
            identity,
            peers,
            path: format!("{}/bully", callback_path.trim_end_matches('/')),
            options,
            transport,
            controller,
            master: Mutex::new(None),
            history: Mutex::new(Vec::new()),
            electing: AtomicBool::new(false),
            announcements: AtomicU64::new(0),
            announced: Notify::new(),
        });
        let heartbeat = timers::spawn_heartbeat(Arc::downgrade(&inner), inner.options.check_interval, clock);

        Ok(BullyClient {
            inner,
            _heartbeat: heartbeat,
        })
    }
}

impl ElectionClient for BullyClient {
    fn identity(&self) -> &str {
        &self.inner.identity
    }

    fn current_master(&self) -> Option<String> {
        self.inner.current_master()
    }

    fn schedule_election(&self, immediate: bool) {
        self.inner.schedule(immediate);
    }

    fn history(&self) -> Vec<ElectionRecord> {
        self.inner
            .history
            .lock()
            .expect("BullyClient.history() mutex guard poison")
            .clone()
    }

    fn handler(&self) -> Arc<dyn RequestHandler> {
        Arc::new(BullyHandler {
            inner: Arc::downgrade(&self.inner),
        })
    }

    fn handler_path(&self) -> String {
        self.inner.path.clone()
    }
}

#[derive(Debug, Eq, PartialEq)]
enum ElectionOutcome {
    Settled,
    Retry,
    AlreadyRunning,
}

struct BullyInner {
    logger: slog::Logger,
    identity: String,
    // Every other member.
    peers: Vec<String>,
    path: String,
    options: BullyOptionsValidated,
    transport: Arc<dyn ElectionTransport>,
    controller: Arc<dyn MasterController>,
    master: Mutex<Option<String>>,
    history: Mutex<Vec<ElectionRecord>>,
    electing: AtomicBool,
    // Counts Coordinator messages received, so an election only settles on an announcement made after it started.
    announcements: AtomicU64,
    announced: Notify,
}

impl BullyInner {
    fn current_master(&self) -> Option<String> {
        self.master
            .lock()
            .expect("BullyInner.current_master() mutex guard poison")
            .clone()
    }

    fn update_master(&self, master: Option<String>) {
        {
            let mut current = self.master.lock().expect("BullyInner.update_master() mutex guard poison");
            if *current == master {
                return;
            }
            *current = master.clone();

            let mut history = self.history.lock().expect("BullyInner.history mutex guard poison");
            if history.len() == MAX_HISTORY {
                history.remove(0);
            }
            history.push(ElectionRecord {
                master: master.clone(),
                at: Utc::now(),
            });
        }

        slog::info!(self.logger, "Master is now {:?}", master);
        self.controller.set_master(master);
    }

    fn schedule(self: &Arc<Self>, immediate: bool) {
        let delay = if immediate {
            Duration::from_millis(0)
        } else {
            rand::thread_rng().gen_range(Duration::from_millis(0)..=self.options.max_election_jitter)
        };

        let inner = self.clone();
        tokio::spawn(async move {
            if delay > Duration::from_millis(0) {
                tokio::time::sleep(delay).await;
            }
            if inner.run_election().await == ElectionOutcome::Retry {
                inner.schedule(false);
            }
        });
    }

    async fn run_election(&self) -> ElectionOutcome {
        if self.electing.swap(true, Ordering::AcqRel) {
            return ElectionOutcome::AlreadyRunning;
        }
        let outcome = self.elect().await;
        self.electing.store(false, Ordering::Release);
        outcome
    }

    async fn elect(&self) -> ElectionOutcome {
        slog::info!(self.logger, "Starting election");
        let seen = self.announcements.load(Ordering::Acquire);

        let mut answered = false;
        for peer in self.peers.iter().filter(|peer| peer.as_str() > self.identity.as_str()) {
            match self.send(peer, BullyKind::Election).await {
                Ok(reply) if reply.kind == BullyKind::Alive => {
                    slog::debug!(self.logger, "{} is alive, standing down", peer);
                    answered = true;
                }
                Ok(reply) => slog::debug!(self.logger, "Unexpected {:?} from {}", reply.kind, peer),
                Err(e) => slog::debug!(self.logger, "{} did not answer: {}", peer, e),
            }
        }

        if !answered {
            self.become_master().await;
            return ElectionOutcome::Settled;
        }

        if self.wait_for_coordinator(seen).await {
            ElectionOutcome::Settled
        } else {
            slog::warn!(self.logger, "No higher member announced itself, electing again");
            ElectionOutcome::Retry
        }
    }

    async fn become_master(&self) {
        slog::info!(self.logger, "No higher member answered, taking over as master");
        self.update_master(Some(self.identity.clone()));

        for peer in &self.peers {
            if let Err(e) = self.send(peer, BullyKind::Coordinator).await {
                slog::debug!(self.logger, "Could not announce to {}: {}", peer, e);
            }
        }
    }

    async fn wait_for_coordinator(&self, seen: u64) -> bool {
        let deadline = Instant::now() + self.options.election_timeout;
        loop {
            let notified = self.announced.notified();
            if self.has_higher_coordinator(seen) {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.has_higher_coordinator(seen);
            }
        }
    }

    fn has_higher_coordinator(&self, seen: u64) -> bool {
        self.announcements.load(Ordering::Acquire) > seen
            && self
                .current_master()
                .map_or(false, |master| master.as_str() > self.identity.as_str())
    }

    async fn send(&self, peer: &str, kind: BullyKind) -> Result<BullyMessage, PeerError> {
        self.transport
            .send(peer, &self.path, BullyMessage::new(kind, self.identity.clone()))
            .await
    }

    fn handle(self: &Arc<Self>, message: BullyMessage) -> BullyMessage {
        if !self.peers.contains(&message.from) {
            slog::warn!(self.logger, "Ignoring {:?} from unknown member {}", message.kind, message.from);
            return self.reply(BullyKind::Ack);
        }

        match message.kind {
            BullyKind::Election => {
                if self.identity > message.from {
                    self.schedule(true);
                }
                self.reply(BullyKind::Alive)
            }
            BullyKind::Coordinator => {
                self.update_master(Some(message.from.clone()));
                self.announcements.fetch_add(1, Ordering::AcqRel);
                self.announced.notify_waiters();
                if self.identity > message.from {
                    slog::info!(self.logger, "Lower member {} claims master, challenging", message.from);
                    self.schedule(true);
                }
                self.reply(BullyKind::Ack)
            }
            BullyKind::Ping => self.reply(BullyKind::Alive),
            BullyKind::Alive | BullyKind::Ack => self.reply(BullyKind::Ack),
        }
    }

    fn reply(&self, kind: BullyKind) -> BullyMessage {
        BullyMessage::new(kind, self.identity.clone())
    }
}

#[async_trait::async_trait]
impl HeartbeatTarget for BullyInner {
    async fn heartbeat(self: Arc<Self>) {
        match self.current_master() {
            None => {
                slog::debug!(self.logger, "No master known, electing");
                self.schedule(false);
            }
            Some(master) if master == self.identity => {}
            Some(master) => {
                if let Err(e) = self.send(&master, BullyKind::Ping).await {
                    slog::warn!(self.logger, "Master {} is unreachable: {}", master, e);
                    self.update_master(None);
                    self.schedule(true);
                }
            }
        }
    }
}

struct BullyHandler {
    inner: Weak<BullyInner>,
}

#[async_trait::async_trait]
impl RequestHandler for BullyHandler {
    async fn handle(&self, payload: Bytes) -> Result<Bytes, DispatchError> {
        let inner = self
            .inner
            .upgrade()
            .ok_or_else(|| DispatchError::Failed("Election client has stopped".to_string()))?;
        let message = BullyMessage::decode(&payload).map_err(|e| DispatchError::BadRequest(e.to_string()))?;

        Ok(inner.handle(message).encode())
    }
}
