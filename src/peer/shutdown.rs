use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Creates the pair used to stop a `PeerRpcServer`. The server stops on `shutdown()` or once the handle
/// is dropped.
pub fn peer_server_shutdown() -> (PeerServerShutdownHandle, PeerServerShutdownSignal) {
    let (tx, rx) = oneshot::channel();

    (PeerServerShutdownHandle { tx }, PeerServerShutdownSignal { rx })
}

pub struct PeerServerShutdownHandle {
    tx: oneshot::Sender<()>,
}

impl PeerServerShutdownHandle {
    pub fn shutdown(self) {
        // The server may already be gone.
        let _ = self.tx.send(());
    }
}

pub struct PeerServerShutdownSignal {
    rx: oneshot::Receiver<()>,
}

impl Future for PeerServerShutdownSignal {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Sent or dropped, both mean stop.
        Pin::new(&mut self.rx).poll(cx).map(|_| ())
    }
}
