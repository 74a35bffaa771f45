//! Hand-off of network updates to the render thread.
//!
//! The network side sends whole updates; the render thread drains them at
//! the start of a frame, so a frame only ever sees complete reports.

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};

use crate::surfaces::SurfaceReport;
use crate::visual_state::PositionReport;

/// One update for a tracked aircraft.
#[derive(Clone, Debug, PartialEq)]
pub enum AircraftUpdate {
    Position(PositionReport),
    Surfaces(SurfaceReport),
    Info { origin: String, destination: String },
}

/// The render side hung up.
#[derive(Debug, thiserror::Error)]
#[error("aircraft update receiver disconnected")]
pub struct InboxClosed;

/// Network-side handle. Cheap to clone across threads.
#[derive(Clone, Debug)]
pub struct UpdateSender {
    tx: Sender<AircraftUpdate>,
}

impl UpdateSender {
    pub fn send(&self, update: AircraftUpdate) -> Result<(), InboxClosed> {
        self.tx.send(update).map_err(|_| InboxClosed)
    }
}

/// Render-side handle.
#[derive(Debug)]
pub struct UpdateReceiver {
    rx: Receiver<AircraftUpdate>,
    closed: bool,
}

impl UpdateReceiver {
    /// Everything queued right now, oldest first. Never blocks.
    pub fn drain(&mut self) -> Vec<AircraftUpdate> {
        let mut updates = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(update) => updates.push(update),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
        updates
    }

    /// `true` once a drain found every sender dropped and the queue empty.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Creates a connected sender/receiver pair.
pub fn aircraft_channel() -> (UpdateSender, UpdateReceiver) {
    let (tx, rx) = unbounded();
    (UpdateSender { tx }, UpdateReceiver { rx, closed: false })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(n: usize) -> AircraftUpdate {
        AircraftUpdate::Info {
            origin: format!("ORG{n}"),
            destination: "DST".to_string(),
        }
    }

    #[test]
    fn test_drain_preserves_order() {
        let (tx, mut rx) = aircraft_channel();
        for n in 0..3 {
            tx.send(info(n)).unwrap();
        }
        let drained = rx.drain();
        assert_eq!(drained, vec![info(0), info(1), info(2)]);
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn test_sender_from_other_thread() {
        let (tx, mut rx) = aircraft_channel();
        let handles: Vec<_> = (0..4)
            .map(|n| {
                let tx = tx.clone();
                std::thread::spawn(move || tx.send(info(n)).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(rx.len(), 4);
        assert_eq!(rx.drain().len(), 4);
    }

    #[test]
    fn test_send_after_receiver_dropped_fails() {
        let (tx, rx) = aircraft_channel();
        drop(rx);
        assert!(tx.send(info(0)).is_err());
    }

    #[test]
    fn test_closed_after_senders_dropped() {
        let (tx, mut rx) = aircraft_channel();
        tx.send(info(0)).unwrap();
        drop(tx);
        assert!(!rx.is_closed());
        assert_eq!(rx.drain().len(), 1);
        assert!(rx.is_closed());
    }
}
