// src/exec/comm.rs

//! In-process stand-in for a message-passing runtime.
//!
//! A [`World`] of `size` ranks is wired with point-to-point channels; each
//! rank gets a [`Communicator`] offering the two collectives the distributed
//! strategy needs. Payloads are opaque byte buffers, so ranks never share
//! memory and every rank works on its own decoded copy of the data.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use crossbeam_channel::{bounded, Receiver, Sender};
use log::trace;
use crate::error::{Error, Result};

/// Rank that roots both collectives.
pub const COORDINATOR: usize = 0;

#[derive(Debug, Default)]
pub struct CollectiveStats {
    broadcasts: AtomicUsize,
    gathers: AtomicUsize,
}

impl CollectiveStats {
    pub fn broadcasts(&self) -> usize {
        self.broadcasts.load(Ordering::Relaxed)
    }

    pub fn gathers(&self) -> usize {
        self.gathers.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.broadcasts() + self.gathers()
    }
}

pub struct World;

impl World {
    /// Wire up `size` communicators, indexed by rank.
    pub fn create(size: usize) -> Result<(Vec<Communicator>, Arc<CollectiveStats>)> {
        if size == 0 {
            return Err(Error::communication("a world needs at least one rank"));
        }

        let stats = Arc::new(CollectiveStats::default());
        let (gather_tx, gather_rx) = bounded::<(usize, Vec<u8>)>(size);

        let mut peers = Vec::with_capacity(size - 1);
        let mut inboxes = Vec::with_capacity(size - 1);
        for _ in 1..size {
            let (tx, rx) = bounded::<Vec<u8>>(1);
            peers.push(tx);
            inboxes.push(rx);
        }

        let mut comms = Vec::with_capacity(size);
        comms.push(Communicator {
            rank: COORDINATOR,
            size,
            link: Link::Coordinator { peers, gather_rx },
            stats: Arc::clone(&stats),
        });
        for (offset, inbox) in inboxes.into_iter().enumerate() {
            comms.push(Communicator {
                rank: offset + 1,
                size,
                link: Link::Worker { inbox, gather_tx: gather_tx.clone() },
                stats: Arc::clone(&stats),
            });
        }
        // Only workers hold gather senders, so the coordinator sees a
        // disconnect once every worker has exited.
        drop(gather_tx);

        Ok((comms, stats))
    }
}

enum Link {
    Coordinator {
        peers: Vec<Sender<Vec<u8>>>,
        gather_rx: Receiver<(usize, Vec<u8>)>,
    },
    Worker {
        inbox: Receiver<Vec<u8>>,
        gather_tx: Sender<(usize, Vec<u8>)>,
    },
}

/// One rank's endpoint. Dropping it releases every rank waiting on it.
pub struct Communicator {
    rank: usize,
    size: usize,
    link: Link,
    stats: Arc<CollectiveStats>,
}

impl Communicator {
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_coordinator(&self) -> bool {
        self.rank == COORDINATOR
    }

    /// The coordinator supplies `payload` and every rank returns a copy of it.
    pub fn broadcast(&self, payload: Option<Vec<u8>>) -> Result<Vec<u8>> {
        match &self.link {
            Link::Coordinator { peers, .. } => {
                let payload = payload.ok_or_else(|| {
                    Error::invalid_state("coordinator must supply the broadcast payload")
                })?;
                for (offset, peer) in peers.iter().enumerate() {
                    peer.send(payload.clone()).map_err(|_| {
                        Error::communication(format!("rank {} left before the broadcast", offset + 1))
                    })?;
                }
                self.stats.broadcasts.fetch_add(1, Ordering::Relaxed);
                trace!("Broadcast {} bytes to {} ranks", payload.len(), peers.len());
                Ok(payload)
            },
            Link::Worker { inbox, .. } => inbox.recv().map_err(|_| {
                Error::communication(format!("rank {}: coordinator left before the broadcast", self.rank))
            }),
        }
    }

    /// Every rank contributes `payload`; the coordinator receives all of them
    /// ordered by rank, the others receive `None`.
    pub fn gather(&self, payload: Vec<u8>) -> Result<Option<Vec<Vec<u8>>>> {
        match &self.link {
            Link::Worker { gather_tx, .. } => {
                gather_tx.send((self.rank, payload)).map_err(|_| {
                    Error::communication(format!("rank {}: coordinator left before the gather", self.rank))
                })?;
                Ok(None)
            },
            Link::Coordinator { gather_rx, .. } => {
                let mut slots: Vec<Option<Vec<u8>>> = vec![None; self.size];
                slots[COORDINATOR] = Some(payload);

                for _ in 1..self.size {
                    let (rank, bytes) = gather_rx.recv().map_err(|_| {
                        Error::communication("a rank exited without contributing to the gather")
                    })?;
                    match slots.get_mut(rank) {
                        Some(slot) if slot.is_none() => *slot = Some(bytes),
                        _ => return Err(Error::communication(format!(
                            "unexpected gather contribution from rank {}", rank
                        ))),
                    }
                }

                self.stats.gathers.fetch_add(1, Ordering::Relaxed);
                slots
                    .into_iter()
                    .collect::<Option<Vec<_>>>()
                    .map(Some)
                    .ok_or_else(|| Error::communication("gather finished with missing contributions"))
            },
        }
    }
}
