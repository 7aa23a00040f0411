//! Poll-fetch-reduce loop for a live leaderboard.
//!
//! Fetches are tagged with a monotonically increasing sequence number. A
//! response only replaces the held snapshot when its sequence is newer than the
//! one already held, so a slow early request can never overwrite a later one.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct RequestSequence {
    issued: u64,
}

impl RequestSequence {
    pub fn next(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }
}

#[derive(Debug)]
pub struct LatestSnapshot<T> {
    seq: u64,
    value: Option<T>,
}

impl<T> Default for LatestSnapshot<T> {
    fn default() -> Self {
        Self { seq: 0, value: None }
    }
}

impl<T> LatestSnapshot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the held value if `seq` is newer. Returns whether it was taken.
    pub fn offer(&mut self, seq: u64, value: T) -> bool {
        if seq <= self.seq {
            return false;
        }
        self.seq = seq;
        self.value = Some(value);
        true
    }

    pub fn current(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Runs `fetch` every `period`, reducing each result with `reduce` and handing
/// accepted snapshots to `render`.
///
/// With `max_fetches` set the loop returns once that many fetches have been
/// issued and every response has come back; otherwise it runs until the task
/// is dropped.
pub async fn poll<T, S, F, Fut, Red, Ren>(
    period: Duration,
    max_fetches: Option<u64>,
    mut fetch: F,
    reduce: Red,
    mut render: Ren,
) -> Option<S>
where
    T: Send + 'static,
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    Red: Fn(T) -> S,
    Ren: FnMut(u64, &S),
{
    let (tx, mut rx) = mpsc::unbounded_channel::<(u64, anyhow::Result<T>)>();
    let mut ticker = tokio::time::interval(period);
    let mut sequence = RequestSequence::default();
    let mut snapshot = LatestSnapshot::new();
    let mut outstanding = 0u64;

    loop {
        let exhausted = max_fetches.is_some_and(|max| sequence.issued() >= max);
        if exhausted && outstanding == 0 {
            break;
        }

        tokio::select! {
            _ = ticker.tick(), if !exhausted => {
                let seq = sequence.next();
                let request = fetch(seq);
                let tx = tx.clone();
                outstanding += 1;
                tokio::spawn(async move {
                    let _ = tx.send((seq, request.await));
                });
            }
            Some((seq, result)) = rx.recv() => {
                outstanding -= 1;
                match result {
                    Ok(value) => {
                        if snapshot.offer(seq, reduce(value)) {
                            if let Some(current) = snapshot.current() {
                                render(seq, current);
                            }
                        } else {
                            debug!(seq, held = snapshot.seq(), "discarding stale snapshot");
                        }
                    }
                    Err(err) => warn!(seq, error = %err, "fetch failed; keeping previous snapshot"),
                }
            }
        }
    }

    snapshot.value
}
