//! Background layout jitter.
//!
//! A worker thread receives position snapshots and answers each with the
//! same ids, every coordinate nudged by up to ±amplitude/2. It never sees
//! live nodes; the session applies results wholesale on its own thread.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use dg_core::PositionRecord;
use std::thread::JoinHandle;
use std::time::Duration;

/// Small deterministic PRNG (SplitMix64).
#[derive(Debug, Clone)]
pub struct SplitMix64(u64);

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Perturb every position by `(r − 0.5) · amplitude` per axis.
pub fn jitter(positions: &[PositionRecord], amplitude: f64, rng: &mut SplitMix64) -> Vec<PositionRecord> {
    positions
        .iter()
        .map(|p| PositionRecord {
            id: p.id,
            x: p.x + (rng.next_f64() - 0.5) * amplitude,
            y: p.y + (rng.next_f64() - 0.5) * amplitude,
        })
        .collect()
}

pub struct LayoutWorker {
    requests: Option<Sender<Vec<PositionRecord>>>,
    results: Receiver<Vec<PositionRecord>>,
    handle: Option<JoinHandle<()>>,
}

impl LayoutWorker {
    /// Spawn a worker with a fixed seed (reproducible output).
    pub fn spawn(amplitude: f64, seed: u64) -> Self {
        let (req_tx, req_rx) = unbounded::<Vec<PositionRecord>>();
        let (res_tx, res_rx) = unbounded::<Vec<PositionRecord>>();
        let handle = std::thread::spawn(move || {
            let mut rng = SplitMix64::new(seed);
            while let Ok(snapshot) = req_rx.recv() {
                log::trace!("jittering {} positions", snapshot.len());
                if res_tx.send(jitter(&snapshot, amplitude, &mut rng)).is_err() {
                    break;
                }
            }
            log::debug!("layout worker exiting");
        });
        Self {
            requests: Some(req_tx),
            results: res_rx,
            handle: Some(handle),
        }
    }

    /// Spawn with a random seed.
    pub fn spawn_random(amplitude: f64) -> Self {
        let seed = uuid::Uuid::new_v4().as_u64_pair().0;
        Self::spawn(amplitude, seed)
    }

    /// Queue a snapshot. Returns `false` if the worker has gone away.
    pub fn submit(&self, snapshot: Vec<PositionRecord>) -> bool {
        match &self.requests {
            Some(tx) => tx.send(snapshot).is_ok(),
            None => false,
        }
    }

    /// A finished result, if one is ready.
    pub fn try_result(&self) -> Option<Vec<PositionRecord>> {
        self.results.try_recv().ok()
    }

    pub fn wait_result(&self, timeout: Duration) -> Option<Vec<PositionRecord>> {
        match self.results.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("layout worker disconnected");
                None
            }
        }
    }

    /// Close the request channel and join the thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::warn!("layout worker panicked");
        }
    }
}

impl Drop for LayoutWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
