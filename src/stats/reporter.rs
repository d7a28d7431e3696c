// src/stats/reporter.rs
use crossbeam_channel::{Receiver, Sender, select};
use std::fmt;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Hashes counted during one reporting interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HashRate {
    /// Candidates evaluated during the interval
    pub hashes: u64,
    /// Length of the interval
    pub interval: Duration,
}

impl HashRate {
    /// Hashes per second over the interval
    pub fn per_second(&self) -> f64 {
        let secs = self.interval.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.hashes as f64 / secs
    }
}

impl fmt::Display for HashRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:8.2} K/s", self.per_second() / 1000.0)
    }
}

/// Totals over the aggregator's whole lifetime
#[derive(Debug, Clone, Default)]
pub struct MiningStats {
    /// Total number of hashes counted
    pub hashes_total: u64,
    /// Number of interval samples emitted
    pub samples: u64,
    /// Wall time the aggregator ran
    pub elapsed: Duration,
}

impl MiningStats {
    /// Average hashrate over the aggregator's lifetime (hashes per second)
    pub fn avg_hashrate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.hashes_total as f64 / secs
    }
}

/// Per-interval hash counter
///
/// Owned by exactly one consumer thread; producers never touch it.
#[derive(Debug, Default)]
pub struct HashCounter {
    count: u64,
    total: u64,
}

impl HashCounter {
    /// Adds `n` hashes to the current interval
    pub fn record(&mut self, n: u64) {
        self.count += n;
        self.total += n;
    }

    /// Hashes counted since the last flush
    pub fn current(&self) -> u64 {
        self.count
    }

    /// Closes the current interval and resets the counter to zero
    pub fn flush(&mut self, interval: Duration) -> HashRate {
        let hashes = std::mem::take(&mut self.count);
        HashRate { hashes, interval }
    }
}

/// Periodic hashrate reporter
///
/// Collects hash-count increments from the workers over a channel and,
/// once per interval, logs the interval's rate and resets its counter.
pub struct StatsReporter {
    /// Interval at which rates are emitted
    report_interval: Duration,
    /// Optional observer receiving every emitted sample
    sink: Option<Sender<HashRate>>,
}

/// Running aggregator
pub struct ReporterHandle {
    hashes: Sender<u64>,
    stop: Sender<()>,
    thread: JoinHandle<MiningStats>,
}

impl StatsReporter {
    /// Creates a reporter emitting one sample per `report_interval`
    ///
    /// # Arguments
    /// * `report_interval` - Length of each sampling interval
    pub fn new(report_interval: Duration) -> Self {
        StatsReporter {
            report_interval,
            sink: None,
        }
    }

    /// Forwards every emitted sample to `sink` in addition to the log
    pub fn with_sink(mut self, sink: Sender<HashRate>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Spawns the aggregator thread
    pub fn start(self) -> ReporterHandle {
        let (hash_tx, hash_rx) = crossbeam_channel::unbounded();
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(0);

        let thread = std::thread::spawn(move || self.run(hash_rx, stop_rx));

        ReporterHandle {
            hashes: hash_tx,
            stop: stop_tx,
            thread,
        }
    }

    fn run(self, hashes: Receiver<u64>, stop: Receiver<()>) -> MiningStats {
        let started = Instant::now();
        let ticker = crossbeam_channel::tick(self.report_interval);
        let mut counter = HashCounter::default();
        let mut samples = 0u64;

        loop {
            select! {
                recv(hashes) -> msg => match msg {
                    Ok(n) => counter.record(n),
                    Err(_) => break,
                },
                recv(ticker) -> _ => {
                    let rate = counter.flush(self.report_interval);
                    samples += 1;
                    log::info!("Total hashes per second: {}", rate);
                    if let Some(sink) = &self.sink {
                        let _ = sink.send(rate);
                    }
                },
                recv(stop) -> _ => break,
            }
        }

        // Pick up increments that raced with the stop request
        for n in hashes.try_iter() {
            counter.record(n);
        }

        MiningStats {
            hashes_total: counter.total,
            samples,
            elapsed: started.elapsed(),
        }
    }
}

impl ReporterHandle {
    /// Sender for hash-count increments
    pub fn hash_sender(&self) -> Sender<u64> {
        self.hashes.clone()
    }

    /// Stops the aggregator and returns lifetime totals
    ///
    /// # Returns
    /// Total hashes, emitted samples and elapsed time, including increments
    /// still queued when the stop arrived
    pub fn stop(self) -> MiningStats {
        drop(self.stop);
        drop(self.hashes);
        self.thread.join().unwrap_or_else(|_| {
            log::error!("Stats reporter thread panicked");
            MiningStats::default()
        })
    }
}
