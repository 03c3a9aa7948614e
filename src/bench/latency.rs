//! Round-trip latency percentiles: wall time per exchange, UART framing
//! included, bracketed as tightly as [`Instant`] allows.

use rand::RngCore;
use rand::rngs::OsRng;
use std::time::Instant;

use crate::accel::Accelerator;
use crate::frame::{BLOCK_SIZE, KEY_SIZE};
use crate::stats::{self, CycleStats};

#[derive(Debug, Clone)]
pub struct LatencyReport {
    pub samples: usize,
    pub failures: usize,
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
    pub median_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    /// Summary over the whole run; not paired with the latency percentiles.
    pub cycles: CycleStats,
}

impl LatencyReport {
    pub fn print(&self, clock_mhz: f64) {
        println!("\nLatency Results:");
        println!("{}", "-".repeat(40));
        println!("  samples: {}", self.samples);
        if self.failures > 0 {
            println!("  failures: {}", self.failures);
        }
        println!("  min_latency_ms: {:.3}", self.min_ms);
        println!("  max_latency_ms: {:.3}", self.max_ms);
        println!("  avg_latency_ms: {:.3}", self.mean_ms);
        println!("  median_latency_ms: {:.3}", self.median_ms);
        println!("  p95_latency_ms: {:.3}", self.p95_ms);
        println!("  p99_latency_ms: {:.3}", self.p99_ms);
        println!("  min_hw_cycles: {}", self.cycles.min);
        println!("  max_hw_cycles: {}", self.cycles.max);
        println!("  avg_hw_cycles: {:.3}", self.cycles.mean);

        // Mean wall time split into core time and everything else.
        let hw_ms = self.cycles.mean / (clock_mhz * 1e3);
        let overhead_ms = self.mean_ms - hw_ms;
        println!("\nOverhead analysis:");
        println!("  HW execution time: {hw_ms:.6} ms");
        println!("  UART overhead: {overhead_ms:.3} ms");
        println!(
            "  Overhead %: {:.1}%",
            overhead_ms / self.mean_ms.max(1e-3) * 100.0
        );
    }
}

/// `None` when not a single exchange succeeded.
pub fn run(accel: &mut Accelerator, samples: usize) -> Option<LatencyReport> {
    let mut key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);

    let mut latencies = Vec::with_capacity(samples);
    let mut cycles = Vec::with_capacity(samples);
    let mut failures = 0usize;

    for _ in 0..samples {
        let mut pt = [0u8; BLOCK_SIZE];
        OsRng.fill_bytes(&mut pt);

        let start = Instant::now();
        let resp = accel.round_trip(&key, &pt);
        let elapsed = start.elapsed();

        match resp {
            Ok(r) => {
                latencies.push(elapsed.as_secs_f64() * 1e3);
                cycles.push(r.cycles);
            }
            Err(_) => failures += 1,
        }
    }

    if latencies.is_empty() {
        return None;
    }
    latencies.sort_by(f64::total_cmp);

    Some(LatencyReport {
        samples: latencies.len(),
        failures,
        min_ms: latencies[0],
        max_ms: latencies[latencies.len() - 1],
        mean_ms: stats::mean(&latencies),
        median_ms: stats::median(&latencies),
        p95_ms: stats::percentile(&latencies, 0.95),
        p99_ms: stats::percentile(&latencies, 0.99),
        cycles: CycleStats::from_samples(&cycles)?,
    })
}
