//! Sustained throughput: hammer the device with back-to-back exchanges for
//! a fixed wall-clock window and count what comes back.

use rand::RngCore;
use rand::rngs::OsRng;
use std::time::{Duration, Instant};

use crate::accel::Accelerator;
use crate::frame::{BLOCK_SIZE, KEY_SIZE};

#[derive(Debug, Clone)]
pub struct ThroughputReport {
    pub blocks: u64,
    pub failures: u64,
    pub elapsed: Duration,
    pub total_cycles: u64,
}

impl ThroughputReport {
    pub fn blocks_per_sec(&self) -> f64 {
        self.blocks as f64 / self.elapsed.as_secs_f64().max(1e-3)
    }

    pub fn bytes_per_sec(&self) -> f64 {
        self.blocks_per_sec() * BLOCK_SIZE as f64
    }

    pub fn kbits_per_sec(&self) -> f64 {
        self.bytes_per_sec() * 8.0 / 1000.0
    }

    pub fn mean_cycles(&self) -> f64 {
        if self.blocks == 0 {
            return 0.0;
        }
        self.total_cycles as f64 / self.blocks as f64
    }

    pub fn print(&self, clock_mhz: f64) {
        println!("\nThroughput Results:");
        println!("{}", "-".repeat(40));
        println!("  blocks: {}", self.blocks);
        if self.failures > 0 {
            println!("  failures: {}", self.failures);
        }
        println!("  elapsed_sec: {:.3}", self.elapsed.as_secs_f64());
        println!("  blocks_per_sec: {:.3}", self.blocks_per_sec());
        println!("  bytes_per_sec: {:.3}", self.bytes_per_sec());
        println!("  kbps: {:.3}", self.kbits_per_sec());
        println!("  avg_cycles: {:.3}", self.mean_cycles());

        // What the core could do if the UART were free.
        if self.mean_cycles() > 0.0 {
            let us_per_block = self.mean_cycles() / clock_mhz;
            println!("\nHardware timing (at {clock_mhz} MHz):");
            println!("  Time per block: {us_per_block:.3} us");
            println!(
                "  Theoretical throughput: {:.3} MB/s",
                BLOCK_SIZE as f64 / (us_per_block / 1e6) / 1e6
            );
        }
    }
}

/// One fixed random key, a fresh random plaintext per exchange, as many
/// exchanges as fit in `window`.
pub fn run(accel: &mut Accelerator, window: Duration) -> ThroughputReport {
    let mut key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);

    let mut blocks = 0u64;
    let mut failures = 0u64;
    let mut total_cycles = 0u64;

    let start = Instant::now();
    while start.elapsed() < window {
        let mut pt = [0u8; BLOCK_SIZE];
        OsRng.fill_bytes(&mut pt);
        match accel.round_trip(&key, &pt) {
            Ok(resp) => {
                blocks += 1;
                total_cycles += u64::from(resp.cycles);
            }
            Err(_) => failures += 1,
        }
    }

    ThroughputReport {
        blocks,
        failures,
        elapsed: start.elapsed(),
        total_cycles,
    }
}
