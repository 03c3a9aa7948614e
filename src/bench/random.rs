//! Random-vector correctness: hardware ciphertext vs software AES, fresh
//! key and plaintext every iteration.

use rand::RngCore;
use rand::rngs::OsRng;

use crate::accel::Accelerator;
use crate::frame::{BLOCK_SIZE, KEY_SIZE};
use crate::softaes;
use crate::stats::CycleStats;

#[derive(Debug, Clone)]
pub struct RandomReport {
    pub passed: u32,
    pub failed: u32,
    pub total: u32,
    /// Cycle counts from passing iterations only.
    pub cycles: Option<CycleStats>,
}

impl RandomReport {
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.passed) / f64::from(self.total) * 100.0
    }

    pub fn print(&self) {
        println!("\nRandom Test Results:");
        println!("{}", "-".repeat(40));
        println!("  passed: {}", self.passed);
        println!("  failed: {}", self.failed);
        println!("  total: {}", self.total);
        println!("  pass_rate: {:.3}", self.pass_rate());
        if let Some(c) = &self.cycles {
            println!("  min_cycles: {}", c.min);
            println!("  max_cycles: {}", c.max);
            println!("  avg_cycles: {:.3}", c.mean);
        }
    }
}

pub fn run(accel: &mut Accelerator, iterations: u32, debug: bool) -> RandomReport {
    let mut passed = 0u32;
    let mut failed = 0u32;
    let mut cycles = Vec::with_capacity(iterations as usize);

    for i in 1..=iterations {
        let mut key = [0u8; KEY_SIZE];
        let mut pt = [0u8; BLOCK_SIZE];
        OsRng.fill_bytes(&mut key);
        OsRng.fill_bytes(&mut pt);

        let resp = match accel.round_trip(&key, &pt) {
            Ok(r) => r,
            Err(e) => {
                failed += 1;
                if debug {
                    eprintln!("[random] test {i}: no response ({e})");
                }
                continue;
            }
        };

        let sw = softaes::encrypt_block(&key, &pt);
        if resp.ciphertext == sw {
            passed += 1;
            cycles.push(resp.cycles);
            if i % 10 == 0 {
                println!("Test {i}: PASS ({} cycles)", resp.cycles);
            }
        } else {
            failed += 1;
            println!("Test {i}: FAIL");
            println!("  Key: {}", hex::encode(key));
            println!("  PT:  {}", hex::encode(pt));
            println!("  HW:  {}", hex::encode(resp.ciphertext));
            println!("  SW:  {}", hex::encode(sw));
        }
    }

    RandomReport {
        passed,
        failed,
        total: iterations,
        cycles: CycleStats::from_samples(&cycles),
    }
}
