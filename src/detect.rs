//! Probe-and-validate discovery: find which serial endpoint hosts the
//! accelerator by pushing the FIPS-197 vector through each candidate.

use anyhow::{Context, Result, anyhow};
use std::time::Duration;

use crate::accel::Accelerator;
use crate::frame::LinkError;
use crate::port;

struct Candidate {
    path: String,
    desc: String,
}

/// Scan every serial port on the system; first byte-exact probe match wins
/// and its connection comes back open and ready for reuse.
pub fn auto_detect(baud: u32, timeout: Duration) -> Result<Accelerator> {
    let ports = serialport::available_ports().context("enumerating serial ports")?;
    if ports.is_empty() {
        return Err(anyhow!("no serial ports found"));
    }
    eprintln!(
        "scanning {} serial port(s) for the AES accelerator...",
        ports.len()
    );
    let candidates: Vec<Candidate> = ports
        .iter()
        .map(|p| Candidate {
            path: p.port_name.clone(),
            desc: port::describe(&p.port_type),
        })
        .collect();

    scan(&candidates, |path| Accelerator::open(path, baud, timeout))
        .ok_or_else(|| anyhow!("no AES accelerator found on any port"))
}

/// Linear probe over `candidates` in the order given. A candidate that fails
/// to open is skipped with no penalty; a candidate that opens but does not
/// return the known ciphertext is closed before the next one is tried.
fn scan<F>(candidates: &[Candidate], mut open: F) -> Option<Accelerator>
where
    F: FnMut(&str) -> Result<Accelerator, LinkError>,
{
    for cand in candidates {
        eprint!("  trying {:<20} ({})... ", cand.path, cand.desc);
        let mut accel = match open(&cand.path) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("FAILED ({e})");
                continue;
            }
        };
        match accel.verify_known_vector() {
            Ok(cycles) => {
                eprintln!("FOUND ({cycles} cycles)");
                return Some(accel);
            }
            Err(e) => {
                // drops `accel`, closing the port
                eprintln!("no accelerator ({e})");
            }
        }
    }
    None
}
