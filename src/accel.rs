//! Protocol engine: one framed round trip per call against an open port.

use serialport::{ClearBuffer, SerialPort};
use std::io::{Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use crate::frame::{self, LinkError, RX_FRAME_SIZE, Response};
use crate::port::open_port;

// FIPS-197 Appendix B, used for discovery probes and the known-vector check.
pub const NIST_KEY: [u8; 16] = [
    0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf, 0x4f, 0x3c,
];
pub const NIST_PT: [u8; 16] = [
    0x32, 0x43, 0xf6, 0xa8, 0x88, 0x5a, 0x30, 0x8d, 0x31, 0x31, 0x98, 0xa2, 0xe0, 0x37, 0x07, 0x34,
];
pub const NIST_CT: [u8; 16] = [
    0x39, 0x25, 0x84, 0x1d, 0x02, 0xdc, 0x09, 0xfb, 0xdc, 0x11, 0x85, 0x97, 0x19, 0x6a, 0x0b, 0x32,
];

/// Firmware boots and prints a banner; give it time before the first frame.
const SETTLE: Duration = Duration::from_millis(300);

/// An open connection to the accelerator. Dropping it closes the port.
pub struct Accelerator {
    port: Box<dyn SerialPort>,
    name: String,
    timeout: Duration,
}

impl Accelerator {
    pub fn new(port: Box<dyn SerialPort>, name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            port,
            name: name.into(),
            timeout,
        }
    }

    /// Open `path` and get the device ready: settle, then drop boot-time noise.
    pub fn open(path: &str, baud: u32, timeout: Duration) -> Result<Self, LinkError> {
        let port = open_port(path, baud, timeout)?;
        let accel = Self::new(port, path, timeout);
        thread::sleep(SETTLE);
        accel.port.clear(ClearBuffer::Input)?;
        Ok(accel)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// One framed exchange: write the 34-byte request, read the 20-byte
    /// response or fail by the timeout. Exactly one write and one bounded
    /// read; never retries.
    pub fn round_trip(&mut self, key: &[u8], plaintext: &[u8]) -> Result<Response, LinkError> {
        let tx = frame::encode_request(key, plaintext)?;

        // Stale bytes from an abandoned exchange would misalign this response.
        self.port.clear(ClearBuffer::Input)?;
        self.port.write_all(&tx)?;
        self.port.flush()?;

        let mut rx = [0u8; RX_FRAME_SIZE];
        self.read_exact_deadline(&mut rx)?;
        frame::decode_response(&rx)
    }

    /// Read until `buf` is full or the timeout window closes, shrinking the
    /// per-read timeout to whatever remains of the window.
    fn read_exact_deadline(&mut self, buf: &mut [u8]) -> Result<(), LinkError> {
        let deadline = Instant::now() + self.timeout;
        let mut filled = 0;
        while filled < buf.len() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(if filled == 0 {
                    LinkError::Timeout
                } else {
                    LinkError::ShortRead {
                        got: filled,
                        want: buf.len(),
                    }
                });
            }
            self.port.set_timeout(remaining)?;
            match self.port.read(&mut buf[filled..]) {
                Ok(0) => return Err(LinkError::Disconnected),
                Ok(n) => filled += n,
                Err(e)
                    if e.kind() == std::io::ErrorKind::TimedOut
                        || e.kind() == std::io::ErrorKind::WouldBlock =>
                {
                    continue;
                }
                Err(e) => return Err(LinkError::Io(e)),
            }
        }
        Ok(())
    }

    /// Probe with the FIPS-197 vector. `Ok(cycles)` iff the ciphertext is
    /// byte-exact.
    pub fn verify_known_vector(&mut self) -> Result<u32, LinkError> {
        let resp = self.round_trip(&NIST_KEY, &NIST_PT)?;
        if resp.ciphertext != NIST_CT {
            return Err(LinkError::Mismatch {
                got: resp.ciphertext,
                want: NIST_CT,
            });
        }
        Ok(resp.cycles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Firmware, SimEndpoint};

    const FAST: Duration = Duration::from_millis(40);

    fn sim_accel(firmware: Firmware, timeout: Duration) -> Accelerator {
        let ep = SimEndpoint::new("sim", firmware);
        Accelerator::new(Box::new(ep.open(timeout)), "sim", timeout)
    }

    #[test]
    fn known_vector_round_trip() {
        let ep = SimEndpoint::new("sim", Firmware::Correct).with_cycles(1234);
        let mut accel = Accelerator::new(Box::new(ep.open(FAST)), "sim", FAST);

        let resp = accel.round_trip(&NIST_KEY, &NIST_PT).unwrap();
        assert_eq!(resp.ciphertext, NIST_CT);
        assert_eq!(resp.cycles, 1234);

        assert_eq!(accel.verify_known_vector().unwrap(), 1234);
    }

    #[test]
    fn stale_input_is_drained_before_the_request() {
        let ep = SimEndpoint::new("sim", Firmware::Correct);
        // Boot banner noise left over from reset must not shift the response.
        ep.inject_noise(b"AES-128 Hardware Accelerator Ready\r\n");
        let mut accel = Accelerator::new(Box::new(ep.open(FAST)), "sim", FAST);

        let resp = accel.round_trip(&NIST_KEY, &NIST_PT).unwrap();
        assert_eq!(resp.ciphertext, NIST_CT);
    }

    #[test]
    fn silence_times_out_with_no_partial_decode() {
        let mut accel = sim_accel(Firmware::Silent, Duration::from_millis(30));
        let started = Instant::now();
        let err = accel.round_trip(&NIST_KEY, &NIST_PT).unwrap_err();
        assert!(matches!(err, LinkError::Timeout));
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn partial_response_is_a_short_read() {
        let mut accel = sim_accel(Firmware::Truncated(7), Duration::from_millis(30));
        assert!(matches!(
            accel.round_trip(&NIST_KEY, &NIST_PT),
            Err(LinkError::ShortRead { got: 7, want: 20 })
        ));
    }

    #[test]
    fn wrong_ciphertext_is_a_mismatch() {
        let mut accel = sim_accel(Firmware::Garbage, FAST);
        match accel.verify_known_vector() {
            Err(LinkError::Mismatch { got, want }) => {
                assert_eq!(want, NIST_CT);
                assert_ne!(got, NIST_CT);
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn bad_input_lengths_never_touch_the_wire() {
        let mut accel = sim_accel(Firmware::Correct, FAST);
        assert!(matches!(
            accel.round_trip(&[0u8; 15], &NIST_PT),
            Err(LinkError::InvalidLength { what: "key", .. })
        ));
        assert!(matches!(
            accel.round_trip(&NIST_KEY, &[0u8; 17]),
            Err(LinkError::InvalidLength {
                what: "plaintext",
                ..
            })
        ));
    }
}
