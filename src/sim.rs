//! In-memory serial endpoint emulating the accelerator firmware: consumes
//! 34-byte request frames and answers with the reference ciphertext plus a
//! configurable cycle count. Test-only.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::frame::{BLOCK_SIZE, FRAME_MARKER, KEY_SIZE, RX_FRAME_SIZE, TX_FRAME_SIZE};
use crate::softaes;

/// How the simulated firmware answers request frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Firmware {
    /// Reference ciphertext plus cycle count, like the real device.
    Correct,
    /// Well-formed response carrying a corrupted ciphertext.
    Garbage,
    /// Consumes requests, never answers.
    Silent,
    /// Answers with only the first `n` bytes of the response.
    Truncated(usize),
    /// Correct except for the nth frame (1-based), which gets no answer.
    SilentNth(usize),
}

struct State {
    /// Bytes waiting for the host to read.
    rx: VecDeque<u8>,
    /// Request bytes received so far.
    pending: Vec<u8>,
    frames_seen: usize,
    cycles: u32,
    firmware: Firmware,
}

impl State {
    /// Process complete frames, firmware-style: full buffer, marker check,
    /// respond, drain.
    fn pump(&mut self) {
        while self.pending.len() >= TX_FRAME_SIZE {
            if self.pending[KEY_SIZE + BLOCK_SIZE..TX_FRAME_SIZE] == FRAME_MARKER {
                self.respond();
                self.pending.drain(..TX_FRAME_SIZE);
            } else {
                // hosts under test only write aligned frames
                self.pending.clear();
            }
        }
    }

    fn respond(&mut self) {
        self.frames_seen += 1;
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&self.pending[..KEY_SIZE]);
        let mut pt = [0u8; BLOCK_SIZE];
        pt.copy_from_slice(&self.pending[KEY_SIZE..KEY_SIZE + BLOCK_SIZE]);

        let mut ct = softaes::encrypt_block(&key, &pt);
        match self.firmware {
            Firmware::Silent => return,
            Firmware::SilentNth(n) if self.frames_seen == n => return,
            Firmware::Garbage => {
                for b in ct.iter_mut() {
                    *b ^= 0x5A;
                }
            }
            _ => {}
        }

        let mut out = Vec::with_capacity(RX_FRAME_SIZE);
        out.extend_from_slice(&ct);
        out.extend_from_slice(&self.cycles.to_le_bytes());
        if let Firmware::Truncated(n) = self.firmware {
            out.truncate(n);
        }
        self.rx.extend(out);
    }
}

/// One simulated device; `open` hands out [`SimPort`] handles onto it.
pub struct SimEndpoint {
    state: Arc<Mutex<State>>,
    opened: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
    name: String,
}

impl SimEndpoint {
    pub fn new(name: &str, firmware: Firmware) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                rx: VecDeque::new(),
                pending: Vec::new(),
                frames_seen: 0,
                cycles: 40,
                firmware,
            })),
            opened: Arc::new(AtomicBool::new(false)),
            closed: Arc::new(AtomicBool::new(false)),
            name: name.to_string(),
        }
    }

    pub fn with_cycles(self, cycles: u32) -> Self {
        self.state.lock().unwrap().cycles = cycles;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pre-load the host-facing buffer, like a boot banner sitting unread.
    pub fn inject_noise(&self, bytes: &[u8]) {
        self.state.lock().unwrap().rx.extend(bytes);
    }

    pub fn open(&self, timeout: Duration) -> SimPort {
        self.opened.store(true, Ordering::SeqCst);
        SimPort {
            state: Arc::clone(&self.state),
            closed: Arc::clone(&self.closed),
            name: self.name.clone(),
            timeout,
        }
    }

    pub fn was_opened(&self) -> bool {
        self.opened.load(Ordering::SeqCst)
    }

    /// True once every handle from `open` has been dropped.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct SimPort {
    state: Arc<Mutex<State>>,
    closed: Arc<AtomicBool>,
    name: String,
    timeout: Duration,
}

impl Drop for SimPort {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl Read for SimPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let deadline = Instant::now() + self.timeout;
        loop {
            {
                let mut st = self.state.lock().unwrap();
                if !st.rx.is_empty() {
                    let n = buf.len().min(st.rx.len());
                    for slot in buf[..n].iter_mut() {
                        *slot = st.rx.pop_front().unwrap();
                    }
                    return Ok(n);
                }
            }
            if Instant::now() >= deadline {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "sim read timeout"));
            }
            thread::sleep(Duration::from_millis(1));
        }
    }
}

impl Write for SimPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut st = self.state.lock().unwrap();
        st.pending.extend_from_slice(buf);
        st.pump();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SerialPort for SimPort {
    fn name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn baud_rate(&self) -> serialport::Result<u32> {
        Ok(115_200)
    }

    fn data_bits(&self) -> serialport::Result<DataBits> {
        Ok(DataBits::Eight)
    }

    fn flow_control(&self) -> serialport::Result<FlowControl> {
        Ok(FlowControl::None)
    }

    fn parity(&self) -> serialport::Result<Parity> {
        Ok(Parity::None)
    }

    fn stop_bits(&self) -> serialport::Result<StopBits> {
        Ok(StopBits::One)
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn set_baud_rate(&mut self, _baud_rate: u32) -> serialport::Result<()> {
        Ok(())
    }

    fn set_data_bits(&mut self, _data_bits: DataBits) -> serialport::Result<()> {
        Ok(())
    }

    fn set_flow_control(&mut self, _flow_control: FlowControl) -> serialport::Result<()> {
        Ok(())
    }

    fn set_parity(&mut self, _parity: Parity) -> serialport::Result<()> {
        Ok(())
    }

    fn set_stop_bits(&mut self, _stop_bits: StopBits) -> serialport::Result<()> {
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Duration) -> serialport::Result<()> {
        self.timeout = timeout;
        Ok(())
    }

    fn write_request_to_send(&mut self, _level: bool) -> serialport::Result<()> {
        Ok(())
    }

    fn write_data_terminal_ready(&mut self, _level: bool) -> serialport::Result<()> {
        Ok(())
    }

    fn read_clear_to_send(&mut self) -> serialport::Result<bool> {
        Ok(false)
    }

    fn read_data_set_ready(&mut self) -> serialport::Result<bool> {
        Ok(false)
    }

    fn read_ring_indicator(&mut self) -> serialport::Result<bool> {
        Ok(false)
    }

    fn read_carrier_detect(&mut self) -> serialport::Result<bool> {
        Ok(false)
    }

    fn bytes_to_read(&self) -> serialport::Result<u32> {
        Ok(self.state.lock().unwrap().rx.len() as u32)
    }

    fn bytes_to_write(&self) -> serialport::Result<u32> {
        Ok(0)
    }

    fn clear(&self, buffer_to_clear: ClearBuffer) -> serialport::Result<()> {
        if matches!(buffer_to_clear, ClearBuffer::Input | ClearBuffer::All) {
            self.state.lock().unwrap().rx.clear();
        }
        Ok(())
    }

    fn try_clone(&self) -> serialport::Result<Box<dyn SerialPort>> {
        Ok(Box::new(SimPort {
            state: Arc::clone(&self.state),
            closed: Arc::clone(&self.closed),
            name: self.name.clone(),
            timeout: self.timeout,
        }))
    }

    fn set_break(&self) -> serialport::Result<()> {
        Ok(())
    }

    fn clear_break(&self) -> serialport::Result<()> {
        Ok(())
    }
}
