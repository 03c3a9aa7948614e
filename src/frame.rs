//! Wire protocol for the AES accelerator.
//!
//! Request  (34 bytes): `[key:16][plaintext:16][0xFF][0xFF]`
//! Response (20 bytes): `[ciphertext:16][cycle_count:4, little-endian]`
//!
//! There is no start-of-frame byte, no length field and no checksum;
//! alignment relies entirely on fixed-size reads.

use thiserror::Error;

pub const KEY_SIZE: usize = 16;
pub const BLOCK_SIZE: usize = 16;
pub const FRAME_MARKER: [u8; 2] = [0xFF, 0xFF];
pub const TX_FRAME_SIZE: usize = KEY_SIZE + BLOCK_SIZE + FRAME_MARKER.len(); // 34
pub const RX_FRAME_SIZE: usize = BLOCK_SIZE + 4; // 20

#[derive(Debug, Error)]
pub enum LinkError {
    // ---- caller errors ----
    #[error("{what} must be exactly {want} bytes, got {got}")]
    InvalidLength {
        what: &'static str,
        want: usize,
        got: usize,
    },

    // ---- transport ----
    #[error("cannot open {port}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("no response within the timeout window")]
    Timeout,
    #[error("short response: {got} of {want} bytes before timeout")]
    ShortRead { got: usize, want: usize },
    #[error("device disconnected")]
    Disconnected,
    #[error("serial: {0}")]
    Serial(#[from] serialport::Error),
    #[error("serial I/O: {0}")]
    Io(#[from] std::io::Error),

    // ---- correctness ----
    #[error("ciphertext mismatch: got {}, want {}", hex::encode(.got), hex::encode(.want))]
    Mismatch {
        got: [u8; BLOCK_SIZE],
        want: [u8; BLOCK_SIZE],
    },
}

/// One decoded response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub ciphertext: [u8; BLOCK_SIZE],
    /// Encryption duration in accelerator clock cycles, not wall time.
    pub cycles: u32,
}

pub fn encode_request(key: &[u8], plaintext: &[u8]) -> Result<[u8; TX_FRAME_SIZE], LinkError> {
    if key.len() != KEY_SIZE {
        return Err(LinkError::InvalidLength {
            what: "key",
            want: KEY_SIZE,
            got: key.len(),
        });
    }
    if plaintext.len() != BLOCK_SIZE {
        return Err(LinkError::InvalidLength {
            what: "plaintext",
            want: BLOCK_SIZE,
            got: plaintext.len(),
        });
    }
    let mut out = [0u8; TX_FRAME_SIZE];
    out[..KEY_SIZE].copy_from_slice(key);
    out[KEY_SIZE..KEY_SIZE + BLOCK_SIZE].copy_from_slice(plaintext);
    out[KEY_SIZE + BLOCK_SIZE..].copy_from_slice(&FRAME_MARKER);
    Ok(out)
}

pub fn decode_response(raw: &[u8]) -> Result<Response, LinkError> {
    if raw.len() != RX_FRAME_SIZE {
        return Err(LinkError::InvalidLength {
            what: "response",
            want: RX_FRAME_SIZE,
            got: raw.len(),
        });
    }
    let mut ciphertext = [0u8; BLOCK_SIZE];
    ciphertext.copy_from_slice(&raw[..BLOCK_SIZE]);
    let mut cycles = [0u8; 4];
    cycles.copy_from_slice(&raw[BLOCK_SIZE..]);
    Ok(Response {
        ciphertext,
        cycles: u32::from_le_bytes(cycles),
    })
}
