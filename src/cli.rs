use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "aes-bench", about = "AES-128 hardware accelerator benchmark (UART)")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Cmd {
    /// Run the benchmark suite (correctness, throughput, latency)
    Run(RunOpts),
    /// Encrypt a whole file block by block and compare against software AES
    Bulk(BulkOpts),
    /// List serial ports visible on this machine
    Ports,
}

#[derive(Args, Debug, Clone)]
pub struct ConnOpts {
    /// Serial device path; omit to probe every port for the accelerator
    #[arg(long)]
    pub port: Option<String>,
    /// Baud rate
    #[arg(long, default_value_t = 115_200)]
    pub baud: u32,
    /// Per-exchange response timeout in milliseconds
    #[arg(long, default_value_t = 2_000)]
    pub timeout_ms: u64,
}

impl ConnOpts {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Args, Debug, Clone)]
pub struct RunOpts {
    #[command(flatten)]
    pub conn: ConnOpts,
    /// Number of random-vector correctness checks
    #[arg(long, default_value_t = 100)]
    pub random_tests: u32,
    /// Seconds to hammer the device for the throughput figure
    #[arg(long, default_value_t = 5.0)]
    pub throughput_secs: f64,
    /// Number of round trips for the latency percentiles
    #[arg(long, default_value_t = 1000)]
    pub latency_samples: usize,
    /// Accelerator clock in MHz, for cycles-to-time conversion
    #[arg(long, default_value_t = 125.0)]
    pub clock_mhz: f64,
    /// Skip the known-vector check
    #[arg(long, default_value_t = false)]
    pub skip_nist: bool,
    /// Skip the random-vector checks
    #[arg(long, default_value_t = false)]
    pub skip_random: bool,
    /// Skip the throughput run
    #[arg(long, default_value_t = false)]
    pub skip_throughput: bool,
    /// Skip the latency run
    #[arg(long, default_value_t = false)]
    pub skip_latency: bool,
    /// Print each random-vector failure
    #[arg(long, default_value_t = true)]
    pub debug: bool,
}

#[derive(Args, Debug, Clone)]
pub struct BulkOpts {
    #[command(flatten)]
    pub conn: ConnOpts,
    /// File to encrypt (any bytes; zero-padded to a block multiple)
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Image to encrypt; writes *_hw_encrypted / *_sw_encrypted / *_decrypted PNGs
    #[cfg(feature = "image")]
    #[arg(long)]
    pub image: Option<PathBuf>,
    /// Accelerator clock in MHz, for cycles-to-time conversion
    #[arg(long, default_value_t = 125.0)]
    pub clock_mhz: f64,
}
