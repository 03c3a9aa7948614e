//! Benchmark suite: correctness, throughput, latency and bulk encryption,
//! each section reporting in the same shape so runs diff cleanly.

use anyhow::{Context, Result, bail};
use rand::RngCore;
use rand::rngs::OsRng;
use std::fs;
use std::time::Duration;

use crate::accel::{self, Accelerator};
use crate::cli::{BulkOpts, ConnOpts, RunOpts};
use crate::detect;
use crate::frame::{KEY_SIZE, LinkError};
use crate::port;

pub mod bulk;
pub mod latency;
pub mod random;
pub mod throughput;

pub fn run(opts: RunOpts) -> Result<()> {
    heading("AES-128 Accelerator Benchmark");
    println!("OS:    {}", std::env::consts::OS);
    println!("Clock: {} MHz", opts.clock_mhz);

    let mut accel = connect(&opts.conn)?;
    let mut all_passed = true;

    if !opts.skip_nist {
        heading("NIST FIPS-197 Test Vector");
        if !nist_check(&mut accel) {
            all_passed = false;
        }
    }

    if !opts.skip_random {
        heading(&format!(
            "Random Test Vectors ({} iterations)",
            opts.random_tests
        ));
        let report = random::run(&mut accel, opts.random_tests, opts.debug);
        report.print();
        if report.failed > 0 {
            all_passed = false;
        }
    }

    // Throughput and latency inform; only correctness gates the verdict.
    if !opts.skip_throughput {
        heading(&format!(
            "Throughput Test ({}s duration)",
            opts.throughput_secs
        ));
        let window = Duration::from_millis((opts.throughput_secs.max(0.0) * 1e3) as u64);
        throughput::run(&mut accel, window).print(opts.clock_mhz);
    }

    if !opts.skip_latency {
        heading(&format!("Latency Test ({} samples)", opts.latency_samples));
        match latency::run(&mut accel, opts.latency_samples) {
            Some(report) => report.print(opts.clock_mhz),
            None => eprintln!("[latency] no successful measurements"),
        }
    }

    drop(accel);
    verdict(all_passed)
}

pub fn run_bulk(opts: BulkOpts) -> Result<()> {
    #[cfg(feature = "image")]
    {
        if let Some(path) = &opts.image {
            if opts.file.is_some() {
                bail!("--file and --image are mutually exclusive");
            }
            return run_bulk_image(&opts, path);
        }
    }

    let Some(path) = &opts.file else {
        bail!("nothing to encrypt: pass --file <PATH>");
    };
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;

    let mut accel = connect(&opts.conn)?;

    heading("Bulk Encryption Test (AES-128 ECB)");
    println!("Input: {} ({} bytes)", path.display(), data.len());

    let mut key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);
    println!("\nEncryption key: {}", hex::encode(key));

    let outcome = bulk::run(&mut accel, &key, &data, opts.clock_mhz, true);

    drop(accel);
    verdict(outcome.pass)
}

#[cfg(feature = "image")]
fn run_bulk_image(opts: &BulkOpts, path: &std::path::Path) -> Result<()> {
    use crate::img;

    let mut accel = connect(&opts.conn)?;

    heading("Image Encryption Test (AES-128 ECB)");
    // ECB on purpose: identical blocks stay identical, so the pattern of the
    // original image survives into the ciphertext picture.
    println!("Loading image: {}", path.display());
    let (pixels, width, height) = img::load_rgb(path)?;
    println!("  Size: {width} x {height} pixels");
    println!("  Data size: {} bytes", pixels.len());

    let mut key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);
    println!("\nEncryption key: {}", hex::encode(key));

    let outcome = bulk::run(&mut accel, &key, &pixels, opts.clock_mhz, true);

    println!("\nSaving encrypted images...");
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));

    let save = |suffix: &str, data: &[u8]| -> Result<()> {
        let out = dir.join(format!("{stem}_{suffix}.png"));
        img::save_rgb(&out, &data[..pixels.len()], width, height)?;
        println!("  Saved: {}", out.display());
        Ok(())
    };
    save("hw_encrypted", &outcome.hw_ciphertext)?;
    save("sw_encrypted", &outcome.sw_ciphertext)?;
    if outcome.recovered {
        save("decrypted", &outcome.decrypted)?;
    }

    drop(accel);
    verdict(outcome.pass)
}

/// Open the named port, or probe every port when none was given.
fn connect(conn: &ConnOpts) -> Result<Accelerator> {
    let accel = match &conn.port {
        Some(path) => {
            eprintln!("Port:  {path}");
            match Accelerator::open(path, conn.baud, conn.timeout()) {
                Ok(a) => a,
                Err(e) => {
                    let _ = port::print_ports();
                    return Err(e).with_context(|| format!("connecting to {path}"));
                }
            }
        }
        None => detect::auto_detect(conn.baud, conn.timeout())?,
    };
    eprintln!("Connected to: {}", accel.name());
    Ok(accel)
}

/// Known-answer check against FIPS-197 Appendix B.
fn nist_check(accel: &mut Accelerator) -> bool {
    println!("Key:       {}", hex::encode(accel::NIST_KEY));
    println!("Plaintext: {}", hex::encode(accel::NIST_PT));
    println!("Expected:  {}", hex::encode(accel::NIST_CT));

    match accel.verify_known_vector() {
        Ok(cycles) => {
            println!("Got:       {}", hex::encode(accel::NIST_CT));
            println!("Cycles:    {cycles}");
            println!("RESULT: PASS");
            true
        }
        Err(LinkError::Mismatch { got, .. }) => {
            println!("Got:       {}", hex::encode(got));
            println!("RESULT: FAIL");
            false
        }
        Err(e) => {
            eprintln!("[nist] {e}");
            println!("RESULT: FAIL");
            false
        }
    }
}

fn heading(title: &str) {
    let rule = "=".repeat(60);
    println!("\n{rule}");
    println!("{title}");
    println!("{rule}");
}

/// Print the final banner; a failed suite exits nonzero.
fn verdict(all_passed: bool) -> Result<()> {
    heading(if all_passed {
        "ALL TESTS PASSED"
    } else {
        "SOME TESTS FAILED"
    });
    if !all_passed {
        std::process::exit(1);
    }
    Ok(())
}
