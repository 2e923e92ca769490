//! # Specmeter - Terminal Block Analyzer
//!
//! This binary is the reference consumer of the `specmeter-core` DSP
//! toolkit. It plays the role the surrounding applications normally play:
//! it owns the sample source (a WAV file or a synthesized test signal),
//! cuts it into fixed-size blocks, and for each block reads the cheap level
//! statistics first and the magnitude spectrum second.
//!
//! ## Architecture
//! - **Signal source**: `hound` WAV decode or the `signal` module
//! - **Per block**: bias/range and power via `level`, then the
//!   set-input/transform/read-magnitudes cycle on one reused
//!   `SpectrumTransform`
//! - **Output**: human-readable lines, or JSON records with `--json`

mod signal;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

use signal::Waveform;
use specmeter_core::{BlockAnalysis, SpectrumTransform, level};

#[derive(Parser, Debug)]
#[command(name = "specmeter", about = "Block-oriented audio spectrum and level meter")]
struct Args {
    /// WAV file to analyze (16-bit PCM, first channel). When absent a test
    /// signal is synthesized instead.
    #[arg(long)]
    wav: Option<PathBuf>,

    /// Waveform of the synthesized test signal
    #[arg(long, value_enum, default_value = "sine")]
    wave: Waveform,

    /// Test-signal frequency in Hz
    #[arg(long, default_value_t = 440.0)]
    freq: f32,

    /// Test-signal peak amplitude as a fraction of full scale
    #[arg(long, default_value_t = 0.8)]
    amplitude: f32,

    /// Sample rate of the synthesized signal in Hz
    #[arg(long, default_value_t = 48000)]
    rate: u32,

    /// Transform block size in samples (must be a power of two)
    #[arg(long, default_value_t = 1024)]
    size: usize,

    /// Number of consecutive blocks to analyze
    #[arg(long, default_value_t = 4)]
    blocks: usize,

    /// Emit the analysis records as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let (samples, sample_rate) = match &args.wav {
        Some(path) => read_wav(path)?,
        None => (
            signal::synthesize(
                args.wave,
                args.size * args.blocks,
                args.rate,
                args.freq,
                args.amplitude,
            ),
            args.rate,
        ),
    };

    if samples.len() < args.size {
        return Err(anyhow!(
            "need at least {} samples for one block, got {}",
            args.size,
            samples.len()
        ));
    }

    info!(
        "analyzing {} samples at {} Hz in {}-sample blocks",
        samples.len(),
        sample_rate,
        args.size
    );

    let mut transform = SpectrumTransform::new(args.size)?;
    let mut spectrum = vec![0.0f32; transform.output_len()];
    let mut records = Vec::new();

    let mut analyzed = 0;
    for (index, block) in samples
        .chunks_exact(args.size)
        .take(args.blocks)
        .enumerate()
    {
        // Cheap O(N) statistics first, spectrum second; the two share no
        // state, this is just the natural reading order for a meter.
        let (bias, range) = level::bias_and_range_i16(block)?;
        let power_db = level::power_db_i16(block)?;

        transform.set_input_i16(block)?;
        transform.transform();
        transform.write_magnitudes(&mut spectrum)?;

        let analysis = BlockAnalysis {
            power_db,
            bias,
            range,
            spectrum: spectrum.clone(),
        };

        if args.json {
            records.push(analysis);
        } else {
            print_block(index, sample_rate, args.size, &analysis);
        }
        analyzed += 1;
    }

    if analyzed < args.blocks {
        warn!(
            "input ran out after {analyzed} of {} requested blocks",
            args.blocks
        );
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    }

    Ok(())
}

/// Prints one block's readings with the spectral peak called out.
fn print_block(index: usize, sample_rate: u32, size: usize, analysis: &BlockAnalysis) {
    let (peak_bin, peak_value) = analysis
        .spectrum
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(bin, &value)| (bin, value))
        .unwrap_or((0, 0.0));
    let peak_freq = peak_bin as f32 * sample_rate as f32 / size as f32;

    println!(
        "block {index}: level {:+.4}  bias {:+8.1}  range {:8.1}  peak bin {peak_bin} ({peak_freq:.1} Hz, magnitude {peak_value:.4})",
        analysis.power_db, analysis.bias, analysis.range
    );
}

/// Reads the first channel of a 16-bit PCM WAV file.
fn read_wav(path: &PathBuf) -> Result<(Vec<i16>, u32)> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let spec = reader.spec();

    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(anyhow!(
            "only 16-bit integer PCM is supported, {} is {}-bit {:?}",
            path.display(),
            spec.bits_per_sample,
            spec.sample_format
        ));
    }

    let channels = spec.channels as usize;
    let samples = reader
        .samples::<i16>()
        .step_by(channels)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    info!(
        "read {} samples at {} Hz from {}",
        samples.len(),
        spec.sample_rate,
        path.display()
    );

    Ok((samples, spec.sample_rate))
}
