//! Wavegrid - plays a WAV file through the audio-reactive wave grid
//!
//! Runs the visualizer headless at a fixed frame step, logging the band
//! analysis once per second of audio and optionally capturing every frame's
//! main-grid heights to a raw file.

use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wavegrid::audio::{AudioSession, FrequencySource};
use wavegrid::cli::Args;
use wavegrid::visualizer::Visualizer;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    info!("Wavegrid - audio-reactive wave grid");
    let preset = args.load_preset().context("failed to load preset")?;
    let playback = args.playback_config();

    let mut session = AudioSession::open(&args.input, preset.analyser.clone())
        .with_context(|| format!("failed to open {}", args.input.display()))?;

    let mut capture = match args.capture_config() {
        Some(config) => {
            let file = File::create(&config.output_path).with_context(|| {
                format!("failed to create {}", config.output_path.display())
            })?;
            info!("Capture: {}", config.output_path.display());
            Some(BufWriter::new(file))
        }
        None => None,
    };

    let mut visualizer = Visualizer::from_preset(&preset, !args.no_mirror);
    info!(
        "Grid: {} vertices{}",
        visualizer.main().grid().vertex_count(),
        if args.no_mirror { "" } else { " (+ mirror)" }
    );

    let delta = playback.frame_delta();
    let total_frames = playback.total_frames(session.duration());
    let frames_per_report = playback.fps.max(1) as usize;

    session.play();
    visualizer.start();

    for frame in 0..total_frames {
        visualizer.tick(delta, &mut session);

        if let Some(writer) = capture.as_mut() {
            write_heights(writer, visualizer.main().heights())
                .context("failed to write capture frame")?;
        }

        session.advance(delta);

        if (frame + 1) % frames_per_report == 0 {
            report(&visualizer, (frame + 1) as f32 * delta);
        }
        if !session.is_playing() {
            break;
        }
    }

    visualizer.stop();
    session.stop();

    if let Some(mut writer) = capture.take() {
        writer.flush().context("failed to flush capture")?;
    }

    if visualizer.beats() == 0 {
        warn!("No beats detected");
    }
    info!(
        "Done: {} frames, {} beats",
        visualizer.frames(),
        visualizer.beats()
    );
    Ok(())
}

/// One-line status for the current frame
fn report(visualizer: &Visualizer, seconds: f32) {
    let analysis = visualizer.analysis();
    let beat = visualizer.beat();
    info!(
        "t={:5.1}s  bass={:.2} mid={:.2} treble={:.2} peak={:.2}  beat={:.2}{}",
        seconds,
        analysis.bass_intensity,
        analysis.mid_intensity,
        analysis.treble_intensity,
        analysis.peak_amplitude,
        beat.strength,
        if visualizer.main().is_active() { "" } else { "  (idle)" }
    );
}

/// Append one frame of heights as little-endian f32
fn write_heights(writer: &mut impl Write, heights: &[f32]) -> std::io::Result<()> {
    if cfg!(target_endian = "little") {
        writer.write_all(bytemuck::cast_slice(heights))
    } else {
        for h in heights {
            writer.write_all(&h.to_le_bytes())?;
        }
        Ok(())
    }
}
