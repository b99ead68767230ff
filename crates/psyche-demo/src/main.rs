//! Psyche demo: headless psychedelic video effects.
//!
//! Reads frames from a camera or video file (with the `video` feature), an
//! image directory or a synthetic pattern. Runs them through the effects
//! pipeline at a fixed cadence and writes the results as PNG files.
//! Parameters can be changed live on stdin.

mod config;
mod control;

use std::process::ExitCode;
use std::sync::Arc;

use psyche_core::{FrameProcessor, ParameterSet};
use psyche_engine::{
    DisplaySink, FrameReader, ImageSequenceReader, NullSink, PatternReader, PngSequenceSink,
    RunLoop, VideoSource,
};
use tracing_subscriber::EnvFilter;

use config::{AppConfig, PATTERN_SIZE};
use control::Controls;

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env("PSYCHE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(AppConfig::default()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(?config, "starting psyche");

    let params = Arc::new(ParameterSet::standard());
    tracing::info!("parameters:\n{}", params.describe_json()?);

    let reader: Box<dyn FrameReader> = match (&config.capture, &config.input) {
        (Some(uri), _) => open_capture(uri)?,
        (None, Some(dir)) => Box::new(ImageSequenceReader::open(dir, config.looping)?),
        (None, None) => Box::new(PatternReader::new(PATTERN_SIZE.0, PATTERN_SIZE.1)),
    };
    let source = VideoSource::open(reader, config.source_config())?;

    let sink: Box<dyn DisplaySink> = match &config.output {
        Some(dir) => Box::new(PngSequenceSink::create(dir)?),
        None => Box::new(NullSink::new()),
    };

    let processor = FrameProcessor::new(Arc::clone(&params));
    let run_loop = RunLoop::new(source, processor, sink, config.engine_config())?;

    // Detached: it stays blocked on stdin until the process exits.
    let _control = control::spawn_stdin_control(Controls {
        params,
        stop: run_loop.stop_handle(),
        processor: run_loop.processor(),
    })?;

    let summary = run_loop.run()?;
    println!(
        "presented {} frames ({} flow skips), stopped: {:?}",
        summary.frames, summary.flow_skips, summary.reason
    );
    Ok(())
}

#[cfg(feature = "video")]
fn open_capture(uri: &str) -> Result<Box<dyn FrameReader>, Box<dyn std::error::Error>> {
    Ok(Box::new(psyche_engine::VideoCaptureReader::open(uri)?))
}

#[cfg(not(feature = "video"))]
fn open_capture(uri: &str) -> Result<Box<dyn FrameReader>, Box<dyn std::error::Error>> {
    Err(format!("cannot capture from {uri:?}: built without the `video` feature").into())
}
