use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use lipsync_rs::alignment::{lipsync_from_audio, Recognizer, RhubarbAligner, RhubarbConfig};
use lipsync_rs::broadcast::{
    sample_segments, AlignmentFallback, BroadcastConfigBuilder, Orchestrator, SegmentOutcome,
    TimingMode,
};
use lipsync_rs::engines::EspeakEngine;
use lipsync_rs::lipsync::{TimeUnit, DEFAULT_SAMPLE_RATE};
use lipsync_rs::{EngineError, DEFAULT_VOICE};

#[derive(Debug, Parser)]
#[command(
    name = "lipsync-broadcast",
    version,
    about = "Synthesize multi-segment broadcasts with viseme timing for avatar lip-sync"
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Aligner flags shared by `run` and `align`.
#[derive(Debug, clap::Args)]
struct AlignerArgs {
    /// Rhubarb binary (defaults to $RHUBARB_PATH, then `rhubarb` on PATH)
    #[arg(long)]
    rhubarb: Option<PathBuf>,

    /// Rhubarb recognizer: pocketSphinx or phonetic
    #[arg(long, default_value = "pocketSphinx")]
    recognizer: Recognizer,

    /// Seconds before a Rhubarb run is killed
    #[arg(long, default_value_t = 120, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Do not pass the script text to Rhubarb as a hint
    #[arg(long)]
    no_transcript: bool,
}

impl AlignerArgs {
    fn into_aligner(self) -> RhubarbAligner {
        let defaults = RhubarbConfig::default();
        RhubarbAligner::new(RhubarbConfig {
            bin_path: self.rhubarb.unwrap_or(defaults.bin_path),
            recognizer: self.recognizer,
            timeout: Duration::from_secs(self.timeout),
            use_transcript: !self.no_transcript,
        })
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate audio, timing tracks and a manifest from a segment file
    Run {
        /// Segment file (JSON list, or object with `segments`/`items`)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "broadcast_output")]
        output: PathBuf,

        /// espeak-ng voice
        #[arg(long, default_value = DEFAULT_VOICE)]
        voice: String,

        /// Timing source: uniform or aligned
        #[arg(long, default_value = "uniform")]
        mode: TimingMode,

        /// On alignment failure: uniform (keep segment) or fail (drop it)
        #[arg(long, default_value = "uniform")]
        fallback: AlignmentFallback,

        /// Sample rate the timing tracks are expressed in
        #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE, value_parser = positive_rate())]
        sample_rate: u32,

        /// espeak-ng binary
        #[arg(long)]
        espeak: Option<PathBuf>,

        /// espeak-ng data directory
        #[arg(long)]
        espeak_data: Option<PathBuf>,

        #[command(flatten)]
        aligner: AlignerArgs,
    },

    /// Align an existing recording and write its timing track
    Align {
        /// WAV file to align
        #[arg(short, long)]
        audio: PathBuf,

        /// Text file with the spoken script, used as a recognition hint
        #[arg(short, long)]
        transcript: Option<PathBuf>,

        /// Timing track to write
        #[arg(short, long)]
        output: PathBuf,

        /// Sample rate the timing track is expressed in
        #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE, value_parser = positive_rate())]
        sample_rate: u32,

        #[command(flatten)]
        aligner: AlignerArgs,
    },

    /// Write an example segment file
    Sample {
        /// Where to write it
        #[arg(default_value = "sample_segments.json")]
        path: PathBuf,
    },

    /// List installed espeak-ng voices
    Voices {
        /// Language prefix filter, e.g. `en`
        #[arg(default_value = "")]
        language: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<ExitCode, Box<dyn Error>> {
    match command {
        Command::Run {
            input,
            output,
            voice,
            mode,
            fallback,
            sample_rate,
            espeak,
            espeak_data,
            aligner,
        } => {
            let config = BroadcastConfigBuilder::default()
                .output_dir(output)
                .voice(voice)
                .sample_rate(sample_rate)
                .timing_mode(mode)
                .alignment_fallback(fallback)
                .build()?;

            let engine = EspeakEngine::with_espeak(espeak, espeak_data);
            if !engine.is_available() {
                return Err(EngineError::EspeakNotFound.into());
            }

            let mut orchestrator =
                Orchestrator::new(engine, config).with_aligner(aligner.into_aligner());
            let run = orchestrator.run_file(&input)?;

            for outcome in run.failures() {
                if let SegmentOutcome::Failed {
                    index,
                    id,
                    stage,
                    error,
                } = outcome
                {
                    println!("  skipped #{index} {id} ({stage}): {error}");
                }
            }
            println!(
                "Wrote {} ({} of {} segments, {:.1}s)",
                run.manifest_path.display(),
                run.completed(),
                run.outcomes.len(),
                run.manifest.total_duration
            );

            if run.completed() == 0 {
                log::error!("No segment completed");
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Align {
            audio,
            transcript,
            output,
            sample_rate,
            aligner,
        } => {
            let transcript = transcript.map(fs::read_to_string).transpose()?;
            let report_path = report_path_for(&output);
            let track = lipsync_from_audio(
                &aligner.into_aligner(),
                &audio,
                transcript.as_deref().map(str::trim),
                &report_path,
                TimeUnit::Samples(sample_rate),
            )?;
            track.write_json(&output)?;
            println!(
                "Wrote {} ({} visemes, raw report {})",
                output.display(),
                track.len(),
                report_path.display()
            );
            Ok(ExitCode::SUCCESS)
        }

        Command::Sample { path } => {
            let sample = serde_json::json!({
                "title": "Evening News",
                "segments": sample_segments(),
            });
            fs::write(&path, serde_json::to_string_pretty(&sample)?)?;
            println!("Wrote sample segments to {}", path.display());
            Ok(ExitCode::SUCCESS)
        }

        Command::Voices { language } => {
            let voices = EspeakEngine::new().list_voices(&language)?;
            println!("LANGUAGE\tGENDER\tNAME");
            for voice in voices {
                println!("{}\t{}\t{}", voice.language, voice.gender, voice.name);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn positive_rate() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..)
}

/// `track.json` -> `track_rhubarb.json`, next to the track.
fn report_path_for(track_path: &Path) -> PathBuf {
    let stem = track_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("track");
    track_path.with_file_name(format!("{stem}_rhubarb.json"))
}
