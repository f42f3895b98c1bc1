use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use metronome_engine::engine::{platform_output, StubOutput};
use metronome_engine::{
    AppConfig, AssetDecoder, BeatPattern, Metronome, MetronomeEvent, MetronomeEventKind,
    SynthAssetDecoder, WavAssetDecoder,
};
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Audio rendered per offline block.
const RENDER_BLOCK_MS: u64 = 10;

#[derive(Parser, Debug)]
#[command(name = "metronome_cli", about = "Play or render a metronome from the command line")]
struct Cli {
    /// JSON configuration file (defaults to assets/metronome_config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play through the default output device
    Play {
        #[arg(long, default_value_t = 120)]
        bpm: i32,
        /// Beat letters: A accent, N normal, M medium, S or - silence
        #[arg(long, default_value = "ANNN")]
        pattern: BeatPattern,
        #[arg(long, default_value_t = 10.0)]
        seconds: f32,
        /// Directory of WAV sounds; synthesized clicks are used when omitted
        #[arg(long)]
        assets: Option<PathBuf>,
    },
    /// Render to a WAV file without an audio device
    Render {
        #[arg(long, default_value_t = 120)]
        bpm: i32,
        #[arg(long, default_value = "ANNN")]
        pattern: BeatPattern,
        #[arg(long, default_value_t = 4.0)]
        seconds: f32,
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        assets: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    metronome_engine::init_logging();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => load_default_config(),
    };

    match cli.command {
        Commands::Play {
            bpm,
            pattern,
            seconds,
            assets,
        } => run_play(config, bpm, pattern, seconds, assets.as_deref(), cli.json),
        Commands::Render {
            bpm,
            pattern,
            seconds,
            output,
            assets,
        } => run_render(config, bpm, pattern, seconds, &output, assets.as_deref()),
    }
}

#[cfg(not(target_os = "android"))]
fn load_default_config() -> AppConfig {
    AppConfig::load()
}

#[cfg(target_os = "android")]
fn load_default_config() -> AppConfig {
    AppConfig::load_android()
}

fn decoder_for(config: &AppConfig, assets: Option<&Path>) -> Arc<dyn AssetDecoder> {
    match assets {
        Some(dir) => Arc::new(WavAssetDecoder::new(dir)),
        None => Arc::new(SynthAssetDecoder::for_sounds(&config.sounds)),
    }
}

fn configure(metronome: &Metronome, bpm: i32, pattern: BeatPattern) -> Result<()> {
    if pattern.is_empty() {
        return Err(anyhow!("pattern must contain at least one beat"));
    }
    metronome
        .set_bpm(bpm)
        .with_context(|| format!("setting tempo to {} BPM", bpm))?;
    metronome.set_pattern(pattern);
    Ok(())
}

fn run_play(
    config: AppConfig,
    bpm: i32,
    pattern: BeatPattern,
    seconds: f32,
    assets: Option<&Path>,
    json: bool,
) -> Result<ExitCode> {
    let decoder = decoder_for(&config, assets);
    let output = platform_output(&config.audio);
    let metronome = Metronome::new(config, decoder, output).context("creating metronome")?;
    let mut events = metronome.subscribe();
    configure(&metronome, bpm, pattern)?;

    metronome.init().context("opening audio output")?;
    metronome.start_playing().context("starting playback")?;

    let deadline = Instant::now() + Duration::from_secs_f32(seconds.max(0.0));
    while Instant::now() < deadline {
        print_events(&mut events, json)?;
        thread::sleep(Duration::from_millis(RENDER_BLOCK_MS));
    }

    metronome.end().context("shutting down")?;
    print_events(&mut events, json)?;
    Ok(ExitCode::from(0))
}

fn run_render(
    config: AppConfig,
    bpm: i32,
    pattern: BeatPattern,
    seconds: f32,
    output_path: &Path,
    assets: Option<&Path>,
) -> Result<ExitCode> {
    let decoder = decoder_for(&config, assets);
    let (output, handle) = StubOutput::new();
    let metronome =
        Metronome::new(config, decoder, Box::new(output)).context("creating metronome")?;
    configure(&metronome, bpm, pattern)?;
    metronome.init().context("opening offline output")?;

    let format = metronome.format();
    let spec = hound::WavSpec {
        channels: format.channel_count(),
        sample_rate: format.sample_rate(),
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(output_path, spec)
        .with_context(|| format!("creating {}", output_path.display()))?;

    let total_frames = (seconds.max(0.0) * format.sample_rate() as f32) as usize;
    let block_frames = format.frames_for_ms(RENDER_BLOCK_MS as f32).max(1);
    let block = Duration::from_millis(RENDER_BLOCK_MS);

    // Beats are timed by the scheduler thread, so blocks are pulled in real time.
    metronome.start_playing().context("starting playback")?;
    let started = Instant::now();
    let mut rendered = 0usize;
    let mut blocks = 0u32;
    while rendered < total_frames {
        let frames = block_frames.min(total_frames - rendered);
        for sample in handle.render(frames) {
            writer.write_sample(sample)?;
        }
        rendered += frames;
        blocks += 1;

        let next = started + block * blocks;
        if let Some(wait) = next.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }
    }

    let beats = metronome.beat_count();
    metronome.end().context("shutting down")?;
    writer
        .finalize()
        .with_context(|| format!("finalizing {}", output_path.display()))?;

    println!(
        "Rendered {} frames ({} beats) to {}",
        rendered,
        beats,
        output_path.display()
    );
    Ok(ExitCode::from(0))
}

fn print_events(rx: &mut broadcast::Receiver<MetronomeEvent>, json: bool) -> Result<()> {
    loop {
        match rx.try_recv() {
            Ok(event) if json => println!("{}", serde_json::to_string(&event)?),
            Ok(event) => print_event(&event),
            Err(TryRecvError::Lagged(missed)) => eprintln!("({} events dropped)", missed),
            Err(_) => return Ok(()),
        }
    }
}

fn print_event(event: &MetronomeEvent) {
    match &event.kind {
        MetronomeEventKind::Beat {
            index,
            kind,
            measure,
        } => println!("[{:>7} ms] measure {} beat {} {}", event.timestamp_ms, measure, index + 1, kind),
        MetronomeEventKind::Started { bpm } => println!("Started at {} BPM", bpm),
        MetronomeEventKind::Stopped => println!("Stopped"),
        MetronomeEventKind::BpmChanged { bpm } => println!("Tempo {} BPM", bpm),
        MetronomeEventKind::PatternChanged { beats } => println!("Pattern of {} beats", beats.len()),
    }
}
