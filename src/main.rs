//! pwmix CLI: inspect a WAD's sound effects, render them to WAV, or play
//! them live on a PWM pin or the sound card.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use pwmix_audio::{CpalActuator, NullActuator, PwmConfig};
use pwmix_engine::NORM_PITCH;
use pwmix_master::{samples_per_tic, OfflineRenderer, SfxId, SoundConfig, SoundSystem, TICRATE};
use pwmix_wad::{sfx_id, SfxBank, Wad, SFX};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "alloc_check")]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

#[derive(Parser)]
#[command(name = "pwmix")]
#[command(about = "PWM software mixer for WAD sound effects", long_about = None)]
struct Cli {
    /// More log output (repeat for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sound effects a WAD provides
    List {
        /// WAD file to read
        wad: PathBuf,
    },

    /// Mix effects offline and write a mono WAV
    Render {
        /// WAD file to read
        wad: PathBuf,

        /// Effect names, started one after another
        #[arg(required = true)]
        sfx: Vec<String>,

        /// Output WAV file
        #[arg(short, long, default_value = "pwmix.wav")]
        out: PathBuf,

        /// Start volume (0-127)
        #[arg(long, default_value = "127")]
        volume: i32,

        /// Step table position (128 = recorded speed)
        #[arg(long, default_value_t = NORM_PITCH)]
        pitch: u8,

        /// Game tics between starts
        #[arg(long, default_value = "10")]
        gap_tics: u32,
    },

    /// Play effects in a loop on a live output
    Play {
        /// WAD file to read
        wad: PathBuf,

        /// Effect names, cycled through
        #[arg(required = true)]
        sfx: Vec<String>,

        #[arg(short, long, value_enum, default_value = "pwm")]
        backend: Backend,

        /// Seconds to run for
        #[arg(short, long, default_value = "5.0")]
        seconds: f64,

        /// Milliseconds between starts
        #[arg(long, default_value = "500")]
        interval_ms: u64,

        /// Start volume (0-127)
        #[arg(long, default_value = "127")]
        volume: i32,

        /// Step table position (128 = recorded speed)
        #[arg(long, default_value_t = NORM_PITCH)]
        pitch: u8,

        #[arg(long, default_value = "/sys/class/pwm")]
        sysfs_root: PathBuf,

        #[arg(long, default_value = "0")]
        chip: u32,

        #[arg(long, default_value = "0")]
        channel: u32,

        /// PWM period in nanoseconds
        #[arg(long, default_value = "10000")]
        period_ns: u32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Linux sysfs PWM channel
    Pwm,
    /// Default sound card
    Cpal,
    /// Discard output
    Null,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::List { wad } => list(&wad),
        Commands::Render {
            wad,
            sfx,
            out,
            volume,
            pitch,
            gap_tics,
        } => render(&wad, &sfx, &out, volume, pitch, gap_tics),
        Commands::Play {
            wad,
            sfx,
            backend,
            seconds,
            interval_ms,
            volume,
            pitch,
            sysfs_root,
            chip,
            channel,
            period_ns,
        } => {
            let config = SoundConfig {
                pwm: PwmConfig {
                    sysfs_root,
                    chip,
                    channel,
                    period_ns,
                },
                ..SoundConfig::default()
            };
            let options = PlayOptions {
                backend,
                duration: Duration::from_secs_f64(seconds.max(0.0)),
                interval: Duration::from_millis(interval_ms.max(1)),
                volume,
                pitch,
            };
            play(&wad, &sfx, config, &options)
        }
    }
}

fn load_bank(path: &Path) -> Result<SfxBank, Box<dyn Error>> {
    let wad = Wad::open(path)?;
    tracing::info!(path = %path.display(), kind = ?wad.kind(), lumps = wad.lumps().len(), "opened WAD");
    Ok(SfxBank::load(&wad)?)
}

fn resolve_names(names: &[String]) -> Result<Vec<SfxId>, Box<dyn Error>> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        let id = sfx_id(name).ok_or_else(|| format!("unknown sound effect: {}", name))?;
        ids.push(id);
    }
    Ok(ids)
}

fn list(path: &Path) -> Result<(), Box<dyn Error>> {
    let bank = load_bank(path)?;
    println!("{:>4}  {:<8}  {:>7}  source", "id", "name", "samples");
    for (id, info) in SFX.iter().enumerate().skip(1) {
        let id = id as SfxId;
        let source = if bank.substituted().contains(&id) {
            "fallback"
        } else if let Some(link) = info.link {
            SFX[link as usize].name
        } else {
            "wad"
        };
        println!(
            "{:>4}  {:<8}  {:>7}  {}",
            id,
            info.name,
            bank.get(id).len(),
            source
        );
    }
    Ok(())
}

fn render(
    path: &Path,
    names: &[String],
    out: &Path,
    volume: i32,
    pitch: u8,
    gap_tics: u32,
) -> Result<(), Box<dyn Error>> {
    let ids = resolve_names(names)?;
    let config = SoundConfig::default();
    let mut renderer = OfflineRenderer::new(load_bank(path)?, config.exclusive.clone());
    let per_tic = samples_per_tic(config.sample_rate);

    let mut duty = Vec::new();
    for id in ids {
        renderer.start(id, volume, pitch)?;
        for _ in 0..gap_tics {
            duty.extend(renderer.render(per_tic));
            renderer.advance_tics(1);
        }
    }
    // Let the tail ring out, capped at a minute.
    duty.extend(renderer.render_until_idle(config.sample_rate as usize * 60));

    let wav = pwmix_master::duty_to_wav(&duty, config.sample_rate)?;
    std::fs::write(out, wav)?;
    println!(
        "Wrote {} ({:.2}s at {} Hz)",
        out.display(),
        duty.len() as f64 / f64::from(config.sample_rate),
        config.sample_rate
    );
    Ok(())
}

struct PlayOptions {
    backend: Backend,
    duration: Duration,
    interval: Duration,
    volume: i32,
    pitch: u8,
}

fn play(
    path: &Path,
    names: &[String],
    config: SoundConfig,
    options: &PlayOptions,
) -> Result<(), Box<dyn Error>> {
    let ids = resolve_names(names)?;
    let bank = load_bank(path)?;
    let tic = Arc::new(AtomicI32::new(0));
    let sample_rate = config.sample_rate;
    let period_ns = config.pwm.period_ns;
    let pwm = config.pwm.clone();

    let sound = SoundSystem::new(config, bank, tic.clone());
    match options.backend {
        #[cfg(unix)]
        Backend::Pwm => sound.init(move || pwmix_audio::PwmActuator::open(&pwm)),
        #[cfg(not(unix))]
        Backend::Pwm => {
            drop(pwm);
            return Err("PWM output needs a Linux sysfs PWM class".into());
        }
        Backend::Cpal => sound.init(move || CpalActuator::open(sample_rate, period_ns)),
        Backend::Null => sound.init(move || Ok(NullActuator::new(period_ns))),
    }

    let started = Instant::now();
    let tic_length = Duration::from_secs(1) / TICRATE as u32;
    let mut next_start = started;
    let mut cycle = ids.iter().copied().cycle();

    while started.elapsed() < options.duration {
        let elapsed = started.elapsed();
        tic.store((elapsed.as_nanos() / tic_length.as_nanos()) as i32, Ordering::Relaxed);

        if Instant::now() >= next_start {
            if let Some(id) = cycle.next() {
                sound.start_sound(id, options.volume, 128, options.pitch, 0)?;
            }
            next_start += options.interval;
        }
        std::thread::sleep(tic_length);
    }

    tracing::info!(state = ?sound.output_state(), "stopping");
    sound.shutdown();
    Ok(())
}
