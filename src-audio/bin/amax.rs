use amax_audio::external::hosts::{HostSnapshot, classify_host, default_template};
use amax_audio::processors::reduce_with;
use amax_audio::signals::{gen_tone, replicate_mono};
use amax_audio::{
    AnalysisReport, AudioBuffer, Capabilities, ExternalJob, Operation, SampleFormat,
    decode_file, detect_clipping, detect_peaks, detect_silence, encode_wav, output_path_for,
    process_file, rms_over_time, run_external,
};
use amax_env::{Preferences, ensure_temp_root};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Offline audio processing and external host dispatch
#[derive(Parser)]
#[command(name = "amax")]
#[command(version, about = "Offline audio processing and external host dispatch")]
struct Cli {
    /// Preferences file (defaults to $AMAX_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    prefs: Option<PathBuf>,

    /// Output directory (defaults to $AMAX_TMP_DIR or <temp>/audio_max)
    #[arg(short, long, global = true)]
    out_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Change level by a number of dB
    Gain {
        input: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        db: f64,
    },
    /// Linear fade in / fade out
    Fade {
        input: PathBuf,
        #[arg(long, default_value = "0")]
        fade_in_ms: f64,
        #[arg(long, default_value = "0")]
        fade_out_ms: f64,
    },
    /// Constant-power pan of a stereo file (-100 left .. 100 right)
    Pan {
        input: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        percent: f64,
    },
    /// Peak-normalize to full scale
    Normalize { input: PathBuf },
    /// Repeating echo
    Delay {
        input: PathBuf,
        #[arg(long, default_value = "250")]
        delay_ms: f64,
        #[arg(long, default_value = "2")]
        repeats: u32,
    },
    /// Three-tap early-reflection reverb
    Reverb { input: PathBuf },
    /// Static whole-file compressor
    Compress {
        input: PathBuf,
        #[arg(long, default_value = "-20", allow_hyphen_values = true)]
        threshold_db: f64,
        #[arg(long, default_value = "4")]
        ratio: f64,
    },
    /// Spectral-gate noise reduction
    Denoise {
        input: PathBuf,
        /// Fail instead of copying the input when no noise reducer is available
        #[arg(long)]
        require: bool,
    },
    /// 10-band EQ (31 Hz .. 16 kHz), gains in dB separated by commas
    Eq {
        input: PathBuf,
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        gains: Vec<f64>,
    },
    /// Three-band EQ split at 200 Hz and 4 kHz
    Eq3band {
        input: PathBuf,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        low_db: f64,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        mid_db: f64,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        high_db: f64,
    },
    /// Second-order Butterworth low-pass
    Lowpass {
        input: PathBuf,
        #[arg(long)]
        cutoff_hz: f64,
    },
    /// Second-order Butterworth high-pass
    Highpass {
        input: PathBuf,
        #[arg(long)]
        cutoff_hz: f64,
    },
    /// Keep a time range; negative offsets count from the end
    Trim {
        input: PathBuf,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        start_ms: f64,
        #[arg(long, allow_hyphen_values = true)]
        end_ms: f64,
    },
    /// Apply a JSON list of operations, e.g. [{"op":"gain","db":-3},{"op":"normalize"}]
    Chain {
        input: PathBuf,
        #[arg(long)]
        ops: PathBuf,
    },
    /// Measure a file and print a JSON report
    Analyze {
        input: PathBuf,
        #[command(subcommand)]
        analysis: Analysis,
    },
    /// Run a file through an external plugin host
    External {
        input: PathBuf,
        /// Host executable (defaults to the best discovered host)
        #[arg(long)]
        host: Option<PathBuf>,
        #[arg(long)]
        plugin: Option<PathBuf>,
        #[arg(long)]
        preset: Option<PathBuf>,
        /// Command template (defaults to the preferences, then the host's default)
        #[arg(long)]
        template: Option<String>,
    },
    /// List discovered plugin hosts, best first
    Hosts,
    /// Write a test tone
    Tone {
        output: PathBuf,
        #[arg(long, default_value = "1000")]
        freq: f64,
        #[arg(long, default_value = "0.5")]
        amp: f64,
        #[arg(long, default_value = "1")]
        seconds: f64,
        #[arg(long, default_value = "44100")]
        sample_rate: u32,
        #[arg(long, default_value = "2")]
        channels: u16,
    },
}

#[derive(Subcommand)]
enum Analysis {
    /// Samples above a dBFS threshold
    Peaks {
        #[arg(long, default_value = "-1", allow_hyphen_values = true)]
        threshold_db: f64,
    },
    /// Chunks reaching the clip level
    Clipping {
        /// Clip level in dBFS; a 16-bit +32767 peak is about -0.0003 dBFS,
        /// so use a level just below 0 (e.g. -0.1) for integer files
        #[arg(long, default_value = "-0.1", allow_hyphen_values = true)]
        clip_db: f64,
        #[arg(long, default_value = "10")]
        chunk_ms: u32,
    },
    /// Silent stretches
    Silence {
        #[arg(long, default_value = "500")]
        min_silence_ms: u32,
        #[arg(long, default_value = "-50", allow_hyphen_values = true)]
        thresh_db: f64,
    },
    /// RMS per chunk
    Rms {
        #[arg(long, default_value = "100")]
        chunk_ms: u32,
    },
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_prefs(path: Option<&Path>) -> CliResult<Preferences> {
    Ok(match path {
        Some(path) => Preferences::load_from_path(path)?,
        None => Preferences::load()?,
    })
}

fn out_dir(cli_dir: Option<PathBuf>) -> CliResult<PathBuf> {
    Ok(match cli_dir {
        Some(dir) => dir,
        None => ensure_temp_root()?,
    })
}

fn run_operation(input: &Path, out_dir: &Path, op: Operation) -> CliResult<()> {
    let caps = Capabilities::detect();
    let written = process_file(input, out_dir, |buffer| op.apply(buffer, &caps))?;
    println!("{}", written.display());
    Ok(())
}

fn run(cli: Cli) -> CliResult<()> {
    let prefs = load_prefs(cli.prefs.as_deref())?;

    let (input, op) = match cli.command {
        Command::Gain { input, db } => (input, Operation::Gain { db }),
        Command::Fade {
            input,
            fade_in_ms,
            fade_out_ms,
        } => (
            input,
            Operation::Fade {
                fade_in_ms,
                fade_out_ms,
            },
        ),
        Command::Pan { input, percent } => (input, Operation::Pan { percent }),
        Command::Normalize { input } => (input, Operation::Normalize),
        Command::Delay {
            input,
            delay_ms,
            repeats,
        } => (input, Operation::Delay { delay_ms, repeats }),
        Command::Reverb { input } => (input, Operation::Reverb),
        Command::Compress {
            input,
            threshold_db,
            ratio,
        } => (
            input,
            Operation::Compressor {
                threshold_db,
                ratio,
            },
        ),
        Command::Denoise { input, require } => {
            let out_dir = out_dir(cli.out_dir)?;
            if require {
                let caps = Capabilities::detect();
                let written = process_file(&input, &out_dir, |buffer| {
                    reduce_with(buffer, caps.require_noise_reducer()?)
                })?;
                println!("{}", written.display());
                return Ok(());
            }
            return run_operation(&input, &out_dir, Operation::Denoise);
        }
        Command::Eq { input, gains } => {
            let gains_db: [f64; 10] = gains
                .try_into()
                .map_err(|g: Vec<f64>| format!("expected 10 gains, got {}", g.len()))?;
            (input, Operation::Eq { gains_db })
        }
        Command::Eq3band {
            input,
            low_db,
            mid_db,
            high_db,
        } => (
            input,
            Operation::Eq3Band {
                low_db,
                mid_db,
                high_db,
            },
        ),
        Command::Lowpass { input, cutoff_hz } => (input, Operation::Lowpass { cutoff_hz }),
        Command::Highpass { input, cutoff_hz } => (input, Operation::Highpass { cutoff_hz }),
        Command::Trim {
            input,
            start_ms,
            end_ms,
        } => (input, Operation::Trim { start_ms, end_ms }),
        Command::Chain { input, ops } => {
            let text = std::fs::read_to_string(&ops)?;
            let operations: Vec<Operation> = serde_json::from_str(&text)?;
            let caps = Capabilities::detect();
            let out_dir = out_dir(cli.out_dir)?;
            let written = process_file(&input, &out_dir, |buffer| {
                amax_audio::apply_chain(buffer, &operations, &caps)
            })?;
            println!("{}", written.display());
            return Ok(());
        }
        Command::Analyze { input, analysis } => {
            let buffer = decode_file(&input)?;
            let report = match analysis {
                Analysis::Peaks { threshold_db } => {
                    AnalysisReport::Peaks(detect_peaks(&buffer, threshold_db)?)
                }
                Analysis::Clipping { clip_db, chunk_ms } => {
                    AnalysisReport::Clipping(detect_clipping(&buffer, clip_db, chunk_ms)?)
                }
                Analysis::Silence {
                    min_silence_ms,
                    thresh_db,
                } => AnalysisReport::Silence(detect_silence(&buffer, min_silence_ms, thresh_db)?),
                Analysis::Rms { chunk_ms } => {
                    AnalysisReport::Rms(rms_over_time(&buffer, chunk_ms)?)
                }
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }
        Command::External {
            input,
            host,
            plugin,
            preset,
            template,
        } => {
            let host = match host {
                Some(host) => host,
                None => HostSnapshot::discover()
                    .best()
                    .map(Path::to_path_buf)
                    .ok_or("no plugin host found; pass --host")?,
            };
            let template = template.unwrap_or_else(|| {
                if prefs.command_template == amax_env::constants::DEFAULT_COMMAND_TEMPLATE {
                    default_template(&host).to_string()
                } else {
                    prefs.command_template.clone()
                }
            });
            let job = ExternalJob::from_prefs(host, &prefs)
                .with_template(template)
                .with_plugin(plugin)
                .with_preset(preset);

            let buffer = decode_file(&input)?;
            let work_root = out_dir(cli.out_dir)?;
            let result = run_external(&buffer, &job, &work_root)?;
            let written = output_path_for(&input, &result.output_dir);
            encode_wav(&result.buffer, &written)?;
            println!("{}", written.display());
            return Ok(());
        }
        Command::Hosts => {
            let snapshot = HostSnapshot::discover();
            if snapshot.is_empty() {
                println!("no plugin hosts found");
            }
            for host in snapshot.hosts() {
                println!("{:?}\t{}", classify_host(host), host.display());
            }
            return Ok(());
        }
        Command::Tone {
            output,
            freq,
            amp,
            seconds,
            sample_rate,
            channels,
        } => {
            let mono = gen_tone(freq, amp, sample_rate, seconds);
            let buffer = AudioBuffer::from_normalized(
                sample_rate,
                channels,
                SampleFormat::I16,
                &replicate_mono(&mono, channels),
            )?;
            encode_wav(&buffer, &output)?;
            println!("{}", output.display());
            return Ok(());
        }
    };

    let out_dir = out_dir(cli.out_dir)?;
    run_operation(&input, &out_dir, op)
}
