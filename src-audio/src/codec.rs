// ============================================================================
// File Codec
// ============================================================================
//
// Decoding goes through Symphonia with an explicitly registered set of
// format readers and codecs; processed audio is always written back as WAV
// with hound.

use crate::buffer::{AudioBuffer, SampleFormat};
use crate::errors::{ProcessingError, ProcessingResult};
use std::fs::File;
use std::path::{Path, PathBuf};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{
    CODEC_TYPE_MP3, CODEC_TYPE_NULL, CODEC_TYPE_PCM_F32BE, CODEC_TYPE_PCM_F32LE,
    CODEC_TYPE_PCM_F64BE, CODEC_TYPE_PCM_F64LE, CODEC_TYPE_VORBIS, CodecParameters,
    CodecRegistry, CodecType, DecoderOptions,
};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::{Hint, Probe};
use symphonia::core::sample::SampleFormat as SymphoniaSampleFormat;

/// Containers accepted as input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Flac,
    Mp3,
    Vorbis,
}

impl AudioFormat {
    /// Detect audio format from file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())?;
        match extension.as_str() {
            "wav" | "wave" => Some(AudioFormat::Wav),
            "flac" => Some(AudioFormat::Flac),
            "mp3" => Some(AudioFormat::Mp3),
            "ogg" | "oga" => Some(AudioFormat::Vorbis),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "WAV",
            AudioFormat::Flac => "FLAC",
            AudioFormat::Mp3 => "MP3",
            AudioFormat::Vorbis => "Vorbis",
        }
    }

    pub fn is_lossless(&self) -> bool {
        matches!(self, AudioFormat::Wav | AudioFormat::Flac)
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Create a probe with all supported format readers registered
fn create_probe() -> Probe {
    let mut probe = Probe::default();
    probe.register_all::<symphonia_format_riff::WavReader>();
    probe.register_all::<symphonia_bundle_flac::FlacReader>();
    probe.register_all::<symphonia_bundle_mp3::MpaReader>();
    probe.register_all::<symphonia_format_ogg::OggReader>();
    probe
}

/// Create a codec registry with all supported decoders registered
fn create_codec_registry() -> CodecRegistry {
    let mut registry = CodecRegistry::new();
    registry.register_all::<symphonia_codec_pcm::PcmDecoder>();
    registry.register_all::<symphonia_bundle_flac::FlacDecoder>();
    registry.register_all::<symphonia_bundle_mp3::MpaDecoder>();
    registry.register_all::<symphonia_codec_vorbis::VorbisDecoder>();
    registry
}

/// Buffer format for a decoded track
///
/// Float codecs map to `F32`, integer codecs to the nearest bit depth at or
/// above theirs, and lossy codecs without a declared depth to 16-bit.
fn pick_format(params: &CodecParameters) -> SampleFormat {
    // PCM float tracks carry the type in the codec, not in `sample_format`
    let float_codec = [
        CODEC_TYPE_PCM_F32LE,
        CODEC_TYPE_PCM_F32BE,
        CODEC_TYPE_PCM_F64LE,
        CODEC_TYPE_PCM_F64BE,
    ]
    .contains(&params.codec);
    if float_codec
        || matches!(
            params.sample_format,
            Some(SymphoniaSampleFormat::F32 | SymphoniaSampleFormat::F64)
        )
    {
        return SampleFormat::F32;
    }
    match params.bits_per_sample {
        Some(bits) if bits <= 8 => SampleFormat::I8,
        Some(bits) if bits <= 16 => SampleFormat::I16,
        Some(bits) if bits <= 24 => SampleFormat::I24,
        Some(_) => SampleFormat::I32,
        None => SampleFormat::I16,
    }
}

/// Whether the container's frame count is exact for this codec
fn has_exact_length(codec: CodecType) -> bool {
    codec != CODEC_TYPE_MP3 && codec != CODEC_TYPE_VORBIS
}

fn decode_error(path: &Path, reason: impl Into<String>) -> ProcessingError {
    ProcessingError::Decode {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Decode an audio file into a buffer
///
/// # Errors
/// `Decode` when the file is missing, the container or codec is not
/// supported, or the stream is corrupt. A corrupt packet aborts decoding,
/// and so does a lossless stream shorter than its header declares.
pub fn decode_file(path: &Path) -> ProcessingResult<AudioBuffer> {
    let file = File::open(path).map_err(|e| decode_error(path, e.to_string()))?;
    let media_source = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let probed = create_probe()
        .format(
            &hint,
            media_source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| match e {
            SymphoniaError::Unsupported(what) => {
                decode_error(path, format!("unsupported format: {}", what))
            }
            other => decode_error(path, other.to_string()),
        })?;
    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| decode_error(path, "no audio track found"))?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let sample_rate = params
        .sample_rate
        .ok_or_else(|| decode_error(path, "no sample rate found"))?;
    let format = pick_format(&params);
    let mut channels = params.channels.map(|layout| layout.count() as u16);

    let mut decoder = create_codec_registry()
        .make(&params, &DecoderOptions::default())
        .map_err(|e| decode_error(path, format!("unsupported codec: {}", e)))?;

    let shift = 32 - format.bits() as u32;
    let mut samples: Vec<f64> = Vec::new();
    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(err) => return Err(decode_error(path, err.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                return Err(decode_error(path, format!("corrupt packet: {}", reason)));
            }
            Err(err) => return Err(decode_error(path, err.to_string())),
        };

        let spec = *decoded.spec();
        channels.get_or_insert(spec.channels.count() as u16);
        if format.is_float() {
            let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buf.copy_interleaved_ref(decoded);
            samples.extend(buf.samples().iter().map(|&s| s as f64));
        } else {
            let mut buf = SampleBuffer::<i32>::new(decoded.capacity() as u64, spec);
            buf.copy_interleaved_ref(decoded);
            samples.extend(buf.samples().iter().map(|&s| (s >> shift) as f64));
        }
    }

    let channels = channels.ok_or_else(|| decode_error(path, "unknown channel count"))?;
    let frames = samples.len() as u64 / channels.max(1) as u64;
    if let Some(expected) = params.n_frames.filter(|_| has_exact_length(params.codec)) {
        if frames < expected {
            return Err(decode_error(
                path,
                format!("stream truncated: {} of {} frames", frames, expected),
            ));
        }
    }
    let buffer = AudioBuffer::new(sample_rate, channels, format, samples)
        .map_err(|e| decode_error(path, e.to_string()))?;
    log::debug!(
        "decoded {}: {} Hz, {} ch, {}, {:.1} ms",
        path.display(),
        sample_rate,
        channels,
        format.as_str(),
        buffer.duration_ms()
    );
    Ok(buffer)
}

fn encode_error(path: &Path, reason: impl Into<String>) -> ProcessingError {
    ProcessingError::Encode {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Write a buffer as WAV (PCM for integer formats, IEEE float for `F32`)
pub fn encode_wav(buffer: &AudioBuffer, path: &Path) -> ProcessingResult<()> {
    let format = buffer.format();
    let spec = hound::WavSpec {
        channels: buffer.channels(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: format.bits(),
        sample_format: if format.is_float() {
            hound::SampleFormat::Float
        } else {
            hound::SampleFormat::Int
        },
    };

    let mut writer =
        hound::WavWriter::create(path, spec).map_err(|e| encode_error(path, e.to_string()))?;
    for &sample in buffer.samples() {
        let written = match format {
            SampleFormat::I8 => writer.write_sample(sample as i8),
            SampleFormat::I16 => writer.write_sample(sample as i16),
            SampleFormat::I24 | SampleFormat::I32 => writer.write_sample(sample as i32),
            SampleFormat::F32 => writer.write_sample(sample as f32),
        };
        written.map_err(|e| encode_error(path, e.to_string()))?;
    }
    writer
        .finalize()
        .map_err(|e| encode_error(path, e.to_string()))?;
    log::debug!("wrote {}", path.display());
    Ok(())
}

/// Destination for the processed version of `source` inside `out_dir`
///
/// Always a `.wav` file named after the source; an existing file is never
/// reused, a numeric suffix is added instead.
pub fn output_path_for(source: &Path, out_dir: &Path) -> PathBuf {
    match AudioFormat::from_path(source) {
        Some(AudioFormat::Wav) => {}
        Some(other) => log::info!("{} source will be written as WAV", other),
        None => log::warn!(
            "{}: unrecognized extension, writing WAV",
            source.display()
        ),
    }

    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("audio");
    let candidate = out_dir.join(format!("{}.wav", stem));
    if !candidate.exists() {
        return candidate;
    }
    (1..)
        .map(|n| out_dir.join(format!("{}_{}.wav", stem, n)))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}
