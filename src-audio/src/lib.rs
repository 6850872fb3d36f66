pub mod buffer;
pub use buffer::{AudioBuffer, SampleFormat, db_to_gain, gain_to_db};

pub mod errors;
pub use errors::{ProcessingError, ProcessingResult};

pub mod capabilities;
pub use capabilities::{Capabilities, NoiseReducer};

pub mod spectral_gate;
pub use spectral_gate::{SpectralGate, SpectralGateConfig};

pub mod processors;
pub use processors::{
    EqBandSpec, FilterBand, Operation, apply_3band_eq, apply_chain, apply_compressor, apply_delay,
    apply_denoise, apply_eq_10band, apply_fade, apply_gain, apply_highpass, apply_lowpass,
    apply_multiband_eq, apply_pan, apply_reverb_simple, normalize, trim,
};

pub mod analysis;
pub use analysis::{
    AnalysisReport, ClipReport, PeakReport, RmsTrace, SilenceInterval, SilenceReport,
    detect_clipping, detect_peaks, detect_silence, rms_over_time,
};

pub mod codec;
pub use codec::{AudioFormat, decode_file, encode_wav, output_path_for};

pub mod external;
pub use external::{
    DispatchError, DispatchResult, ExternalCommandRequest, HostSnapshot, build_command, execute,
};

pub mod pipeline;
pub use pipeline::{ExternalJob, ExternalOutput, PipelineError, PipelineResult, process_file, run_external};

pub mod signals;
