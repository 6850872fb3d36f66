// ============================================================================
// Optional Numeric Capabilities
// ============================================================================
//
// Some processors depend on engines that may not be present in every build
// or deployment. They are looked up once, stored in an immutable
// `Capabilities` value and passed explicitly to the operations that need
// them.

use crate::errors::{ProcessingError, ProcessingResult};
use crate::spectral_gate::SpectralGate;
use std::fmt;
use std::sync::Arc;

/// Name reported when no noise reducer is installed
pub const NOISE_REDUCTION: &str = "noise reduction";

/// Reduces stationary noise in a single-channel signal
///
/// Implementations must return exactly `signal.len()` samples in the same
/// scale as the input.
pub trait NoiseReducer: Send + Sync {
    /// Short identifier for logs
    fn name(&self) -> &str;

    /// Denoise one channel
    fn reduce_noise(&self, signal: &[f64], sample_rate: u32) -> ProcessingResult<Vec<f64>>;
}

/// Set of optional engines available to processors
#[derive(Clone, Default)]
pub struct Capabilities {
    noise_reducer: Option<Arc<dyn NoiseReducer>>,
}

impl Capabilities {
    /// No optional engines
    pub fn none() -> Self {
        Self::default()
    }

    /// Everything this build provides
    pub fn detect() -> Self {
        let caps = Self::none().with_noise_reducer(Arc::new(SpectralGate::default()));
        log::info!("capabilities: {}", caps);
        caps
    }

    /// Install (or replace) the noise reducer
    pub fn with_noise_reducer(mut self, reducer: Arc<dyn NoiseReducer>) -> Self {
        self.noise_reducer = Some(reducer);
        self
    }

    pub fn noise_reducer(&self) -> Option<&dyn NoiseReducer> {
        self.noise_reducer.as_deref()
    }

    /// The noise reducer, or `CapabilityUnavailable`
    pub fn require_noise_reducer(&self) -> ProcessingResult<&dyn NoiseReducer> {
        self.noise_reducer()
            .ok_or(ProcessingError::CapabilityUnavailable(NOISE_REDUCTION))
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("noise_reducer", &self.noise_reducer().map(|r| r.name()))
            .finish()
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.noise_reducer() {
            Some(reducer) => write!(f, "{}: {}", NOISE_REDUCTION, reducer.name()),
            None => write!(f, "{}: unavailable", NOISE_REDUCTION),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Halver;

    impl NoiseReducer for Halver {
        fn name(&self) -> &str {
            "halver"
        }

        fn reduce_noise(&self, signal: &[f64], _sample_rate: u32) -> ProcessingResult<Vec<f64>> {
            Ok(signal.iter().map(|x| x * 0.5).collect())
        }
    }

    #[test]
    fn test_none_has_no_reducer() {
        let caps = Capabilities::none();
        assert!(caps.noise_reducer().is_none());
        assert!(matches!(
            caps.require_noise_reducer(),
            Err(ProcessingError::CapabilityUnavailable(NOISE_REDUCTION))
        ));
        assert_eq!(caps.to_string(), "noise reduction: unavailable");
    }

    #[test]
    fn test_detect_installs_spectral_gate() {
        let caps = Capabilities::detect();
        assert_eq!(caps.require_noise_reducer().unwrap().name(), "spectral-gate");
    }

    #[test]
    fn test_custom_reducer() {
        let caps = Capabilities::none().with_noise_reducer(Arc::new(Halver));
        let reducer = caps.noise_reducer().unwrap();
        assert_eq!(reducer.reduce_noise(&[2.0, -4.0], 8000).unwrap(), vec![1.0, -2.0]);
        assert_eq!(format!("{:?}", caps), "Capabilities { noise_reducer: Some(\"halver\") }");
    }
}
