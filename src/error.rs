//! Error types for configuring and constructing a noise ball
//!
//! Nothing in the per-frame path returns an error. Everything here is a
//! configuration-time failure: a missing asset, a kernel program without the
//! required entry points, a config file that cannot be read, or (with the
//! `gpu` feature) no usable GPU device.

use thiserror::Error;

/// Errors that can occur while configuring or building a noise ball
#[derive(Error, Debug)]
pub enum NoiseBallError {
    /// A required asset (mesh, material, compute program) was not supplied
    #[error("missing required asset: {0}")]
    MissingAsset(&'static str),

    /// The compute program does not declare a kernel the stepper dispatches
    #[error("compute program '{program}' has no kernel named '{kernel}'")]
    MissingKernel { program: String, kernel: &'static str },

    /// The config file format is not supported
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// The config file extension could not be determined
    #[error("could not determine config format from path: {0}")]
    UnknownExtension(String),

    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML config could not be parsed
    #[error("YAML config error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON config could not be parsed
    #[error("JSON config error: {0}")]
    Json(#[from] serde_json::Error),

    /// No GPU adapter matched the request
    #[cfg(feature = "gpu")]
    #[error("no suitable GPU adapter found")]
    NoAdapter,

    /// The adapter refused to create a device
    #[cfg(feature = "gpu")]
    #[error("failed to create GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    /// Mapping a staging buffer for readback failed
    #[cfg(feature = "gpu")]
    #[error("GPU readback failed: {0}")]
    Readback(#[from] wgpu::BufferAsyncError),
}

/// Result type for noise ball construction and loading
pub type Result<T> = std::result::Result<T, NoiseBallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_kernel_names_program_and_kernel() {
        let err = NoiseBallError::MissingKernel {
            program: "custom".to_string(),
            kernel: "UpdateNodes",
        };
        assert_eq!(
            err.to_string(),
            "compute program 'custom' has no kernel named 'UpdateNodes'"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: NoiseBallError = io.into();
        assert!(matches!(err, NoiseBallError::Io(_)));
    }
}
