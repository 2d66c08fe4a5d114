pub mod inference;
pub mod logging;

// Re-exports for convenience
pub use inference::{
    AvailabilityProber, ConnectivityState, InferenceClient, InferenceError, ProberHandle,
    ServerConfig,
};

/// Directory name used under the platform data dir.
const APP_DIR: &str = "journal-formatter";

/// Where the log file lives.
///
/// The platform data directory (`$XDG_DATA_HOME`, `~/Library/Application
/// Support`, `%APPDATA%`) when one resolves, otherwise a dot-directory in
/// the home directory, otherwise the working directory.
pub fn data_dir() -> std::path::PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .or_else(|| dirs::home_dir().map(|home| home.join(format!(".{APP_DIR}"))))
        .unwrap_or_else(|| std::path::PathBuf::from(".").join(format!(".{APP_DIR}")))
}
