/// Errors that can occur while loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Failed to open the configuration file.
    #[error("Failed to open configuration file: {0}")]
    ConfigOpen(#[from] std::io::Error),
    /// Failed to parse the configuration file.
    #[error("Failed to parse configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
