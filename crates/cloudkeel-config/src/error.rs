use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "Config file not found. Looked in:\n\
        - the path in CLOUDKEEL_CONFIG_PATH\n\
        - current directory: cloudkeel.local.yaml, .cloudkeel.local.yaml, cloudkeel.yaml, .cloudkeel.yaml\n\
        - ./.cloudkeel/\n\
        - ~/.config/cloudkeel/cloudkeel.yaml"
    )]
    ConfigFileNotFound,

    #[error("Invalid setting: {0}")]
    Invalid(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
