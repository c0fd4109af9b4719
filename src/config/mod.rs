mod env_vars;
mod uploader_config;

pub use env_vars::expand_env_vars;

pub use uploader_config::{load_config, UploaderConfig};
