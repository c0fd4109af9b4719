use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    /// `%VAR%` (Windows), `${VAR}` and `$VAR` (Unix)
    static ref ENV_VAR_PATTERN: Regex =
        Regex::new(r"%([A-Za-z_][A-Za-z0-9_()]*)%|\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
            .unwrap();
}

/// Expand environment variables in an inclusion path.
///
/// Handles both Windows (`%USERPROFILE%`) and Unix (`$HOME`, `${HOME}`)
/// styles. Variables that are not set are left verbatim.
pub fn expand_env_vars(path: &str) -> String {
    ENV_VAR_PATTERN
        .replace_all(path, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();

            std::env::var(name).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}
