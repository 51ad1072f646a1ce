//! Runtime configuration for the content checker.
use std::env;
use std::path::PathBuf;

/// Configuration for one `content-check` run.
#[derive(Clone, Debug)]
pub struct CheckConfig {
    pub data_dir: PathBuf,
    pub dump: bool,
    pub verify_wire: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            dump: false,
            verify_wire: true,
        }
    }
}

impl CheckConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `CONTENT_DATA_DIR` - Directory holding `content.toml` (default: `data`)
    /// - `CONTENT_DUMP` - Print every re-serialized recipe to stdout (default: false)
    /// - `CONTENT_VERIFY_WIRE` - Round-trip the binary form too (default: true)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("CONTENT_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(dump) = read_env::<bool>("CONTENT_DUMP") {
            config.dump = dump;
        } else if env::var("CONTENT_DUMP").is_ok() {
            // A bare `CONTENT_DUMP=` counts as enabled
            config.dump = true;
        }

        if let Some(verify) = read_env::<bool>("CONTENT_VERIFY_WIRE") {
            config.verify_wire = verify;
        }

        config
    }

    /// Applies command line arguments; the first one replaces the data directory.
    pub fn with_args(mut self, mut args: impl Iterator<Item = String>) -> Self {
        if let Some(dir) = args.next() {
            self.data_dir = PathBuf::from(dir);
        }
        self
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_argument_overrides_data_dir() {
        let config = CheckConfig::default().with_args(["packs/base".to_owned()].into_iter());
        assert_eq!(config.data_dir, PathBuf::from("packs/base"));
        assert!(config.verify_wire);

        let config = CheckConfig::default().with_args(std::iter::empty());
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }
}
