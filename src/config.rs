use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level esptrace configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EspConfig {
    /// Reader settings.
    #[serde(default)]
    pub reader: ReaderToml,

    /// Writer settings.
    #[serde(default)]
    pub writer: WriterToml,

    /// Dump settings.
    #[serde(default)]
    pub dump: DumpToml,
}

impl EspConfig {
    /// Loads the file at `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let toml_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        toml::from_str(&toml_str).context("failed to parse TOML config")
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReaderToml {
    #[serde(default = "default_record_words")]
    pub record_words: usize,
    #[serde(default = "default_clamp")]
    pub clamp: String,
}

impl Default for ReaderToml {
    fn default() -> Self {
        Self {
            record_words: default_record_words(),
            clamp: default_clamp(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriterToml {
    #[serde(default)]
    pub byte_order: Option<String>,
    #[serde(default = "default_record_words")]
    pub record_words: usize,
}

impl Default for WriterToml {
    fn default() -> Self {
        Self {
            byte_order: None,
            record_words: default_record_words(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DumpToml {
    #[serde(default = "default_multiply")]
    pub multiply: f64,
    #[serde(default)]
    pub add: f64,
}

impl Default for DumpToml {
    fn default() -> Self {
        Self {
            multiply: default_multiply(),
            add: 0.0,
        }
    }
}

fn default_record_words() -> usize {
    124
}
fn default_clamp() -> String {
    "legacy".to_string()
}
fn default_multiply() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: EspConfig = toml::from_str("").unwrap();
        assert_eq!(config.reader.record_words, 124);
        assert_eq!(config.reader.clamp, "legacy");
        assert!(config.writer.byte_order.is_none());
        assert_eq!(config.dump.multiply, 1.0);
        assert_eq!(config.dump.add, 0.0);
    }

    #[test]
    fn sections_parse() {
        let config: EspConfig = toml::from_str(
            r#"
            [reader]
            record_words = 248
            clamp = "strict"

            [writer]
            byte_order = "little"

            [dump]
            multiply = 35.3147
            "#,
        )
        .unwrap();
        assert_eq!(config.reader.record_words, 248);
        assert_eq!(config.reader.clamp, "strict");
        assert_eq!(config.writer.byte_order.as_deref(), Some("little"));
        assert_eq!(config.writer.record_words, 124);
        assert_eq!(config.dump.multiply, 35.3147);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<EspConfig>("[reader]\nrecords = 3\n").is_err());
        assert!(toml::from_str::<EspConfig>("[output]\n").is_err());
    }

    #[test]
    fn load_without_path_is_default() {
        let config = EspConfig::load(None).unwrap();
        assert_eq!(config.writer.record_words, 124);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("esptrace.toml");
        std::fs::write(&path, "[dump]\nadd = -32.0\n").unwrap();
        let config = EspConfig::load(Some(&path)).unwrap();
        assert_eq!(config.dump.add, -32.0);
    }

    #[test]
    fn load_missing_file_has_context() {
        let err = EspConfig::load(Some(Path::new("/nonexistent/esptrace.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read config"));
    }
}
