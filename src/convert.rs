//! Pure conversion functions: TOML config structs -> crate API config types.

use anyhow::{Result, bail};

use crate::config::*;

use esptrace_calendar::ClampPolicy;
use esptrace_io::{ByteOrder, ReaderConfig, UnitConversion, WriterConfig};

/// Parses a byte-order name into the corresponding enum variant.
pub fn parse_byte_order(s: &str) -> Result<ByteOrder> {
    match s.to_lowercase().as_str() {
        "big" | "be" | "big-endian" => Ok(ByteOrder::Big),
        "little" | "le" | "little-endian" => Ok(ByteOrder::Little),
        other => bail!("unknown byte order: {other:?}"),
    }
}

/// Parses a clamp policy name into the corresponding enum variant.
pub fn parse_clamp_policy(s: &str) -> Result<ClampPolicy> {
    match s.to_lowercase().as_str() {
        "legacy" => Ok(ClampPolicy::Legacy),
        "strict" => Ok(ClampPolicy::Strict),
        other => bail!("unknown clamp policy: {other:?}"),
    }
}

/// Builds a [`ReaderConfig`] from the TOML reader section.
pub fn build_reader_config(reader: &ReaderToml) -> Result<ReaderConfig> {
    let cfg = ReaderConfig::default()
        .with_record_words(reader.record_words)
        .with_clamp_policy(parse_clamp_policy(&reader.clamp)?);
    cfg.validate()?;
    Ok(cfg)
}

/// Builds a [`WriterConfig`] from the TOML writer section.
///
/// `cli_order` overrides the section's byte order; when neither is set,
/// `fallback` is used.
pub fn build_writer_config(
    writer: &WriterToml,
    cli_order: Option<&str>,
    fallback: ByteOrder,
) -> Result<WriterConfig> {
    let order = match cli_order.or(writer.byte_order.as_deref()) {
        Some(name) => parse_byte_order(name)?,
        None => fallback,
    };
    let cfg = WriterConfig::default()
        .with_byte_order(order)
        .with_record_words(writer.record_words);
    cfg.validate()?;
    Ok(cfg)
}

/// Builds a [`UnitConversion`] from the TOML dump section and CLI overrides.
pub fn build_unit_conversion(
    dump: &DumpToml,
    multiply: Option<f64>,
    add: Option<f64>,
) -> UnitConversion {
    UnitConversion::new(multiply.unwrap_or(dump.multiply), add.unwrap_or(dump.add))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_order_names() {
        assert_eq!(parse_byte_order("big").unwrap(), ByteOrder::Big);
        assert_eq!(parse_byte_order("LE").unwrap(), ByteOrder::Little);
        assert_eq!(
            parse_byte_order("little-endian").unwrap(),
            ByteOrder::Little
        );
        assert!(parse_byte_order("middle").is_err());
    }

    #[test]
    fn clamp_policy_names() {
        assert_eq!(parse_clamp_policy("Legacy").unwrap(), ClampPolicy::Legacy);
        assert_eq!(parse_clamp_policy("strict").unwrap(), ClampPolicy::Strict);
        assert!(parse_clamp_policy("lenient").is_err());
    }

    #[test]
    fn reader_config_rejects_bad_record_length() {
        let toml = ReaderToml {
            record_words: 100,
            ..ReaderToml::default()
        };
        assert!(build_reader_config(&toml).is_err());
        assert!(build_reader_config(&ReaderToml::default()).is_ok());
    }

    #[test]
    fn writer_byte_order_precedence() {
        let toml = WriterToml {
            byte_order: Some("little".to_string()),
            ..WriterToml::default()
        };
        let from_file = build_writer_config(&toml, None, ByteOrder::Big).unwrap();
        assert_eq!(from_file.byte_order(), ByteOrder::Little);

        let from_cli = build_writer_config(&toml, Some("big"), ByteOrder::Little).unwrap();
        assert_eq!(from_cli.byte_order(), ByteOrder::Big);

        let fallback =
            build_writer_config(&WriterToml::default(), None, ByteOrder::Little).unwrap();
        assert_eq!(fallback.byte_order(), ByteOrder::Little);
    }

    #[test]
    fn unit_conversion_overrides() {
        let dump = DumpToml {
            multiply: 2.0,
            add: 1.0,
        };
        assert_eq!(
            build_unit_conversion(&dump, None, None),
            UnitConversion::new(2.0, 1.0)
        );
        assert_eq!(
            build_unit_conversion(&dump, Some(3.0), None),
            UnitConversion::new(3.0, 1.0)
        );
    }
}
