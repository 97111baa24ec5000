//! # Filter Configuration Files
//!
//! Filters loaded from TOML the way the daemon loads them at startup.

#[cfg(test)]
mod tests {
    use std::io::Write;

    use dlt_daemon::DaemonConfig;
    use dlt_filter::{FilterError, MessageFilter, TomlFilterConfig};
    use dlt_types::ConnectionType;
    use tempfile::NamedTempFile;

    fn write_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn load(contents: &str) -> Result<MessageFilter, FilterError> {
        let file = write_file(contents);
        let provider = TomlFilterConfig::load(file.path())?;
        MessageFilter::from_provider(&provider)
    }

    #[test]
    fn test_gap_between_segments_is_closed() {
        let filter = load(
            r#"
[general]
name = "Gapped"
default_level = 0

[[filter]]
name = "Low"
level = 30

[[filter]]
name = "High"
level = 39
clients = "TCP"
"#,
        )
        .unwrap();

        let ranges: Vec<_> = filter
            .chain()
            .iter()
            .map(|s| (s.name.as_str(), s.level_min, s.level_max))
            .collect();
        assert_eq!(ranges, vec![("Low", 0, 30), ("High", 31, 100)]);
        filter.chain().validate().unwrap();
    }

    #[test]
    fn test_config_without_filters_falls_back_to_restrictive() {
        let mut filter = load("[general]\nname = \"Empty\"\ndefault_level = 0\n").unwrap();
        assert_eq!(filter.chain().len(), 1);
        filter.change_level(100).unwrap();
        assert!(!filter.connection_allowed(ConnectionType::ClientMsgTcp));
        assert!(filter.connection_allowed(ConnectionType::ControlMsg));
    }

    #[test]
    fn test_unknown_injection_fails_whole_config() {
        let err = load(
            r#"
[general]
name = "Broken"
default_level = 0

[[filter]]
name = "Only"
level = 100
injections = "Missing"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, FilterError::UnknownInjection { .. }));
    }

    #[test]
    fn test_default_level_above_max_is_rejected() {
        let err = load("[general]\nname = \"Bad\"\ndefault_level = 101\n").unwrap_err();
        assert!(matches!(err, FilterError::LevelOutOfRange { .. }));
    }

    #[test]
    fn test_daemon_config_names_filter_file() {
        let filter_file = write_file(
            "[general]\nname = \"Field\"\ndefault_level = 60\n[[filter]]\nname = \"All\"\nlevel = 100\nclients = \"TCP,Serial\"\n",
        );
        let daemon_file = write_file(&format!(
            "[daemon]\nfilter_config = {:?}\n",
            filter_file.path().display().to_string()
        ));

        let config = DaemonConfig::load(daemon_file.path()).unwrap();
        let filter = config.load_filter().unwrap();
        assert_eq!(filter.name(), "Field");
        assert!(filter.connection_allowed(ConnectionType::ClientMsgSerial));
        assert!(!filter.connection_allowed(ConnectionType::OfflineTrace));
    }
}
