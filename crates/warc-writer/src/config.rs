//! Configuration for the WARC writer

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Compression applied to WARC output files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionMode {
    /// Plain `.warc` output
    None,
    /// One gzip member per record, `.warc.gz` output
    Gzip,
}

impl CompressionMode {
    /// File extension (without leading dot) for this mode
    pub const fn extension(self) -> &'static str {
        match self {
            Self::None => "warc",
            Self::Gzip => "warc.gz",
        }
    }
}

/// Configuration for the WARC writer
///
/// This is a read-only parameter bundle; the writer never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarcConfig {
    /// Base path for output files. `None` disables archiving.
    pub base_path: Option<PathBuf>,

    /// Maximum size of one output file in bytes (0 = never rotate by size)
    pub max_size: u64,

    /// Gzip-compress output files
    pub compression: bool,

    /// Directory for scratch files. `None` disables buffering.
    pub temp_dir: Option<PathBuf>,

    /// Whether the crawl honours robots.txt
    pub use_robots: bool,

    /// Software name written to the warcinfo record
    pub software_name: String,

    /// Software version written to the warcinfo record
    pub software_version: String,

    /// Full argument string of the capture session
    pub arguments: String,
}

impl Default for WarcConfig {
    fn default() -> Self {
        Self {
            base_path: None,
            max_size: 0,
            compression: false,
            temp_dir: None,
            use_robots: true,
            software_name: env!("CARGO_PKG_NAME").to_string(),
            software_version: crate::VERSION.to_string(),
            arguments: String::new(),
        }
    }
}

impl WarcConfig {
    /// Create a new configuration writing to the specified base path
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: Some(base_path.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    /// Configuration with archiving disabled
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Set the base path for output files
    #[must_use]
    pub fn with_base_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.base_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the maximum file size (0 disables rotation)
    #[must_use]
    pub const fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Enable or disable gzip compression
    #[must_use]
    pub const fn with_compression(mut self, enable: bool) -> Self {
        self.compression = enable;
        self
    }

    /// Set the scratch directory
    #[must_use]
    pub fn with_temp_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.temp_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Record whether robots.txt is honoured
    #[must_use]
    pub const fn with_robots(mut self, use_robots: bool) -> Self {
        self.use_robots = use_robots;
        self
    }

    /// Set the software identity written to warcinfo records
    #[must_use]
    pub fn with_software(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.software_name = name.into();
        self.software_version = version.into();
        self
    }

    /// Set the session argument string
    #[must_use]
    pub fn with_arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = arguments.into();
        self
    }

    /// Archiving is enabled when a base path is configured
    pub const fn is_enabled(&self) -> bool {
        self.base_path.is_some()
    }

    /// Size-based rotation is enabled when a maximum size is configured
    pub const fn rotation_enabled(&self) -> bool {
        self.max_size > 0
    }

    /// Compression mode derived from the compression flag
    pub const fn compression_mode(&self) -> CompressionMode {
        if self.compression {
            CompressionMode::Gzip
        } else {
            CompressionMode::None
        }
    }

    /// Output path for the file with the given serial number.
    ///
    /// The serial suffix is present whenever rotation is enabled, even for
    /// the first file. Returns `None` when archiving is disabled.
    pub fn file_name_for(&self, serial: u32) -> Option<PathBuf> {
        let base = self.base_path.as_ref()?;
        let extension = self.compression_mode().extension();

        let mut name = base.as_os_str().to_owned();
        if self.rotation_enabled() {
            name.push(format!("-{serial:05}"));
        }
        name.push(".");
        name.push(extension);
        Some(PathBuf::from(name))
    }

    /// Value of the `robots` field in the warcinfo record
    pub const fn robots_mode(&self) -> &'static str {
        if self.use_robots { "classic" } else { "off" }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disabled() {
        let config = WarcConfig::default();
        assert!(!config.is_enabled());
        assert!(!config.rotation_enabled());
        assert_eq!(config.file_name_for(0), None);
    }

    #[test]
    fn test_file_name_without_rotation() {
        let config = WarcConfig::new("crawl");
        assert_eq!(config.file_name_for(0), Some(PathBuf::from("crawl.warc")));

        let config = config.with_compression(true);
        assert_eq!(config.file_name_for(3), Some(PathBuf::from("crawl.warc.gz")));
    }

    #[test]
    fn test_file_name_with_rotation() {
        let config = WarcConfig::new("out/crawl").with_max_size(1000);
        assert_eq!(
            config.file_name_for(0),
            Some(PathBuf::from("out/crawl-00000.warc"))
        );

        let config = config.with_compression(true);
        assert_eq!(
            config.file_name_for(42),
            Some(PathBuf::from("out/crawl-00042.warc.gz"))
        );
    }

    #[test]
    fn test_with_base_path_enables_archiving() {
        let config = WarcConfig::disabled().with_base_path("crawl");
        assert!(config.is_enabled());
        assert_eq!(config.file_name_for(0), Some(PathBuf::from("crawl.warc")));

        let config = WarcConfig::new("first").with_base_path("second");
        assert_eq!(config.file_name_for(0), Some(PathBuf::from("second.warc")));
    }

    #[test]
    fn test_robots_mode() {
        assert_eq!(WarcConfig::default().robots_mode(), "classic");
        assert_eq!(WarcConfig::default().with_robots(false).robots_mode(), "off");
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = WarcConfig::new("crawl")
            .with_max_size(1 << 30)
            .with_compression(true)
            .with_temp_dir("/tmp")
            .with_arguments("-r https://example.com/");

        let json = serde_json::to_string(&config).expect("serialize config");
        let parsed: WarcConfig = serde_json::from_str(&json).expect("deserialize config");

        assert_eq!(parsed.base_path, config.base_path);
        assert_eq!(parsed.max_size, 1 << 30);
        assert!(parsed.compression);
        assert_eq!(parsed.arguments, "-r https://example.com/");
    }
}
