use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use idx_core::document::LengthUnit;
use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub write: WriteConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 自动发现配置文件：优先读取环境变量 `IDX_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("IDX_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.build.precision > MAX_DECIMALS {
            return Err(ConfigError::Invalid {
                field: "build.precision",
                message: format!("精度 {} 超过上限 {MAX_DECIMALS}", self.build.precision),
            });
        }
        if self.write.number_formatting.decimal_places > MAX_DECIMALS {
            return Err(ConfigError::Invalid {
                field: "write.number_formatting.decimal_places",
                message: format!(
                    "小数位数 {} 超过上限 {MAX_DECIMALS}",
                    self.write.number_formatting.decimal_places
                ),
            });
        }
        if self.build.system_scope.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "build.system_scope",
                message: "属性作用域不能为空".to_string(),
            });
        }
        Ok(())
    }
}

/// 坐标取整与数字输出允许的最大小数位数。
pub const MAX_DECIMALS: u32 = 12;

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 写入文档头的创建者信息。
#[derive(Debug, Clone, Deserialize)]
pub struct HeaderInfo {
    #[serde(default)]
    pub description: String,
    #[serde(default = "HeaderInfo::default_creator_name")]
    pub creator_name: String,
    #[serde(default)]
    pub creator_company: String,
    #[serde(default = "HeaderInfo::default_creator_system")]
    pub creator_system: String,
}

impl HeaderInfo {
    fn default_creator_name() -> String {
        "idx-export".to_string()
    }

    fn default_creator_system() -> String {
        format!("idx-export {}", env!("CARGO_PKG_VERSION"))
    }
}

impl Default for HeaderInfo {
    fn default() -> Self {
        Self {
            description: String::new(),
            creator_name: Self::default_creator_name(),
            creator_company: String::new(),
            creator_system: Self::default_creator_system(),
        }
    }
}

/// 构建配置。
///
/// `timestamp` 为空时构建器使用 Unix 纪元，保证相同输入得到相同输出；
/// 命令行程序会在运行时填入当前时间。TOML 中需写成带引号的 RFC 3339 字符串。
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "BuildConfig::default_use_simplified")]
    pub use_simplified: bool,
    #[serde(default)]
    pub unit: LengthUnit,
    #[serde(default = "BuildConfig::default_precision")]
    pub precision: u32,
    #[serde(default)]
    pub include_non_collaborative: bool,
    #[serde(default)]
    pub include_history: bool,
    #[serde(default = "BuildConfig::default_system_scope")]
    pub system_scope: String,
    #[serde(default)]
    pub header: HeaderInfo,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl BuildConfig {
    fn default_use_simplified() -> bool {
        true
    }

    fn default_precision() -> u32 {
        6
    }

    fn default_system_scope() -> String {
        "ECAD".to_string()
    }

    /// 坐标去重与取整使用的容差。
    pub fn tolerance(&self) -> f64 {
        10f64.powi(-(self.precision as i32))
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            use_simplified: Self::default_use_simplified(),
            unit: LengthUnit::default(),
            precision: Self::default_precision(),
            include_non_collaborative: false,
            include_history: false,
            system_scope: Self::default_system_scope(),
            header: HeaderInfo::default(),
            timestamp: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NumberFormatting {
    #[serde(default = "NumberFormatting::default_decimal_places")]
    pub decimal_places: u32,
    #[serde(default = "NumberFormatting::default_remove_trailing_zeros")]
    pub remove_trailing_zeros: bool,
}

impl NumberFormatting {
    fn default_decimal_places() -> u32 {
        6
    }

    fn default_remove_trailing_zeros() -> bool {
        true
    }
}

impl Default for NumberFormatting {
    fn default() -> Self {
        Self {
            decimal_places: Self::default_decimal_places(),
            remove_trailing_zeros: Self::default_remove_trailing_zeros(),
        }
    }
}

/// 序列化配置。`extra_namespaces` 按前缀排序输出。
#[derive(Debug, Clone, Deserialize)]
pub struct WriteConfig {
    #[serde(default)]
    pub enable_comments: bool,
    #[serde(default = "WriteConfig::default_pretty_print")]
    pub pretty_print: bool,
    #[serde(default)]
    pub number_formatting: NumberFormatting,
    #[serde(default)]
    pub extra_namespaces: BTreeMap<String, String>,
}

impl WriteConfig {
    fn default_pretty_print() -> bool {
        true
    }
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            enable_comments: false,
            pretty_print: Self::default_pretty_print(),
            number_formatting: NumberFormatting::default(),
            extra_namespaces: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputVariant {
    Traditional,
    #[default]
    Simplified,
    Both,
}

impl FromStr for OutputVariant {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "traditional" => Ok(OutputVariant::Traditional),
            "simplified" => Ok(OutputVariant::Simplified),
            "both" => Ok(OutputVariant::Both),
            other => Err(format!("未知的输出形式: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub variant: OutputVariant,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
    #[error("配置项 {field} 无效: {message}")]
    Invalid { field: &'static str, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.build.use_simplified);
        assert_eq!(cfg.build.unit, LengthUnit::Millimeter);
        assert_eq!(cfg.build.precision, 6);
        assert!(!cfg.build.include_non_collaborative);
        assert!(!cfg.build.include_history);
        assert_eq!(cfg.build.system_scope, "ECAD");
        assert!(cfg.build.timestamp.is_none());
        assert!(!cfg.write.enable_comments);
        assert!(cfg.write.pretty_print);
        assert_eq!(cfg.write.number_formatting.decimal_places, 6);
        assert!(cfg.write.number_formatting.remove_trailing_zeros);
        assert!(cfg.write.extra_namespaces.is_empty());
        assert_eq!(cfg.output.variant, OutputVariant::Simplified);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn load_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r#"
            [logging]
            level = "debug"

            [build]
            use_simplified = false
            unit = "mil"
            precision = 4
            system_scope = "ACME"
            timestamp = "2024-05-01T12:00:00Z"

            [build.header]
            creator_name = "Jane"
            creator_company = "ACME"

            [write]
            enable_comments = true
            pretty_print = false

            [write.number_formatting]
            decimal_places = 3
            remove_trailing_zeros = false

            [write.extra_namespaces]
            acme = "urn:acme:ecad"

            [output]
            variant = "both"
            "#
        )
        .unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert!(!cfg.build.use_simplified);
        assert_eq!(cfg.build.unit, LengthUnit::Mil);
        assert_eq!(cfg.build.precision, 4);
        assert_eq!(cfg.build.system_scope, "ACME");
        assert_eq!(cfg.build.header.creator_name, "Jane");
        assert_eq!(
            cfg.build.timestamp.map(|t| t.to_rfc3339()),
            Some("2024-05-01T12:00:00+00:00".to_string())
        );
        assert!(cfg.write.enable_comments);
        assert!(!cfg.write.pretty_print);
        assert_eq!(cfg.write.number_formatting.decimal_places, 3);
        assert_eq!(
            cfg.write.extra_namespaces.get("acme").map(String::as_str),
            Some("urn:acme:ecad")
        );
        assert_eq!(cfg.output.variant, OutputVariant::Both);
        assert!((cfg.build.tolerance() - 1e-4).abs() < 1e-12);
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[build]\nprecision = \"six\"").unwrap();
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn excessive_precision_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[build]\nprecision = 40").unwrap();
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "build.precision",
                ..
            }
        ));
    }

    #[test]
    fn missing_file_reports_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = AppConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn output_variant_parses_case_insensitively() {
        assert_eq!("Both".parse::<OutputVariant>(), Ok(OutputVariant::Both));
        assert!("fancy".parse::<OutputVariant>().is_err());
    }
}
