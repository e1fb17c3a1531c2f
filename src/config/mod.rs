/// 统一配置系统
///
/// 提供TOML/JSON配置文件、环境变量覆盖和验证
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod host;
pub mod logging;

pub use host::HostConfig;
pub use logging::{init_logging, LogLevel, LoggingConfig};

use crate::impl_default;

/// 配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "SHELL_BRIDGE_CONFIG";

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 桥接主配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// shell 侧内建命令名（注册函数的函数体也通过它回调）
    pub builtin_name: String,

    /// 脚本侧命名空间（全局对象名）
    pub namespace: String,

    /// 用于检测宿主版本的 shell 变量
    pub version_variable: String,

    /// 参考宿主配置
    #[serde(default)]
    pub host: HostConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl_default!(BridgeConfig {
    builtin_name: "bridge".to_string(),
    namespace: "bash".to_string(),
    version_variable: "BASH_VERSION".to_string(),
    host: HostConfig::default(),
    logging: LoggingConfig::default(),
});

impl BridgeConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 按扩展名加载配置文件
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("SHELL_BRIDGE_BUILTIN") {
            self.builtin_name = val;
        }
        if let Ok(val) = env::var("SHELL_BRIDGE_NAMESPACE") {
            self.namespace = val;
        }
        if let Ok(val) = env::var("SHELL_BRIDGE_VERSION_VARIABLE") {
            self.version_variable = val;
        }
        if let Ok(val) = env::var("SHELL_BRIDGE_HOST_VERSION") {
            self.host.version = val;
        }
        if let Ok(val) = env::var("SHELL_BRIDGE_LOG_LEVEL") {
            if let Ok(level) = val.parse() {
                self.logging.level = level;
            }
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if !is_shell_name(&self.builtin_name) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid builtin name: {:?}",
                self.builtin_name
            )));
        }
        if !is_identifier(&self.namespace) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid script namespace: {:?}",
                self.namespace
            )));
        }
        if !is_identifier(&self.version_variable) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid version variable: {:?}",
                self.version_variable
            )));
        }
        self.host.validate()?;
        Ok(())
    }

    /// 自动查找并加载配置文件
    ///
    /// 按以下顺序查找：
    /// 1. `$SHELL_BRIDGE_CONFIG`
    /// 2. ./shell-bridge.toml
    /// 3. ./shell-bridge.json
    /// 4. 使用默认配置
    ///
    /// 找到的配置都会再应用环境变量覆盖。
    pub fn load_or_default() -> ConfigResult<Self> {
        let mut config = if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            let config = Self::from_file(&path)?;
            tracing::debug!(target: "bridge", "Loaded config from {:?}", path);
            config
        } else if let Ok(config) = Self::from_toml_file("shell-bridge.toml") {
            tracing::debug!(target: "bridge", "Loaded config from shell-bridge.toml");
            config
        } else if let Ok(config) = Self::from_json_file("shell-bridge.json") {
            tracing::debug!(target: "bridge", "Loaded config from shell-bridge.json");
            config
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

/// Shell 函数/命令名：非空且不含空白或 shell 元字符
fn is_shell_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || "|&;<>()$`\\\"'=".contains(c))
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.builtin_name, "bridge");
        assert_eq!(config.namespace, "bash");
        assert_eq!(config.version_variable, "BASH_VERSION");
    }

    #[test]
    fn test_toml_serialization() {
        let config = BridgeConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: BridgeConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.builtin_name, parsed.builtin_name);
        assert_eq!(config.host.version, parsed.host.version);
    }

    #[test]
    fn test_json_serialization() {
        let config = BridgeConfig::default();
        let json_str = serde_json::to_string(&config).unwrap();
        let parsed = BridgeConfig::from_json_str(&json_str).unwrap();
        assert_eq!(config.namespace, parsed.namespace);
        assert_eq!(config.logging.level, parsed.logging.level);
    }

    #[test]
    fn test_partial_toml_uses_section_defaults() {
        let config = BridgeConfig::from_toml_str(
            r#"
            builtin_name = "jsbash"
            namespace = "shell"
            version_variable = "BASH_VERSION"
            "#,
        )
        .unwrap();
        assert_eq!(config.builtin_name, "jsbash");
        assert_eq!(config.host, HostConfig::default());
    }

    #[test]
    fn test_validation_rejects_bad_names() {
        let mut config = BridgeConfig::default();
        config.builtin_name = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        let mut config = BridgeConfig::default();
        config.namespace = "not valid".to_string();
        assert!(config.validate().is_err());

        let mut config = BridgeConfig::default();
        config.builtin_name = "a;b".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shell-bridge.toml");
        let mut config = BridgeConfig::default();
        config.namespace = "sh".to_string();
        config.save_toml(&path).unwrap();

        let loaded = BridgeConfig::from_file(&path).unwrap();
        assert_eq!(loaded.namespace, "sh");
    }

    #[test]
    fn test_identifier() {
        assert!(is_identifier("BASH_VERSION"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier(""));
    }
}
