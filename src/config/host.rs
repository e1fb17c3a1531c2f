use super::{ConfigError, ConfigResult};
use crate::impl_default;
use serde::{Deserialize, Serialize};

/// 参考宿主（`MiniShell`）配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// 宿主报告的版本字符串，写入版本变量
    pub version: String,

    /// 函数调用的最大嵌套深度
    pub max_call_depth: usize,
}

impl_default!(HostConfig {
    version: "5.2.21(1)-release".to_string(),
    max_call_depth: 256,
});

impl HostConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.version.is_empty() {
            return Err(ConfigError::ValidationError(
                "Host version must not be empty".to_string(),
            ));
        }
        if self.max_call_depth == 0 {
            return Err(ConfigError::ValidationError(
                "Invalid max call depth".to_string(),
            ));
        }
        Ok(())
    }
}
