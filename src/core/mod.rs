//! 核心模块
//!
//! - `error` - 错误类型定义
//! - `status` - shell 退出码约定
//! - `macros` - 通用宏

pub mod error;
pub mod status;
#[macro_use]
pub mod macros;

pub use error::{BridgeError, BridgeResult};
pub use status::{ExitStatus, EXECUTION_FAILURE, EXECUTION_SUCCESS, EX_NOEXEC, EX_NOTFOUND};
