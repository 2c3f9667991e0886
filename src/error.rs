//! 错误处理模块
//!
//! 定义HAProxy-Injector框架中使用的所有错误类型。

use thiserror::Error;

/// HAProxy-Injector的结果类型
pub type Result<T> = std::result::Result<T, InjectorError>;

/// 注入器错误类型
#[derive(Error, Debug)]
pub enum InjectorError {
    /// 对端地址族不受支持（仅支持IPv4合成）
    #[error("Unsupported address family for header synthesis: {addr}")]
    UnsupportedAddressFamily {
        /// 实际观察到的对端地址
        addr: String,
    },

    /// 找不到监听器的注入点
    #[error("Acceptor hook unavailable: {message}")]
    HookUnavailable {
        /// 错误消息
        message: String,
    },

    /// 处理链上已存在同名阶段
    #[error("Stage already attached: {stage}")]
    AlreadyAttached {
        /// 阶段名称
        stage: String,
    },

    /// 数据不足
    #[error("Insufficient data: need at least {0} bytes")]
    InsufficientData(usize),

    /// 配置错误
    #[error("Configuration error: {message}")]
    ConfigError {
        /// 错误消息
        message: String,
    },

    /// I/O错误
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// 超时错误
    #[error("Operation timed out after {timeout_ms}ms")]
    Timeout {
        /// 超时时间（毫秒）
        timeout_ms: u64,
    },

    /// 内部错误
    #[error("Internal error: {message}")]
    InternalError {
        /// 错误消息
        message: String,
    },
}

impl InjectorError {
    /// 创建地址族不支持错误
    pub fn unsupported_address_family<S: Into<String>>(addr: S) -> Self {
        Self::UnsupportedAddressFamily { addr: addr.into() }
    }

    /// 创建钩子不可用错误
    pub fn hook_unavailable<S: Into<String>>(message: S) -> Self {
        Self::HookUnavailable {
            message: message.into(),
        }
    }

    /// 创建重复挂载错误
    pub fn already_attached<S: Into<String>>(stage: S) -> Self {
        Self::AlreadyAttached {
            stage: stage.into(),
        }
    }

    /// 创建配置错误
    pub fn config_error<S: Into<String>>(message: S) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// 创建超时错误
    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }

    /// 创建内部错误
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// 检查是否为可恢复错误
    ///
    /// 可恢复意味着连接仍可原样放行，最坏结果只是下游自行拒绝。
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedAddressFamily { .. }
                | Self::InsufficientData(_)
                | Self::AlreadyAttached { .. }
                | Self::Timeout { .. }
        )
    }

    /// 检查是否为配置相关错误
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError { .. })
    }

    /// 获取错误代码
    pub fn error_code(&self) -> u32 {
        match self {
            Self::UnsupportedAddressFamily { .. } => 2001,
            Self::HookUnavailable { .. } => 2002,
            Self::AlreadyAttached { .. } => 2003,
            Self::InsufficientData(_) => 2004,
            Self::ConfigError { .. } => 2005,
            Self::IoError(_) => 2006,
            Self::Timeout { .. } => 2007,
            Self::InternalError { .. } => 2999,
        }
    }
}

/// 从anyhow::Error转换
impl From<anyhow::Error> for InjectorError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal_error(err.to_string())
    }
}

/// 从serde_json::Error转换
impl From<serde_json::Error> for InjectorError {
    fn from(err: serde_json::Error) -> Self {
        Self::config_error(format!("JSON error: {}", err))
    }
}
