//! Unified server error types
//!
//! 启动阶段的致命错误。运行期间的请求错误由静态文件服务按状态码处理，不会进入这里。

use thiserror::Error;

/// Startup-level error type
#[derive(Error, Debug)]
pub enum ServerError {
    /// 端口被占用
    #[error("port {0} is already in use")]
    PortInUse(u16),

    /// 绑定失败（端口占用以外的原因）
    #[error("failed to bind to port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// 主机名解析失败
    #[error("failed to resolve hostname: {0}")]
    HostnameResolution(String),

    /// 配置错误
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// File operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// 将 bind 产生的 io::Error 归类
    pub fn from_bind(port: u16, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::AddrInUse {
            Self::PortInUse(port)
        } else {
            Self::Bind { port, source: err }
        }
    }
}
