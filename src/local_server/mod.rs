//! 本地 HTTP Server 模块
//!
//! 在局域网内提供静态文件服务，供手机浏览器加载钱包页面。
//! 所有响应附加 CORS 和摄像头权限头。

mod config;
mod handlers;
mod server;

pub use config::{LocalServerConfig, DEFAULT_LANDING_PAGE, DEFAULT_PORT};
pub use handlers::{standard_headers, STANDARD_HEADERS};
pub use server::{LocalServer, ServerHandle};
