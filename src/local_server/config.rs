//! 本地 Server 配置模块
//!
//! 端口、监听地址、根目录和入口页面。支持从配置文件读取，命令行参数可覆盖。

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use crate::error::ServerError;

/// 默认端口号
pub const DEFAULT_PORT: u16 = 8443;

/// 默认入口页面
pub const DEFAULT_LANDING_PAGE: &str = "mobile-wallet.html";

/// 配置文件名
const CONFIG_FILENAME: &str = "settings.yaml";

/// 本地 Server 配置
///
/// 监听开始后不可变，按引用传给路由。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalServerConfig {
    /// 监听端口，0 表示由系统分配
    #[serde(default = "default_port")]
    pub port: u16,
    /// 监听地址
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,
    /// 静态文件根目录
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// 访问 URL 中展示的入口页面
    #[serde(default = "default_landing_page")]
    pub landing_page: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_landing_page() -> String {
    DEFAULT_LANDING_PAGE.to_string()
}

impl Default for LocalServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_address: default_bind_address(),
            root: default_root(),
            landing_page: default_landing_page(),
        }
    }
}

impl LocalServerConfig {
    /// 从配置目录加载配置
    ///
    /// # Arguments
    /// * `config_dir` - 配置目录路径
    ///
    /// # Returns
    /// 配置对象，如果文件不存在或无法解析则返回默认配置
    pub fn load(config_dir: &Path) -> Self {
        let config_path = Self::get_config_path(config_dir);

        if !config_path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&config_path) {
            Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed {}: {}", config_path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// 获取配置文件的完整路径
    pub fn get_config_path(config_dir: &Path) -> PathBuf {
        config_dir.join(CONFIG_FILENAME)
    }

    /// 验证端口是否有效
    ///
    /// 0 (系统分配) 或 1024-65535
    pub fn validate_port(port: u16) -> Result<(), String> {
        if port != 0 && port < 1024 {
            return Err("Port must be >= 1024 (non-privileged ports)".to_string());
        }
        Ok(())
    }

    /// 启动前的整体校验
    pub fn validate(&self) -> Result<(), ServerError> {
        Self::validate_port(self.port).map_err(ServerError::InvalidConfig)?;

        if !self.root.is_dir() {
            return Err(ServerError::InvalidConfig(format!(
                "root {} is not a directory",
                self.root.display()
            )));
        }

        if self.landing_page.is_empty() {
            return Err(ServerError::InvalidConfig(
                "landing page must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// 入口页面在根目录下的路径
    pub fn landing_page_path(&self) -> PathBuf {
        self.root.join(&self.landing_page)
    }
}
