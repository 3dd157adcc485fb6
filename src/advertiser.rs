//! 局域网地址发现与访问 URL 输出
//!
//! 主地址来自主机名解析，失败即为致命错误。
//! 其他网卡地址是尽力而为：任何失败都只会让 "Alternative URLs" 段落消失。

use std::fmt::{self, Display, Write as _};
use std::io;
use std::net::{IpAddr, Ipv4Addr};

use thiserror::Error;

use crate::error::ServerError;

/// 网卡枚举错误，只在本模块内部消化
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("interface enumeration failed: {0}")]
    Enumerate(#[from] io::Error),

    #[error("interface enumeration unavailable: {0}")]
    Unavailable(String),
}

/// 枚举本机 IPv4 地址的能力
pub trait InterfaceEnumerator: Send + Sync {
    fn ipv4_addrs(&self) -> Result<Vec<Ipv4Addr>, DiscoveryError>;
}

/// 基于 if-addrs 的跨平台实现
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInterfaces;

impl InterfaceEnumerator for SystemInterfaces {
    fn ipv4_addrs(&self) -> Result<Vec<Ipv4Addr>, DiscoveryError> {
        let addrs = if_addrs::get_if_addrs()?
            .into_iter()
            .filter(|iface| !iface.is_loopback())
            .filter_map(|iface| match iface.ip() {
                IpAddr::V4(ip) => Some(ip),
                IpAddr::V6(_) => None,
            })
            .collect();
        Ok(addrs)
    }
}

/// 获取本机主机名
pub fn local_hostname() -> Result<String, ServerError> {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .map_err(|e| ServerError::HostnameResolution(e.to_string()))
}

/// 将主机名解析为第一个 IPv4 地址
pub async fn resolve_ipv4(host: &str) -> Result<Ipv4Addr, ServerError> {
    let addrs = tokio::net::lookup_host((host, 0))
        .await
        .map_err(|e| ServerError::HostnameResolution(format!("{}: {}", host, e)))?;

    addrs
        .filter_map(|addr| match addr.ip() {
            IpAddr::V4(ip) => Some(ip),
            IpAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| ServerError::HostnameResolution(format!("no IPv4 address for {}", host)))
}

/// 192.168.0.0/16
pub fn is_private_lan(ip: &Ipv4Addr) -> bool {
    let octets = ip.octets();
    octets[0] == 192 && octets[1] == 168
}

/// 收集备用地址：仅 192.168.x.x，去掉主地址和重复项，保持枚举顺序
pub fn alternative_addrs(
    interfaces: &dyn InterfaceEnumerator,
    primary: Ipv4Addr,
) -> Vec<Ipv4Addr> {
    let addrs = match interfaces.ipv4_addrs() {
        Ok(addrs) => addrs,
        Err(e) => {
            tracing::debug!("Skipping alternative URLs: {}", e);
            return Vec::new();
        }
    };

    let mut alternatives = Vec::new();
    for ip in addrs {
        if is_private_lan(&ip) && ip != primary && !alternatives.contains(&ip) {
            alternatives.push(ip);
        }
    }
    alternatives
}

/// 启动时展示的访问地址，仅供参考，不保证可达
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessUrls {
    pub port: u16,
    pub page: String,
    pub primary: Ipv4Addr,
    pub alternatives: Vec<Ipv4Addr>,
}

impl AccessUrls {
    pub fn url_for(&self, host: impl Display) -> String {
        format!("http://{}:{}/{}", host, self.port, self.encoded_page())
    }

    /// 按路径段做百分号编码，保留 `/`
    fn encoded_page(&self) -> String {
        self.page
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn primary_url(&self) -> String {
        self.url_for(self.primary)
    }

    pub fn localhost_url(&self) -> String {
        self.url_for("localhost")
    }

    pub fn alternative_urls(&self) -> Vec<String> {
        self.alternatives.iter().map(|ip| self.url_for(ip)).collect()
    }

    /// 启动横幅，输出到 stdout
    pub fn render_banner(&self) -> String {
        let mut out = String::new();
        // String 的 fmt::Write 不会失败
        let _ = self.write_banner(&mut out);
        out
    }

    fn write_banner(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "📱 Mobile Wallet Server Starting...")?;
        writeln!(out, "🌐 Server running on port {} (plain HTTP)", self.port)?;

        writeln!(out)?;
        writeln!(out, "📱 Access from your phone:")?;
        writeln!(out, "   {}", self.primary_url())?;
        writeln!(out, "   {}", self.localhost_url())?;

        let alternatives = self.alternative_urls();
        if !alternatives.is_empty() {
            writeln!(out)?;
            writeln!(out, "🔗 Alternative URLs:")?;
            for url in alternatives {
                writeln!(out, "   {}", url)?;
            }
        }

        writeln!(out)?;
        writeln!(out, "💡 Instructions:")?;
        writeln!(out, "   1. Connect your phone to the same WiFi network")?;
        writeln!(out, "   2. Open browser on phone")?;
        writeln!(out, "   3. Navigate to one of the URLs above")?;
        writeln!(out, "   4. Camera should work properly!")?;

        writeln!(out)?;
        writeln!(out, "🛑 Press Ctrl+C to stop server")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedInterfaces(Vec<Ipv4Addr>);

    impl InterfaceEnumerator for FixedInterfaces {
        fn ipv4_addrs(&self) -> Result<Vec<Ipv4Addr>, DiscoveryError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenInterfaces;

    impl InterfaceEnumerator for BrokenInterfaces {
        fn ipv4_addrs(&self) -> Result<Vec<Ipv4Addr>, DiscoveryError> {
            Err(DiscoveryError::Unavailable("no interfaces".to_string()))
        }
    }

    fn urls(alternatives: Vec<Ipv4Addr>) -> AccessUrls {
        AccessUrls {
            port: 8443,
            page: "mobile-wallet.html".to_string(),
            primary: Ipv4Addr::new(192, 168, 1, 20),
            alternatives,
        }
    }

    #[test]
    fn test_is_private_lan() {
        assert!(is_private_lan(&Ipv4Addr::new(192, 168, 0, 1)));
        assert!(is_private_lan(&Ipv4Addr::new(192, 168, 255, 254)));
        assert!(!is_private_lan(&Ipv4Addr::new(10, 0, 0, 5)));
        assert!(!is_private_lan(&Ipv4Addr::new(172, 16, 0, 1)));
        assert!(!is_private_lan(&Ipv4Addr::new(192, 169, 1, 1)));
    }

    #[test]
    fn test_alternative_addrs_filters_and_dedupes() {
        let primary = Ipv4Addr::new(192, 168, 1, 20);
        let interfaces = FixedInterfaces(vec![
            Ipv4Addr::new(10, 0, 0, 5),
            Ipv4Addr::new(192, 168, 56, 1),
            primary,
            Ipv4Addr::new(192, 168, 56, 1),
            Ipv4Addr::new(192, 168, 2, 7),
        ]);

        let alternatives = alternative_addrs(&interfaces, primary);
        assert_eq!(
            alternatives,
            vec![Ipv4Addr::new(192, 168, 56, 1), Ipv4Addr::new(192, 168, 2, 7)]
        );
    }

    #[test]
    fn test_alternative_addrs_swallows_failure() {
        let alternatives = alternative_addrs(&BrokenInterfaces, Ipv4Addr::new(192, 168, 1, 20));
        assert!(alternatives.is_empty());
    }

    #[test]
    fn test_system_interfaces_never_report_loopback() {
        if let Ok(addrs) = SystemInterfaces.ipv4_addrs() {
            assert!(addrs.iter().all(|ip| !ip.is_loopback()));
        }
    }

    #[test]
    fn test_urls() {
        let urls = urls(vec![Ipv4Addr::new(192, 168, 56, 1)]);
        assert_eq!(urls.primary_url(), "http://192.168.1.20:8443/mobile-wallet.html");
        assert_eq!(urls.localhost_url(), "http://localhost:8443/mobile-wallet.html");
        assert_eq!(
            urls.alternative_urls(),
            vec!["http://192.168.56.1:8443/mobile-wallet.html".to_string()]
        );
    }

    #[test]
    fn test_urls_encode_page_name() {
        let mut urls = urls(Vec::new());
        urls.page = "wallet pages/scan #1.html".to_string();
        assert_eq!(
            urls.localhost_url(),
            "http://localhost:8443/wallet%20pages/scan%20%231.html"
        );
    }

    #[test]
    fn test_banner_with_alternatives() {
        let banner = urls(vec![Ipv4Addr::new(192, 168, 56, 1)]).render_banner();
        assert!(banner.contains("Server running on port 8443"));
        assert!(banner.contains("   http://192.168.1.20:8443/mobile-wallet.html"));
        assert!(banner.contains("   http://localhost:8443/mobile-wallet.html"));
        assert!(banner.contains("Alternative URLs:"));
        assert!(banner.contains("   http://192.168.56.1:8443/mobile-wallet.html"));
        assert!(banner.contains("Press Ctrl+C to stop server"));
    }

    #[test]
    fn test_banner_without_alternatives() {
        let banner = urls(Vec::new()).render_banner();
        assert!(!banner.contains("Alternative URLs"));
        assert!(banner.contains("Instructions:"));
        assert!(banner.contains("4. Camera should work properly!"));
    }

    #[tokio::test]
    async fn test_resolve_localhost() {
        let ip = resolve_ipv4("localhost").await.unwrap();
        assert!(ip.is_loopback());
    }

    #[tokio::test]
    async fn test_resolve_invalid_host_fails() {
        let result = resolve_ipv4("wallet-serve.invalid").await;
        assert!(matches!(result, Err(ServerError::HostnameResolution(_))));
    }
}
