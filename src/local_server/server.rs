//! HTTP Server 实现
//!
//! 使用 axum + tower-http 的 ServeDir 提供静态文件服务，支持启动和优雅关闭。

use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use super::config::LocalServerConfig;
use super::handlers::{preflight_middleware, standard_headers};
use crate::advertiser::{self, AccessUrls, InterfaceEnumerator};
use crate::error::ServerError;

/// Server 控制句柄
///
/// 用于控制 Server 的生命周期。Drop 时同样会发送关闭信号，监听 socket 随之释放。
pub struct ServerHandle {
    /// 关闭信号发送器
    shutdown_tx: Option<oneshot::Sender<()>>,
    /// 后台 serve 任务
    task: Option<JoinHandle<()>>,
    /// 实际绑定的地址
    local_addr: SocketAddr,
}

impl ServerHandle {
    /// 获取当前端口
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// 获取实际绑定的地址
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// 关闭 Server，等待 serve 任务结束（监听 socket 在此之后已关闭）
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Server task failed: {}", e);
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// 本地静态文件 Server
pub struct LocalServer {
    config: Arc<LocalServerConfig>,
}

impl LocalServer {
    /// 创建新的 Server 实例
    pub fn new(config: LocalServerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &LocalServerConfig {
        &self.config
    }

    /// 创建路由
    ///
    /// 层的顺序（由外到内）：trace → 标准响应头 → 预检短路 → ServeDir。
    /// 响应头在最外层，预检和 404 都会带上。
    pub fn router(&self) -> Router {
        let serve_dir = ServeDir::new(&self.config.root).append_index_html_on_directories(true);

        let mut router = Router::new()
            .fallback_service(serve_dir)
            .layer(middleware::from_fn(preflight_middleware));

        for (name, value) in standard_headers() {
            router = router.layer(SetResponseHeaderLayer::overriding(name, value));
        }

        router.layer(TraceLayer::new_for_http())
    }

    /// 启动 Server
    ///
    /// 端口被占用时直接失败，不重试也不换端口。
    ///
    /// # Returns
    /// ServerHandle 用于控制 Server 生命周期
    pub async fn start(&self) -> Result<ServerHandle, ServerError> {
        self.config.validate()?;

        if !self.config.landing_page_path().is_file() {
            tracing::warn!(
                "Landing page {} not found under {}",
                self.config.landing_page,
                self.config.root.display()
            );
        }

        let app = self.router();

        let addr = SocketAddr::new(self.config.bind_address, self.config.port);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::from_bind(self.config.port, e))?;

        // 获取实际绑定的地址（port=0 时由 OS 分配）
        let local_addr = listener.local_addr()?;
        tracing::info!("Serving {} on {}", self.config.root.display(), local_addr);

        // 创建关闭信号
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        // 在后台运行 Server
        let task = tokio::spawn(async move {
            let graceful = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });

            if let Err(e) = graceful.await {
                tracing::error!("Server error: {}", e);
            }
            tracing::info!("Listener on {} closed", local_addr);
        });

        Ok(ServerHandle {
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
            local_addr,
        })
    }

    /// 完整启动流程：解析主机名 → 绑定监听 → 枚举其他网卡地址
    ///
    /// 主机名解析失败时在绑定之前返回错误，不会留下已打开的 socket。
    /// 网卡枚举失败只会让备用地址列表为空。
    pub async fn launch(
        &self,
        hostname: &str,
        interfaces: &dyn InterfaceEnumerator,
    ) -> Result<(ServerHandle, AccessUrls), ServerError> {
        let primary = advertiser::resolve_ipv4(hostname).await?;
        let handle = self.start().await?;
        let alternatives = advertiser::alternative_addrs(interfaces, primary);

        let urls = AccessUrls {
            port: handle.port(),
            page: self.config.landing_page.clone(),
            primary,
            alternatives,
        };

        Ok((handle, urls))
    }

    /// 检查端口是否可用
    #[cfg(test)]
    pub(crate) async fn check_port_available(port: u16) -> bool {
        tokio::net::TcpListener::bind(SocketAddr::from((std::net::Ipv4Addr::LOCALHOST, port)))
            .await
            .is_ok()
    }
}
