//! HTTP 中间件与响应头
//!
//! - 所有响应统一附加 CORS 和摄像头权限头
//! - OPTIONS 预检请求直接返回 200，不访问文件系统

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// 每个响应都携带的响应头 (名称, 值)
///
/// 名称必须是小写，`HeaderName::from_static` 要求如此。
pub const STANDARD_HEADERS: [(&str, &str); 4] = [
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET, POST, OPTIONS"),
    ("access-control-allow-headers", "*"),
    ("permissions-policy", "camera=*"),
];

/// 构造标准响应头集合
pub fn standard_headers() -> Vec<(HeaderName, HeaderValue)> {
    STANDARD_HEADERS
        .iter()
        .map(|&(name, value)| {
            (
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            )
        })
        .collect()
}

/// 预检请求中间件
///
/// 任意路径的 OPTIONS 请求在这里短路：200、空 body。
/// 标准响应头由外层的 header layer 统一补上。
pub async fn preflight_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        tracing::debug!("Preflight request for {}", request.uri().path());
        return StatusCode::OK.into_response();
    }

    next.run(request).await
}
