//! Client configuration

use std::time::Duration;

/// Client configuration for connecting to the attendance server
///
/// 重连参数沿用两套预设：
///
/// | 预设 | 首次重连 | 退避上限 | HTTP 超时 |
/// |------|----------|----------|-----------|
/// | [`lan`](Self::lan) (默认) | 500ms | 10s | 5s |
/// | [`wan`](Self::wan) | 1s | 60s | 15s |
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "http://localhost:9988")
    pub base_url: String,

    /// JWT token for authentication
    pub token: Option<String>,

    /// HTTP request timeout
    pub timeout: Duration,

    /// 事件通道路径
    pub ws_path: String,

    /// 首次重连延迟
    pub reconnect_delay: Duration,

    /// 最大重连延迟 (指数退避上限)
    pub max_reconnect_delay: Duration,

    /// 连续失败的最大重连次数 (0 表示无限重试)
    pub max_reconnect_attempts: u32,
}

impl ClientConfig {
    /// Create a new client configuration (LAN preset)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: Duration::from_secs(5),
            ws_path: "/api/dashboard/ws".to_string(),
            reconnect_delay: Duration::from_millis(500),
            max_reconnect_delay: Duration::from_secs(10),
            max_reconnect_attempts: 20,
        }
    }

    /// 局域网配置 (默认)
    pub fn lan(base_url: impl Into<String>) -> Self {
        Self::new(base_url)
    }

    /// 广域网/互联网配置
    ///
    /// 容忍高延迟，退避上限 60 秒
    pub fn wan(base_url: impl Into<String>) -> Self {
        Self {
            timeout: Duration::from_secs(15),
            reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(60),
            ..Self::new(base_url)
        }
    }

    /// Set the JWT token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_ws_path(mut self, path: impl Into<String>) -> Self {
        self.ws_path = path.into();
        self
    }

    /// 设置重连退避 (首次延迟与上限)
    pub fn with_reconnect(mut self, delay: Duration, max_delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self.max_reconnect_delay = max_delay;
        self
    }

    /// 设置最大重连尝试次数 (0 表示无限重试)
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// 事件通道地址，`http(s)://` 换成 `ws(s)://`，令牌放在 query
    pub fn ws_url(&self, token: &str) -> String {
        let base = self
            .base_url
            .trim_end_matches('/')
            .replacen("https://", "wss://", 1)
            .replacen("http://", "ws://", 1);
        format!("{}{}?token={}", base, self.ws_path, token)
    }

    /// Create an HTTP client from this configuration
    pub fn build_http_client(&self) -> crate::ClientResult<crate::HttpClient> {
        crate::HttpClient::new(self)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:9988")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_presets() {
        let lan = ClientConfig::lan("http://127.0.0.1:9988");
        assert_eq!(lan.reconnect_delay, Duration::from_millis(500));
        assert_eq!(lan.max_reconnect_delay, Duration::from_secs(10));

        let wan = ClientConfig::wan("http://127.0.0.1:9988");
        assert_eq!(wan.max_reconnect_delay, Duration::from_secs(60));
        assert_eq!(wan.ws_path, lan.ws_path);
    }

    #[test]
    fn test_ws_url() {
        let config = ClientConfig::new("http://127.0.0.1:9988/");
        assert_eq!(
            config.ws_url("abc.def"),
            "ws://127.0.0.1:9988/api/dashboard/ws?token=abc.def"
        );

        let config = ClientConfig::new("https://attendance.example.com");
        assert!(config.ws_url("t").starts_with("wss://attendance.example.com/"));
    }
}
