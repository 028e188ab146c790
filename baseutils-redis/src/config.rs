//! Connection parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Source of connection parameters for [`Redis`](crate::Redis).
///
/// Implement it on your application's own configuration type, or use
/// [`RedisConfig`]. A zero duration disables the corresponding bound.
pub trait ConnectionConfig {
    /// Password sent with `AUTH`; empty means no authentication.
    fn password(&self) -> &str;

    /// `host:port`, a `redis://` URL, or a comma-separated list of either
    /// for a cluster.
    fn address(&self) -> &str;

    /// Maximum number of pooled connections.
    fn pool_size(&self) -> usize;

    /// Bound on receiving a reply.
    fn read_timeout(&self) -> Duration;

    /// Bound on sending a command.
    fn write_timeout(&self) -> Duration;

    /// Bound on waiting for a free pooled connection.
    fn pool_timeout(&self) -> Duration;

    /// Bound on establishing a new connection.
    fn dial_timeout(&self) -> Duration;
}

impl<T: ConnectionConfig + ?Sized> ConnectionConfig for &T {
    fn password(&self) -> &str {
        (**self).password()
    }

    fn address(&self) -> &str {
        (**self).address()
    }

    fn pool_size(&self) -> usize {
        (**self).pool_size()
    }

    fn read_timeout(&self) -> Duration {
        (**self).read_timeout()
    }

    fn write_timeout(&self) -> Duration {
        (**self).write_timeout()
    }

    fn pool_timeout(&self) -> Duration {
        (**self).pool_timeout()
    }

    fn dial_timeout(&self) -> Duration {
        (**self).dial_timeout()
    }
}

/// Serde-friendly [`ConnectionConfig`].
///
/// Durations are written in humantime form:
///
/// ```
/// use std::time::Duration;
/// use baseutils_redis::{ConnectionConfig, RedisConfig};
///
/// let config: RedisConfig = serde_json::from_str(
///     r#"{ "address": "10.0.0.1:7000,10.0.0.2:7000", "read_timeout": "500ms" }"#,
/// ).unwrap();
/// assert_eq!(config.read_timeout(), Duration::from_millis(500));
/// assert_eq!(config.pool_size(), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Password for `AUTH`, empty for none.
    pub password: String,
    /// Single address or comma-separated cluster seed nodes.
    pub address: String,
    /// Maximum pooled connections.
    pub pool_size: usize,
    /// Reply receive bound (e.g. "3s").
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,
    /// Command send bound.
    #[serde(with = "humantime_serde")]
    pub write_timeout: Duration,
    /// Pool acquire bound.
    #[serde(with = "humantime_serde")]
    pub pool_timeout: Duration,
    /// Connect bound.
    #[serde(with = "humantime_serde")]
    pub dial_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            password: String::new(),
            address: "127.0.0.1:6379".to_owned(),
            pool_size: 10,
            read_timeout: Duration::from_secs(3),
            write_timeout: Duration::from_secs(3),
            pool_timeout: Duration::from_secs(4),
            dial_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisConfig {
    /// Default configuration pointing at `address`.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    /// Set the `AUTH` password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Set the pool size.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Set the read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the write timeout.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the pool acquire timeout.
    pub fn with_pool_timeout(mut self, timeout: Duration) -> Self {
        self.pool_timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn with_dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }
}

impl ConnectionConfig for RedisConfig {
    fn password(&self) -> &str {
        &self.password
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn pool_size(&self) -> usize {
        self.pool_size
    }

    fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    fn pool_timeout(&self) -> Duration {
        self.pool_timeout
    }

    fn dial_timeout(&self) -> Duration {
        self.dial_timeout
    }
}

/// Turns a zero duration into "no bound".
pub(crate) fn non_zero(duration: Duration) -> Option<Duration> {
    (!duration.is_zero()).then_some(duration)
}
