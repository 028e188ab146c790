//! The [`Redis`] facade.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use redis::{Cmd, FromRedisValue, ToRedisArgs};
use tracing::trace;

use crate::config::ConnectionConfig;
use crate::connection::{BackendHandle, Connection, connect};
use crate::error::{Error, Result};
use crate::subscription::Subscription;
use crate::topology::Topology;

/// Remaining lifetime of a key, as reported by `PTTL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyTtl {
    /// The key does not exist.
    Missing,
    /// The key exists and never expires.
    Persistent,
    /// The key expires after this duration.
    Expires(Duration),
}

impl KeyTtl {
    fn from_pttl(millis: i64) -> Self {
        match millis {
            -2 => Self::Missing,
            millis if millis < 0 => Self::Persistent,
            millis => Self::Expires(Duration::from_millis(millis.unsigned_abs())),
        }
    }

    /// The expiration duration, if the key has one.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::Expires(duration) => Some(*duration),
            Self::Missing | Self::Persistent => None,
        }
    }
}

/// Topology-independent Redis command facade.
///
/// A `Redis` either wraps a live [`Connection`] or remembers why it could not
/// build one. In the latter case every operation fails with
/// [`Error::NotInitialized`] without touching the network.
///
/// Reads of missing keys are not errors: string reads return an empty value,
/// hash reads return an empty map and [`mget`](Self::mget) yields `None` in
/// the missing positions.
///
/// Cloning is cheap; clones share the same connection pool.
///
/// ```no_run
/// use std::time::Duration;
/// use baseutils_redis::{Redis, RedisConfig};
///
/// # async fn run() -> Result<(), baseutils_redis::Error> {
/// let redis = Redis::connect(&RedisConfig::new("127.0.0.1:6379")).await?;
/// redis.set("greeting", "hello", Duration::ZERO).await?;
/// assert_eq!(redis.get("greeting").await?, "hello");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Redis {
    state: Result<BackendHandle, Arc<Error>>,
}

impl Redis {
    /// Connects using `config`, keeping a construction failure inside the
    /// facade instead of returning it.
    ///
    /// Inspect [`init_error`](Self::init_error) to find out why a facade is
    /// not usable.
    pub async fn new<C>(config: &C) -> Self
    where
        C: ConnectionConfig + ?Sized,
    {
        match connect(config).await {
            Ok(handle) => Self::from_handle(handle),
            Err(err) => Self::uninitialized(err),
        }
    }

    /// Connects using `config`, failing on construction or probe errors.
    pub async fn connect<C>(config: &C) -> Result<Self>
    where
        C: ConnectionConfig + ?Sized,
    {
        connect(config).await.map(Self::from_handle)
    }

    /// Wraps an already built connection.
    pub fn from_connection<C>(connection: C) -> Self
    where
        C: Connection + 'static,
    {
        Self::from_handle(Arc::new(connection))
    }

    /// Wraps a shared connection handle.
    pub fn from_handle(handle: BackendHandle) -> Self {
        Self { state: Ok(handle) }
    }

    /// A facade whose construction failed with `error`.
    pub fn uninitialized(error: Error) -> Self {
        Self {
            state: Err(Arc::new(error)),
        }
    }

    /// Why construction failed, if it did.
    pub fn init_error(&self) -> Option<&Error> {
        self.state.as_ref().err().map(|err| err.as_ref())
    }

    /// Whether a connection is held.
    pub fn is_initialized(&self) -> bool {
        self.state.is_ok()
    }

    /// Topology of the held connection.
    pub fn topology(&self) -> Option<Topology> {
        self.state.as_ref().ok().map(|handle| handle.topology())
    }

    /// The underlying connection, for commands this facade does not wrap.
    pub fn connection(&self) -> Result<&BackendHandle> {
        self.state.as_ref().map_err(|_| Error::NotInitialized)
    }

    async fn query<T: FromRedisValue>(&self, cmd: &Cmd) -> Result<T> {
        let connection = self.connection()?;
        trace!(topology = %connection.topology(), "Run redis command");
        let value = connection.query(cmd).await?;
        Ok(redis::from_redis_value(&value)?)
    }

    /// Value of `key`; an empty string when the key is missing.
    pub async fn get(&self, key: &str) -> Result<String> {
        let value: Option<String> = self.query(cmd("GET").arg(key)).await?;
        Ok(value.unwrap_or_default())
    }

    /// Raw bytes of `key`; empty when the key is missing.
    pub async fn get_bytes(&self, key: &str) -> Result<Vec<u8>> {
        let value: Option<Vec<u8>> = self.query(cmd("GET").arg(key)).await?;
        Ok(value.unwrap_or_default())
    }

    /// Stores `value` under `key`. A zero `expiration` means the key never
    /// expires.
    pub async fn set<V>(&self, key: &str, value: V, expiration: Duration) -> Result<()>
    where
        V: ToRedisArgs,
    {
        let mut cmd = cmd("SET");
        cmd.arg(key).arg(value);
        with_expiration(&mut cmd, expiration);
        self.query::<()>(&cmd).await
    }

    /// Stores `value` only if `key` does not exist yet. Returns whether the
    /// value was written. Atomic on the server.
    pub async fn set_nx<V>(&self, key: &str, value: V, expiration: Duration) -> Result<bool>
    where
        V: ToRedisArgs,
    {
        let mut cmd = cmd("SET");
        cmd.arg(key).arg(value).arg("NX");
        with_expiration(&mut cmd, expiration);
        let reply: Option<String> = self.query(&cmd).await?;
        Ok(reply.is_some())
    }

    /// Values of `keys` in input order, `None` for missing keys.
    pub async fn mget<K>(&self, keys: &[K]) -> Result<Vec<Option<String>>>
    where
        K: AsRef<str>,
    {
        self.connection()?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut cmd = cmd("MGET");
        for key in keys {
            cmd.arg(key.as_ref());
        }
        self.query(&cmd).await
    }

    /// Sets several hash fields at once.
    pub async fn hset_multiple(&self, key: &str, fields: &HashMap<String, String>) -> Result<()> {
        self.connection()?;
        if fields.is_empty() {
            return Ok(());
        }
        let mut cmd = cmd("HSET");
        cmd.arg(key);
        for (field, value) in fields {
            cmd.arg(field).arg(value);
        }
        self.query::<()>(&cmd).await
    }

    /// Value of one hash field; an empty string when missing.
    pub async fn hget(&self, key: &str, field: &str) -> Result<String> {
        let value: Option<String> = self.query(cmd("HGET").arg(key).arg(field)).await?;
        Ok(value.unwrap_or_default())
    }

    /// Removes one hash field.
    pub async fn hdel(&self, key: &str, field: &str) -> Result<()> {
        self.query::<()>(cmd("HDEL").arg(key).arg(field)).await
    }

    /// All fields of a hash; empty when the key is missing.
    pub async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let value: Option<HashMap<String, String>> = self.query(cmd("HGETALL").arg(key)).await?;
        Ok(value.unwrap_or_default())
    }

    /// Sets one hash field.
    pub async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()> {
        self.query::<()>(cmd("HSET").arg(key).arg(field).arg(value)).await
    }

    /// Sets the expiration of `key`.
    pub async fn expire(&self, key: &str, expiration: Duration) -> Result<()> {
        let millis = expiration_millis(expiration);
        self.query::<()>(cmd("PEXPIRE").arg(key).arg(millis)).await
    }

    /// Whether `key` exists.
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let count: i64 = self.query(cmd("EXISTS").arg(key)).await?;
        Ok(count > 0)
    }

    /// Adds `delta` to the integer at `key` and returns the new value.
    pub async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        self.query(cmd("INCRBY").arg(key).arg(delta)).await
    }

    /// Remaining lifetime of `key`.
    pub async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        let millis: i64 = self.query(cmd("PTTL").arg(key)).await?;
        Ok(KeyTtl::from_pttl(millis))
    }

    /// Deletes `keys`.
    pub async fn del<K>(&self, keys: &[K]) -> Result<()>
    where
        K: AsRef<str>,
    {
        self.connection()?;
        if keys.is_empty() {
            return Ok(());
        }
        let mut cmd = cmd("DEL");
        for key in keys {
            cmd.arg(key.as_ref());
        }
        self.query::<()>(&cmd).await
    }

    /// Keys matching the glob `pattern`.
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let keys: Option<Vec<String>> = self.query(cmd("KEYS").arg(pattern)).await?;
        Ok(keys.unwrap_or_default())
    }

    /// Publishes `message` on `channel`.
    ///
    /// Fails with [`Error::BadInstance`] when the connection has no publish
    /// support.
    pub async fn publish(&self, channel: &str, message: impl AsRef<[u8]>) -> Result<()> {
        self.connection()?.publish(channel, message.as_ref()).await
    }

    /// Subscribes to one channel. Single-node topology only.
    pub async fn subscribe(&self, channel: &str) -> Result<Subscription> {
        self.connection()?.subscribe(&[channel.to_owned()]).await
    }

    /// Subscribes to channel patterns. Single-node topology only.
    pub async fn psubscribe<P>(&self, patterns: &[P]) -> Result<Subscription>
    where
        P: AsRef<str>,
    {
        let patterns: Vec<String> = patterns.iter().map(|p| p.as_ref().to_owned()).collect();
        self.connection()?.psubscribe(&patterns).await
    }
}

impl fmt::Debug for Redis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            Ok(handle) => f
                .debug_struct("Redis")
                .field("topology", &handle.topology())
                .finish(),
            Err(err) => f.debug_struct("Redis").field("init_error", err).finish(),
        }
    }
}

fn cmd(name: &str) -> Cmd {
    redis::cmd(name)
}

/// Whole milliseconds, at least one for any non-zero duration.
fn expiration_millis(expiration: Duration) -> u64 {
    let millis = u64::try_from(expiration.as_millis()).unwrap_or(u64::MAX);
    if millis == 0 && !expiration.is_zero() {
        1
    } else {
        millis
    }
}

fn with_expiration(cmd: &mut Cmd, expiration: Duration) {
    if !expiration.is_zero() {
        cmd.arg("PX").arg(expiration_millis(expiration));
    }
}
