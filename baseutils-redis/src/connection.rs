//! Backend connections for the two supported topologies.
//!
//! [`connect`] picks the topology from the configured address, builds a
//! connection pool for it and probes it with `PING`. The result is a
//! [`BackendHandle`]: a shared [`Connection`] trait object whose topology never
//! changes afterwards.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Runtime, cluster};
use futures::StreamExt;
use redis::{Cmd, ConnectionInfo, IntoConnectionInfo, RedisResult, Value};
use tracing::{debug, trace, warn};

use crate::config::{ConnectionConfig, non_zero};
use crate::error::{Error, Result};
use crate::subscription::{Message, Subscription};
use crate::topology::{Endpoints, Topology, select_topology};

/// Shared connection handle held by [`Redis`](crate::Redis).
pub type BackendHandle = Arc<dyn Connection>;

/// Command execution over one backend topology.
///
/// Both production topologies implement it, and so can test doubles. Only
/// [`query`](Connection::query) and [`topology`](Connection::topology) are
/// required; the pub/sub methods default to [`Error::BadInstance`].
#[async_trait]
pub trait Connection: Send + Sync {
    /// Topology this connection was built for.
    fn topology(&self) -> Topology;

    /// Runs one command and returns its raw reply.
    async fn query(&self, cmd: &Cmd) -> Result<Value>;

    /// Publishes `message` on `channel`.
    async fn publish(&self, _channel: &str, _message: &[u8]) -> Result<()> {
        Err(Error::bad_instance("publish", self.topology()))
    }

    /// Subscribes to `channels` on a dedicated connection.
    async fn subscribe(&self, _channels: &[String]) -> Result<Subscription> {
        Err(Error::bad_instance("subscribe", self.topology()))
    }

    /// Subscribes to channel `patterns` on a dedicated connection.
    async fn psubscribe(&self, _patterns: &[String]) -> Result<Subscription> {
        Err(Error::bad_instance("psubscribe", self.topology()))
    }
}

/// Builds the connection for `config` and checks that it answers `PING`.
///
/// Fails with [`Error::Config`] before any network activity when the address
/// is empty or unparsable, or when the pool size is zero. Client construction
/// and probe failures become [`Error::Connection`]. Nothing is retried.
pub async fn connect<C>(config: &C) -> Result<BackendHandle>
where
    C: ConnectionConfig + ?Sized,
{
    let endpoints = select_topology(config.address())?;
    if config.pool_size() == 0 {
        return Err(Error::Config("pool size must be positive".to_owned()));
    }
    let topology = endpoints.topology();
    let infos = connection_infos(&endpoints, config.password())
        .map_err(|err| Error::Config(format!("invalid redis address: {err}")))?;
    let settings = PoolSettings::from_config(config);

    debug!(%topology, nodes = infos.len(), "Connecting to redis");
    let handle: BackendHandle = match endpoints {
        Endpoints::Single(_) => {
            let info = infos
                .into_iter()
                .next()
                .ok_or_else(|| Error::Config("empty redis address".to_owned()))?;
            Arc::new(SingleConnection::new(info, &settings)?)
        }
        Endpoints::Cluster(_) => Arc::new(ClusterConnection::new(infos, &settings)?),
    };

    probe(handle.as_ref()).await?;
    debug!(%topology, "Redis connection is alive");
    Ok(handle)
}

/// Liveness probe: one `PING` round trip.
async fn probe(connection: &dyn Connection) -> Result<()> {
    let topology = connection.topology();
    match connection.query(&redis::cmd("PING")).await {
        Ok(_) => Ok(()),
        Err(err) => {
            warn!(%topology, error = %err, "Redis liveness probe failed");
            Err(Error::connection(topology, err))
        }
    }
}

fn connection_infos(endpoints: &Endpoints, password: &str) -> RedisResult<Vec<ConnectionInfo>> {
    endpoints
        .urls()
        .into_iter()
        .map(|url| {
            let mut info = url.into_connection_info()?;
            if !password.is_empty() {
                info.redis.password = Some(password.to_owned());
            }
            Ok(info)
        })
        .collect()
}

/// Pool and command bounds derived from a [`ConnectionConfig`].
#[derive(Debug, Clone, Copy)]
struct PoolSettings {
    max_size: usize,
    wait_timeout: Option<Duration>,
    dial_timeout: Option<Duration>,
    command_timeout: Option<Duration>,
}

impl PoolSettings {
    fn from_config<C: ConnectionConfig + ?Sized>(config: &C) -> Self {
        Self {
            max_size: config.pool_size(),
            wait_timeout: non_zero(config.pool_timeout()),
            dial_timeout: non_zero(config.dial_timeout()),
            command_timeout: non_zero(config.read_timeout() + config.write_timeout()),
        }
    }
}

/// Awaits `fut`, failing with [`Error::Timeout`] once `deadline` elapses.
async fn within<T, F>(deadline: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = RedisResult<T>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| Error::Timeout(limit))?
            .map_err(Error::from),
        None => fut.await.map_err(Error::from),
    }
}

fn publish_cmd(channel: &str, message: &[u8]) -> Cmd {
    let mut cmd = redis::cmd("PUBLISH");
    cmd.arg(channel).arg(message);
    cmd
}

/// Single-node backend: a pool of multiplexed connections plus a client for
/// dedicated pub/sub connections.
pub struct SingleConnection {
    pool: deadpool_redis::Pool,
    client: redis::Client,
    dial_timeout: Option<Duration>,
    command_timeout: Option<Duration>,
}

impl SingleConnection {
    fn new(info: ConnectionInfo, settings: &PoolSettings) -> Result<Self> {
        let client = redis::Client::open(info.clone())
            .map_err(|err| Error::connection(Topology::Single, err))?;
        let manager = deadpool_redis::Manager::new(info)
            .map_err(|err| Error::connection(Topology::Single, err))?;
        let pool = deadpool_redis::Pool::builder(manager)
            .max_size(settings.max_size)
            .wait_timeout(settings.wait_timeout)
            .create_timeout(settings.dial_timeout)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|err| Error::connection(Topology::Single, err))?;

        Ok(Self {
            pool,
            client,
            dial_timeout: settings.dial_timeout,
            command_timeout: settings.command_timeout,
        })
    }

    async fn open_pubsub(&self) -> Result<redis::aio::PubSub> {
        trace!("Open dedicated pub/sub connection");
        within(self.dial_timeout, self.client.get_async_pubsub()).await
    }
}

#[async_trait]
impl Connection for SingleConnection {
    fn topology(&self) -> Topology {
        Topology::Single
    }

    async fn query(&self, cmd: &Cmd) -> Result<Value> {
        let mut conn = self.pool.get().await?;
        within(self.command_timeout, cmd.query_async::<Value>(&mut *conn)).await
    }

    async fn publish(&self, channel: &str, message: &[u8]) -> Result<()> {
        self.query(&publish_cmd(channel, message)).await.map(drop)
    }

    async fn subscribe(&self, channels: &[String]) -> Result<Subscription> {
        let mut pubsub = self.open_pubsub().await?;
        within(self.command_timeout, pubsub.subscribe(channels)).await?;
        Ok(Subscription::from_stream(
            pubsub.into_on_message().map(Message::from),
        ))
    }

    async fn psubscribe(&self, patterns: &[String]) -> Result<Subscription> {
        let mut pubsub = self.open_pubsub().await?;
        within(self.command_timeout, pubsub.psubscribe(patterns)).await?;
        Ok(Subscription::from_stream(
            pubsub.into_on_message().map(Message::from),
        ))
    }
}

/// Cluster backend: a pool of slot-routing cluster connections.
///
/// Publishing goes through the cluster client's own `PUBLISH` routing.
/// Subscriptions are not supported and fail with [`Error::BadInstance`].
pub struct ClusterConnection {
    pool: cluster::Pool,
    command_timeout: Option<Duration>,
}

impl ClusterConnection {
    fn new(nodes: Vec<ConnectionInfo>, settings: &PoolSettings) -> Result<Self> {
        let manager = cluster::Manager::new(nodes, false)
            .map_err(|err| Error::connection(Topology::Cluster, err))?;
        let pool = cluster::Pool::builder(manager)
            .max_size(settings.max_size)
            .wait_timeout(settings.wait_timeout)
            .create_timeout(settings.dial_timeout)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|err| Error::connection(Topology::Cluster, err))?;

        Ok(Self {
            pool,
            command_timeout: settings.command_timeout,
        })
    }
}

#[async_trait]
impl Connection for ClusterConnection {
    fn topology(&self) -> Topology {
        Topology::Cluster
    }

    async fn query(&self, cmd: &Cmd) -> Result<Value> {
        let mut conn = self.pool.get().await?;
        within(self.command_timeout, cmd.query_async::<Value>(&mut *conn)).await
    }

    async fn publish(&self, channel: &str, message: &[u8]) -> Result<()> {
        self.query(&publish_cmd(channel, message)).await.map(drop)
    }
}
