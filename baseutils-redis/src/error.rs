//! Error types for Redis facade operations.
//!
//! Every operation on [`Redis`](crate::Redis) returns [`Error`]. The variants
//! fall into five groups:
//!
//! - [`Error::Config`]: the connection parameters are unusable
//!   (for example an empty address). Raised before any network activity.
//! - [`Error::Connection`]: building the client or the liveness probe failed.
//! - [`Error::NotInitialized`]: the facade was used after a failed
//!   construction. No command is sent in that case.
//! - [`Error::Backend`], [`Error::Pool`] and [`Error::Timeout`]: failures
//!   surfaced by the underlying client while running a command. See
//!   [`Error::is_backend`].
//! - [`Error::BadInstance`]: a pub/sub operation the selected topology does
//!   not support.

use std::time::Duration;

use deadpool_redis::PoolError;
use redis::RedisError;

use crate::topology::Topology;

/// Boxed cause of a failed connection attempt.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for Redis facade operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The connection parameters are invalid.
    #[error("Invalid redis configuration: {0}")]
    Config(String),

    /// Client construction or the liveness probe failed.
    ///
    /// The underlying cause is available through [`std::error::Error::source`].
    #[error("Failed to connect to redis ({topology}): {source}")]
    Connection {
        /// Topology that was being connected.
        topology: Topology,
        /// Underlying cause.
        #[source]
        source: BoxError,
    },

    /// The facade holds no connection because construction failed.
    #[error("Redis client is not initialized")]
    NotInitialized,

    /// An error from the underlying Redis client.
    ///
    /// Includes protocol errors, authentication failures, server-side command
    /// errors and broken connections.
    #[error("Redis backend error: {0}")]
    Backend(#[from] RedisError),

    /// No pooled connection could be acquired.
    #[error("Redis pool error: {0}")]
    Pool(#[from] PoolError),

    /// A command round trip exceeded the configured read and write timeouts.
    #[error("Redis command timed out after {0:?}")]
    Timeout(Duration),

    /// The operation is not supported by the selected topology.
    #[error("bad instance: {operation} is not supported on {topology} topology")]
    BadInstance {
        /// Name of the rejected operation.
        operation: &'static str,
        /// Topology of the connection that rejected it.
        topology: Topology,
    },
}

impl Error {
    /// Returns `true` for failures raised by the backend while running a
    /// command: client errors, pool acquisition errors and timeouts.
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::Pool(_) | Self::Timeout(_))
    }

    pub(crate) fn connection(topology: Topology, source: impl Into<BoxError>) -> Self {
        Self::Connection {
            topology,
            source: source.into(),
        }
    }

    pub(crate) fn bad_instance(operation: &'static str, topology: Topology) -> Self {
        Self::BadInstance {
            operation,
            topology,
        }
    }
}

/// Result alias used across this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
