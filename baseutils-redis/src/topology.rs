//! Topology selection from the configured address string.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Separator between node addresses of a cluster.
pub const NODE_SEPARATOR: char = ',';

/// Deployment shape of the Redis backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    /// One logical endpoint, no key-space sharding.
    Single,
    /// Several endpoints with server-managed key-space sharding.
    Cluster,
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => f.write_str("single"),
            Self::Cluster => f.write_str("cluster"),
        }
    }
}

/// Node addresses resolved from a configured address string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoints {
    /// One `host:port` (or URL).
    Single(String),
    /// Seed nodes of a cluster.
    Cluster(Vec<String>),
}

impl Endpoints {
    /// Topology these endpoints describe.
    pub fn topology(&self) -> Topology {
        match self {
            Self::Single(_) => Topology::Single,
            Self::Cluster(_) => Topology::Cluster,
        }
    }

    /// Endpoints as connection URLs, in configured order.
    pub fn urls(&self) -> Vec<String> {
        match self {
            Self::Single(address) => vec![node_url(address)],
            Self::Cluster(nodes) => nodes.iter().map(|node| node_url(node)).collect(),
        }
    }
}

/// Decides the topology for `address`.
///
/// An address containing [`NODE_SEPARATOR`] selects [`Topology::Cluster`]
/// with every non-empty, trimmed entry as a seed node. Anything else selects
/// [`Topology::Single`].
///
/// ```
/// use baseutils_redis::{Endpoints, select_topology};
///
/// let endpoints = select_topology("10.0.0.1:7000,10.0.0.2:7000").unwrap();
/// assert_eq!(
///     endpoints,
///     Endpoints::Cluster(vec!["10.0.0.1:7000".into(), "10.0.0.2:7000".into()])
/// );
/// assert!(select_topology("").is_err());
/// ```
pub fn select_topology(address: &str) -> Result<Endpoints> {
    let address = address.trim();
    if address.is_empty() {
        return Err(Error::Config("empty redis address".to_owned()));
    }

    if !address.contains(NODE_SEPARATOR) {
        return Ok(Endpoints::Single(address.to_owned()));
    }

    let nodes: Vec<String> = address
        .split(NODE_SEPARATOR)
        .map(str::trim)
        .filter(|node| !node.is_empty())
        .map(str::to_owned)
        .collect();

    if nodes.is_empty() {
        return Err(Error::Config(format!(
            "no cluster nodes in redis address {address:?}"
        )));
    }
    Ok(Endpoints::Cluster(nodes))
}

/// Bare `host:port` addresses get the `redis://` scheme; URLs pass through.
fn node_url(address: &str) -> String {
    if address.contains("://") {
        address.to_owned()
    } else {
        format!("redis://{address}")
    }
}
