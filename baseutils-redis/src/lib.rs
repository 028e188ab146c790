#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod subscription;
pub mod topology;

#[doc(inline)]
pub use crate::client::{KeyTtl, Redis};
#[doc(inline)]
pub use crate::config::{ConnectionConfig, RedisConfig};
#[doc(inline)]
pub use crate::connection::{
    BackendHandle, ClusterConnection, Connection, SingleConnection, connect,
};
#[doc(inline)]
pub use crate::error::{Error, Result};
#[doc(inline)]
pub use crate::subscription::{Message, Subscription};
#[doc(inline)]
pub use crate::topology::{Endpoints, NODE_SEPARATOR, Topology, select_topology};

pub use redis;
