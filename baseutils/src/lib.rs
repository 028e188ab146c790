#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod collections;
pub mod hash;
pub mod json;
pub mod random;
pub mod time;
pub mod version;

/// Redis facade over single-node and cluster deployments.
#[cfg(feature = "redis")]
#[cfg_attr(docsrs, doc(cfg(feature = "redis")))]
pub use baseutils_redis as redis;

/// Leveled logging setup.
#[cfg(feature = "log")]
#[cfg_attr(docsrs, doc(cfg(feature = "log")))]
pub use baseutils_log as log;

#[doc(inline)]
pub use crate::collections::{contains, dedup, dedup_uuids};
#[doc(inline)]
pub use crate::hash::string_hash;
#[doc(inline)]
pub use crate::json::to_json;
#[doc(inline)]
pub use crate::random::range_rand;
#[doc(inline)]
pub use crate::version::{Constraints, Version, VersionError, version_compare};
