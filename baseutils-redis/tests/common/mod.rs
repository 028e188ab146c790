#![allow(dead_code)]

pub mod mock_connection;

pub use mock_connection::{MockConnection, PubSubMock};
