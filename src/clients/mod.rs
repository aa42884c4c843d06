//! Connected clients and the server-wide services built on them

pub mod client;
pub mod registry;

pub use client::Client;
pub use registry::{ClientRegistry, ClientSession};
