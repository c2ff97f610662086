pub mod config;
pub mod context;
pub mod error;
pub mod model;
pub mod pagination;
pub mod params;
pub mod server;
pub mod storage;
