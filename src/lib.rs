pub mod app;
pub mod auditor;
pub mod boundary;
pub mod config;
pub mod datasource;
pub mod geocoding;
pub mod map;
pub mod markers;
pub mod panel;
pub mod precincts;
pub mod remote;
pub mod resolver;
pub mod selection;

#[cfg(test)]
mod test_utils;

pub use map::map_event::MapEvent;

pub const DEFAULT_PORT: u16 = 12345;
