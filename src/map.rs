/// Contains everything needed to handle coordinates.
pub mod coordinates;
/// Interactions delivered to the map.
pub mod map_event;
/// A retained surface that records what is drawn.
pub mod scene;
/// Colors and polygon styles.
pub mod style;
/// The rendering collaborator interface.
pub mod surface;
