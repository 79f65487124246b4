pub mod aggregate;
pub mod emit;
pub mod geocode;
pub mod loader;
pub mod normalise;
