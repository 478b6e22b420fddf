pub mod curve;
pub mod document;
pub mod ecad;
pub mod geometry;
