pub mod lifecycle;
pub mod settlement;
