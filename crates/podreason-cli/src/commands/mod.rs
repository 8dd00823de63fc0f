pub mod diagnose;
pub mod graph;
