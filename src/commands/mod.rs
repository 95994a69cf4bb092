pub mod classify;
pub mod compare;
pub mod names;
pub mod stats;
