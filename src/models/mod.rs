pub mod common;
pub mod tier;
pub mod usage;
pub mod warning;
