//! Native virtual-user harness: threaded runner plus an async variant.

pub mod async_vu;
pub mod runner;
pub mod vu;
