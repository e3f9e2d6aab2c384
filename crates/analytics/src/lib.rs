//! Pure reductions over fetched collections.
//!
//! Nothing here performs I/O; every function takes records already loaded by
//! the client services or pushed over a live channel.

pub mod dashboard;
pub mod deposits;
pub mod exposure;
pub mod margin;
pub mod pnl;

pub use dashboard::*;
pub use deposits::*;
pub use exposure::*;
pub use margin::*;
pub use pnl::*;
