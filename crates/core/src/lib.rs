pub mod events;
pub mod models;
pub mod traits;
pub mod wire;

pub use events::*;
pub use models::*;
pub use traits::*;
