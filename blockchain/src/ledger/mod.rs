pub mod address;
pub mod enforcement;
pub mod transaction;

pub use address::*;
pub use enforcement::*;
pub use transaction::*;
