pub mod basis;
pub mod errors;
pub mod poly;

pub use basis::{MAX_BASIS_BITS, NttTable, RnsBasis};
pub use errors::{RnsNttError, RnsNttResult};
pub use poly::RnsPoly;
