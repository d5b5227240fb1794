pub mod backends;
pub mod traits;

pub use backends::rns_ntt::{
    MAX_BASIS_BITS, NttTable, RnsBasis, RnsNttError, RnsNttResult, RnsPoly,
};
pub use traits::{PolyRing, PolySampler};
