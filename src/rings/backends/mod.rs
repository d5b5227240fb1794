pub mod rns_ntt;

pub use rns_ntt::{RnsBasis, RnsNttError, RnsNttResult, RnsPoly};
