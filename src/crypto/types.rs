use crate::rings::RnsPoly;

/// An encoded message, kept in NTT domain over the basis of its level.
#[derive(Debug, Clone)]
pub struct Plaintext {
    pub poly: RnsPoly,
    /// Fixed-point scaling factor the values were multiplied by.
    pub scale: f64,
}

impl Plaintext {
    pub fn level(&self) -> usize {
        self.poly.basis().channel_count() - 1
    }
}

/// CKKS ciphertext `(c_0, c_1, …, c_d)` decrypting to `Σ c_i · s^i`.
///
/// Fresh and relinearized ciphertexts have two components. Multiplying two
/// ciphertexts yields three until relinearization. All components share one
/// basis, whose size fixes the level, and stay in NTT domain.
#[derive(Debug, Clone)]
pub struct Ciphertext {
    pub components: Vec<RnsPoly>,
    pub scale: f64,
}

impl Ciphertext {
    /// Remaining rescales before the modulus chain is exhausted.
    /// Zero for a ciphertext without components.
    pub fn level(&self) -> usize {
        self.components
            .first()
            .map_or(0, |c| c.basis().channel_count().saturating_sub(1))
    }

    /// Ciphertext degree: one less than the number of components.
    pub fn degree(&self) -> usize {
        self.components.len().saturating_sub(1)
    }
}
