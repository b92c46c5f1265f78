//! Genetic encoding of organism traits.
//!
//! DNA is a fixed 4-byte sequence. Each byte maps to one trait:
//! - `dna[0]`: speed
//! - `dna[1]`: size
//! - `dna[2]`: awareness
//! - `dna[3]`: lifespan
//!
//! Genes are values: reproduction clones them and mutates the clone, so a
//! parent's traits never change underneath it.

use std::fmt;
use std::sync::Arc;

use rand::Rng;

use super::error::GenesError;

/// Number of bytes in a DNA sequence.
pub const DNA_LEN: usize = 4;

/// Ticks of lifespan granted per unit of the lifespan gene.
pub const LIFESPAN_PER_GENE: u32 = 20;

/// Raw DNA bytes.
pub type Dna = [u8; DNA_LEN];

/// Custom mutation logic operating in place on the DNA bytes.
pub type MutationFn = Arc<dyn Fn(&mut Dna) + Send + Sync>;

/// Genetic traits of an organism together with the mutation logic used when it reproduces.
#[derive(Clone)]
pub struct Genes {
    dna: Dna,
    mutation: Option<MutationFn>,
}

impl fmt::Debug for Genes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Genes")
            .field("dna", &self.dna)
            .field("custom_mutation", &self.mutation.is_some())
            .finish()
    }
}

impl PartialEq for Genes {
    fn eq(&self, other: &Self) -> bool {
        self.dna == other.dna
    }
}

impl Genes {
    /// Creates genes from raw DNA bytes using the default mutation logic.
    ///
    /// # Arguments
    ///
    /// * `dna` - Exactly [`DNA_LEN`] bytes
    pub fn new(dna: &[u8]) -> Result<Self, GenesError> {
        let dna: Dna = dna
            .try_into()
            .map_err(|_| GenesError::InvalidLength(dna.len()))?;
        Ok(Self::from_dna(dna))
    }

    /// Creates genes from a DNA string, one byte per trait.
    pub fn from_dna_str(dna: &str) -> Result<Self, GenesError> {
        Self::new(dna.as_bytes())
    }

    /// Creates genes from a fixed DNA array using the default mutation logic.
    pub fn from_dna(dna: Dna) -> Self {
        Self {
            dna,
            mutation: None,
        }
    }

    /// Creates genes that mutate with `mutation` instead of the default logic.
    pub fn with_mutation(dna: Dna, mutation: MutationFn) -> Self {
        Self {
            dna,
            mutation: Some(mutation),
        }
    }

    /// Returns the raw DNA bytes.
    pub fn dna(&self) -> &Dna {
        &self.dna
    }

    /// Applies the mutation function to the DNA in place.
    pub fn mutate(&mut self) {
        match &self.mutation {
            Some(mutation) => mutation(&mut self.dna),
            None => default_mutation(&mut self.dna),
        }
    }

    /// Returns a mutated copy, leaving `self` untouched.
    pub fn mutated(&self) -> Self {
        let mut child = self.clone();
        child.mutate();
        child
    }

    /// Maximum displacement per tick.
    pub fn speed(&self) -> f32 {
        f32::from(self.dna[0]) / 4.0
    }

    /// Body size; also the distance at which an organism can act.
    pub fn size(&self) -> f32 {
        f32::from(self.dna[1]) / 4.0
    }

    /// Sensing reach beyond the organism's body.
    pub fn awareness(&self) -> f32 {
        f32::from(self.dna[2]) / 4.0
    }

    /// Maximum number of ticks an organism carrying these genes lives.
    pub fn lifespan(&self) -> u32 {
        (u32::from(self.dna[3]) + 1) * LIFESPAN_PER_GENE
    }
}

/// Adds a uniform offset in {-1, 0, +1} to every byte, saturating at the byte range.
fn default_mutation(dna: &mut Dna) {
    let mut rng = rand::rng();
    for byte in dna.iter_mut() {
        let offset: i16 = rng.random_range(-1..=1);
        *byte = (i16::from(*byte) + offset).clamp(0, 255) as u8;
    }
}
