//! Candidate genotypes with cached fitness.

/// One proposed quantity per item dimension.
///
/// Fitness is cached until the genotype is touched through
/// [`genes_mut`](Candidate::genes_mut), which invalidates it. Genes may
/// leave the feasible box during the search; they are repaired only when a
/// candidate is reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    genes: Vec<f64>,
    fitness: Option<f64>,
}

impl Candidate {
    /// Creates an unevaluated candidate.
    pub fn new(genes: Vec<f64>) -> Self {
        Self {
            genes,
            fitness: None,
        }
    }

    pub fn genes(&self) -> &[f64] {
        &self.genes
    }

    /// Mutable access to the genes. Invalidates the cached fitness.
    pub fn genes_mut(&mut self) -> &mut [f64] {
        self.fitness = None;
        &mut self.genes
    }

    /// Cached fitness, `None` if not evaluated since the last change.
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    /// Cached fitness, or `+inf` for an unevaluated candidate.
    pub fn fitness_or_worst(&self) -> f64 {
        self.fitness.unwrap_or(f64::INFINITY)
    }

    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    /// Bit patterns of the genes rounded to `decimals` places.
    ///
    /// Two candidates with equal keys are treated as the same recommendation.
    /// `-0.0` and `0.0` share a key.
    pub fn rounded_key(&self, decimals: u32) -> Vec<u64> {
        let scale = 10f64.powi(decimals as i32);
        self.genes
            .iter()
            .map(|g| {
                let rounded = (g * scale).round() / scale;
                if rounded == 0.0 {
                    0.0f64.to_bits()
                } else {
                    rounded.to_bits()
                }
            })
            .collect()
    }
}
