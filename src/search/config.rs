//! Search configuration.
//!
//! [`SearchConfig`] holds all parameters that control the generational loop.

use crate::error::SearchError;

/// Configuration for the PFC search.
///
/// The defaults are the production policy; tests and benchmarks shrink the
/// population and generation counts through the builders.
///
/// # Defaults
///
/// ```
/// use pfc_balance::search::SearchConfig;
///
/// let config = SearchConfig::default();
/// assert_eq!(config.population_size, 2000);
/// assert_eq!(config.generations, 2000);
/// assert_eq!(config.tournament_size, 5);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use pfc_balance::search::SearchConfig;
///
/// let config = SearchConfig::default()
///     .with_population_size(200)
///     .with_generations(100)
///     .with_seed(7);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchConfig {
    /// Number of candidates in the population.
    pub population_size: usize,

    /// Number of generations to run. There is no early exit.
    pub generations: usize,

    /// Probability that a consecutive pair of selected candidates is
    /// recombined (0.0–1.0).
    pub crossover_probability: f64,

    /// Probability that a candidate is mutated at all (0.0–1.0).
    pub mutation_probability: f64,

    /// Probability that a mutated candidate resamples each dimension
    /// (0.0–1.0).
    pub gene_resample_probability: f64,

    /// Number of contestants per tournament.
    pub tournament_size: usize,

    /// Capacity of the elite archive.
    pub elite_capacity: usize,

    /// Number of distinct recommendations returned.
    pub top_n: usize,

    /// Decimal places used when deciding whether two genotypes are the same.
    pub dedup_decimals: u32,

    /// Whether to evaluate candidates in parallel using rayon.
    ///
    /// Has no effect without the `parallel` feature. Results are identical
    /// either way.
    pub parallel: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            population_size: 2000,
            generations: 2000,
            crossover_probability: 0.7,
            mutation_probability: 0.3,
            gene_resample_probability: 0.2,
            tournament_size: 5,
            elite_capacity: 10,
            top_n: 1,
            dedup_decimals: 2,
            parallel: true,
            seed: None,
        }
    }
}

impl SearchConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the number of generations.
    pub fn with_generations(mut self, n: usize) -> Self {
        self.generations = n;
        self
    }

    /// Sets the crossover probability.
    pub fn with_crossover_probability(mut self, p: f64) -> Self {
        self.crossover_probability = p.clamp(0.0, 1.0);
        self
    }

    /// Sets the per-candidate mutation probability.
    pub fn with_mutation_probability(mut self, p: f64) -> Self {
        self.mutation_probability = p.clamp(0.0, 1.0);
        self
    }

    /// Sets the per-dimension resample probability of a mutation.
    pub fn with_gene_resample_probability(mut self, p: f64) -> Self {
        self.gene_resample_probability = p.clamp(0.0, 1.0);
        self
    }

    /// Sets the tournament size.
    pub fn with_tournament_size(mut self, k: usize) -> Self {
        self.tournament_size = k;
        self
    }

    /// Sets the elite archive capacity.
    pub fn with_elite_capacity(mut self, n: usize) -> Self {
        self.elite_capacity = n;
        self
    }

    /// Sets how many distinct recommendations are returned.
    pub fn with_top_n(mut self, n: usize) -> Self {
        self.top_n = n;
        self
    }

    /// Sets the rounding precision used to deduplicate recommendations.
    pub fn with_dedup_decimals(mut self, decimals: u32) -> Self {
        self.dedup_decimals = decimals;
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), SearchError> {
        let invalid = |msg: &str| Err(SearchError::InvalidConfig(msg.into()));
        if self.population_size < 2 {
            return invalid("population_size must be at least 2");
        }
        if self.generations == 0 {
            return invalid("generations must be at least 1");
        }
        if self.tournament_size == 0 {
            return invalid("tournament_size must be at least 1");
        }
        if self.elite_capacity == 0 {
            return invalid("elite_capacity must be at least 1");
        }
        if self.top_n == 0 {
            return invalid("top_n must be at least 1");
        }
        if self.top_n > self.elite_capacity {
            return invalid("top_n cannot exceed elite_capacity");
        }
        for p in [
            self.crossover_probability,
            self.mutation_probability,
            self.gene_resample_probability,
        ] {
            if !(0.0..=1.0).contains(&p) {
                return invalid("probabilities must lie in [0, 1]");
            }
        }
        Ok(())
    }
}
