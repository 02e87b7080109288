//! Generational loop execution.
//!
//! [`Optimizer`] orchestrates one search:
//! initialization → evaluation → tournament selection → crossover →
//! mutation → re-evaluation → archive update → progress, repeated for a
//! fixed number of generations, then repair and rendering of the best
//! distinct archive members.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::archive::EliteArchive;
use super::candidate::Candidate;
use super::config::SearchConfig;
use super::operators::{
    evaluate, random_candidate, repair, resample_mutation, tournament, uniform_swap_crossover,
};
use super::problem::SearchProblem;
use crate::error::SearchError;
use crate::report::{render, SearchResult};

/// Snapshot published after every generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationProgress {
    /// Generations completed so far (1-based).
    pub generation: usize,
    pub generations: usize,
    /// `round(generation / generations * 100)`.
    pub percent_complete: u8,
    /// Best fitness in the elite archive.
    pub best_fitness: f64,
    pub status_text: String,
}

/// Statistics about a finished run.
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Generations actually executed.
    pub generations: usize,

    /// Whether the run stopped on a cancellation request.
    pub cancelled: bool,

    /// Best archived fitness after initialization and after each generation.
    pub fitness_history: Vec<f64>,

    /// Mean fitness of the final population.
    pub final_mean_fitness: f64,
}

/// Result of an optimizer run.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub result: SearchResult,
    pub stats: RunStats,
}

/// Executes the evolutionary search.
///
/// # Usage
///
/// ```ignore
/// let problem = SearchProblem::build(&catalog, &requests, target)?;
/// let outcome = Optimizer::run(&problem, &SearchConfig::default().with_seed(42))?;
/// println!("{}", outcome.result.best().unwrap());
/// ```
pub struct Optimizer;

impl Optimizer {
    /// Runs the search without progress reporting.
    pub fn run(problem: &SearchProblem, config: &SearchConfig) -> Result<SearchOutcome, SearchError> {
        Self::run_with_progress(problem, config, |_| {}, None)
    }

    /// Runs the search, calling `on_progress` after every generation.
    ///
    /// If `cancel` is `Some` and the flag is set, the loop stops before the
    /// next generation and the result is taken from the archive as it
    /// stands.
    pub fn run_with_progress<F>(
        problem: &SearchProblem,
        config: &SearchConfig,
        on_progress: F,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SearchOutcome, SearchError>
    where
        F: FnMut(&GenerationProgress),
    {
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        Self::run_with_rng(problem, config, &mut rng, on_progress, cancel)
    }

    /// Runs the search drawing every random number from `rng`.
    ///
    /// `config.seed` is ignored. Given the same stream, the same problem
    /// always produces the same outcome, with or without parallel
    /// evaluation.
    pub fn run_with_rng<R, F>(
        problem: &SearchProblem,
        config: &SearchConfig,
        rng: &mut R,
        mut on_progress: F,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SearchOutcome, SearchError>
    where
        R: Rng,
        F: FnMut(&GenerationProgress),
    {
        config.validate()?;

        // 1. Initialize and evaluate
        let mut population: Vec<Candidate> = (0..config.population_size)
            .map(|_| random_candidate(problem, rng))
            .collect();
        evaluate_population(problem, &mut population, config.parallel);

        // 2. Seed the archive
        let mut archive = EliteArchive::new(config.elite_capacity);
        archive.update(&population);
        let mut fitness_history = Vec::with_capacity(config.generations + 1);
        fitness_history.push(best_fitness(&archive));

        let mut cancelled = false;
        let mut executed = 0usize;

        // 3. Generational loop
        for gen in 0..config.generations {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
            }

            population = next_generation(problem, config, &population, rng);
            evaluate_population(problem, &mut population, config.parallel);
            archive.update(&population);
            executed = gen + 1;

            let best = best_fitness(&archive);
            fitness_history.push(best);

            let percent = percent_complete(executed, config.generations);
            on_progress(&GenerationProgress {
                generation: executed,
                generations: config.generations,
                percent_complete: percent,
                best_fitness: best,
                status_text: format!(
                    "generation {executed}/{} (best deviation {best:.3})",
                    config.generations
                ),
            });

            if executed % 100 == 0 {
                log::debug!("generation {executed}: best fitness {best:.4}");
            }
        }

        // 4. Final selection
        let recommendations = archive
            .distinct_top(config.top_n, config.dedup_decimals)
            .into_iter()
            .map(|c| render(problem, &repair(problem, c.genes())))
            .collect();

        let final_mean_fitness = population
            .iter()
            .map(Candidate::fitness_or_worst)
            .sum::<f64>()
            / population.len() as f64;

        Ok(SearchOutcome {
            result: SearchResult { recommendations },
            stats: RunStats {
                generations: executed,
                cancelled,
                fitness_history,
                final_mean_fitness,
            },
        })
    }
}

/// Builds the next population: tournament selection into a pool of the
/// same size, crossover of consecutive pairs, then mutation.
fn next_generation<R: Rng>(
    problem: &SearchProblem,
    config: &SearchConfig,
    population: &[Candidate],
    rng: &mut R,
) -> Vec<Candidate> {
    let mut offspring: Vec<Candidate> = (0..population.len())
        .map(|_| population[tournament(population, config.tournament_size, rng)].clone())
        .collect();

    for pair in offspring.chunks_exact_mut(2) {
        if rng.random_bool(config.crossover_probability) {
            let (left, right) = pair.split_at_mut(1);
            uniform_swap_crossover(&mut left[0], &mut right[0], rng);
        }
    }

    for child in &mut offspring {
        if rng.random_bool(config.mutation_probability) {
            resample_mutation(problem, child, config.gene_resample_probability, rng);
        }
    }

    offspring
}

/// Evaluates every candidate whose cached fitness is stale.
fn evaluate_population(problem: &SearchProblem, population: &mut [Candidate], parallel: bool) {
    #[cfg(feature = "parallel")]
    {
        if parallel {
            population
                .par_iter_mut()
                .for_each(|c| evaluate(problem, c));
            return;
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    for c in population.iter_mut() {
        evaluate(problem, c);
    }
}

fn best_fitness(archive: &EliteArchive) -> f64 {
    archive
        .best()
        .map_or(f64::INFINITY, Candidate::fitness_or_worst)
}

/// `done / total` as a percentage, rounded half up.
fn percent_complete(done: usize, total: usize) -> u8 {
    ((done * 100 + total / 2) / total).min(100) as u8
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ItemCatalog, ItemProfile};
    use crate::search::{ItemRequest, PfcTriple};

    fn catalog() -> ItemCatalog {
        ItemCatalog::new()
            .with_item("eggs", ItemProfile::new(6.0, 5.0, 0.5, "個"))
            .with_item("rice", ItemProfile::new(2.5, 0.3, 28.0, "g"))
            .with_item("chicken", ItemProfile::new(0.23, 0.02, 0.0, "g"))
            .with_item("olive oil", ItemProfile::new(0.0, 1.0, 0.0, "g"))
            .with_item("banana", ItemProfile::new(1.1, 0.2, 22.5, "個"))
    }

    fn eggs_and_rice() -> SearchProblem {
        SearchProblem::build(
            &catalog(),
            &[ItemRequest::new("eggs", 4.0), ItemRequest::new("rice", 200.0)],
            PfcTriple::new(20.0, 10.0, 50.0),
        )
        .unwrap()
    }

    fn small_config() -> SearchConfig {
        SearchConfig::default()
            .with_population_size(100)
            .with_generations(60)
            .with_seed(42)
            .with_parallel(false)
    }

    #[test]
    fn test_end_to_end_eggs_and_rice() {
        let problem = eggs_and_rice();
        let outcome = Optimizer::run(&problem, &small_config()).unwrap();

        assert_eq!(outcome.result.recommendations.len(), 1);
        let best = outcome.result.best().unwrap();

        for entry in &best.menu {
            match entry.item_name.as_str() {
                "eggs" => {
                    assert!((0.0..=4.0).contains(&entry.quantity));
                    assert_eq!(entry.quantity.fract(), 0.0);
                }
                "rice" => {
                    assert!((0.0..=200.0).contains(&entry.quantity));
                    let cents = entry.quantity * 100.0;
                    assert!((cents - cents.round()).abs() < 1e-6);
                }
                other => panic!("unexpected item {other}"),
            }
        }

        let trivial = problem.fitness(&[0.0, 0.0]);
        assert!(
            best.total_absolute_delta <= trivial,
            "best {} should not be worse than all-zero {}",
            best.total_absolute_delta,
            trivial
        );
    }

    #[test]
    fn test_deterministic_under_seed() {
        let problem = eggs_and_rice();
        let config = small_config();
        let a = Optimizer::run(&problem, &config).unwrap();
        let b = Optimizer::run(&problem, &config).unwrap();
        assert_eq!(a.result, b.result);
        assert_eq!(a.stats.fitness_history, b.stats.fitness_history);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let problem = eggs_and_rice();
        let seq = Optimizer::run(&problem, &small_config()).unwrap();
        let par = Optimizer::run(&problem, &small_config().with_parallel(true)).unwrap();
        assert_eq!(seq.result, par.result);
    }

    #[test]
    fn test_injected_rng() {
        let problem = eggs_and_rice();
        let config = small_config();
        let mut r1 = StdRng::seed_from_u64(7);
        let mut r2 = StdRng::seed_from_u64(7);
        let a = Optimizer::run_with_rng(&problem, &config, &mut r1, |_| {}, None).unwrap();
        let b = Optimizer::run_with_rng(&problem, &config, &mut r2, |_| {}, None).unwrap();
        assert_eq!(a.result, b.result);
    }

    #[test]
    fn test_progress_monotonic_and_complete() {
        let problem = eggs_and_rice();
        let config = small_config().with_generations(37);
        let mut seen = Vec::new();
        Optimizer::run_with_progress(&problem, &config, |p| seen.push(p.clone()), None).unwrap();

        assert_eq!(seen.len(), 37);
        for (i, p) in seen.iter().enumerate() {
            assert_eq!(p.generation, i + 1);
            assert!(!p.status_text.is_empty());
        }
        for w in seen.windows(2) {
            assert!(w[1].percent_complete >= w[0].percent_complete);
            assert!(w[1].best_fitness <= w[0].best_fitness);
        }
        assert_eq!(seen.last().unwrap().percent_complete, 100);
    }

    #[test]
    fn test_fitness_history_non_increasing() {
        let problem = eggs_and_rice();
        let outcome = Optimizer::run(&problem, &small_config()).unwrap();
        assert_eq!(outcome.stats.fitness_history.len(), 61);
        assert_eq!(outcome.stats.generations, 60);
        assert!(!outcome.stats.cancelled);
        for w in outcome.stats.fitness_history.windows(2) {
            assert!(w[1] <= w[0]);
        }
        assert!(outcome.stats.final_mean_fitness.is_finite());
    }

    #[test]
    fn test_unreachable_target_hits_ceiling() {
        let problem = SearchProblem::build(
            &catalog(),
            &[
                ItemRequest::new("eggs", 1.0),
                ItemRequest::new("chicken", 1.0),
                ItemRequest::new("banana", 1.0),
            ],
            PfcTriple::new(10000.0, 0.0, 0.0),
        )
        .unwrap();
        let outcome = Optimizer::run(&problem, &small_config()).unwrap();
        let best = outcome.result.best().unwrap();

        assert_eq!(outcome.stats.generations, 60);
        assert!(best.total_absolute_delta > 0.0);
        let eggs = best.menu.iter().find(|e| e.item_name == "eggs").unwrap();
        assert_eq!(eggs.quantity, 1.0);
        for entry in &best.menu {
            assert!(entry.quantity <= entry.upper_bound);
        }
    }

    #[test]
    fn test_top_n_distinct() {
        let problem = SearchProblem::build(
            &catalog(),
            &[
                ItemRequest::new("chicken", 300.0),
                ItemRequest::new("olive oil", 30.0),
                ItemRequest::new("rice", 100.0),
            ],
            PfcTriple::new(60.0, 20.0, 80.0),
        )
        .unwrap();
        let config = small_config().with_top_n(5);
        let outcome = Optimizer::run(&problem, &config).unwrap();
        let recs = &outcome.result.recommendations;
        assert!(!recs.is_empty() && recs.len() <= 5);

        let keys: Vec<Vec<i64>> = recs
            .iter()
            .map(|r| {
                r.menu
                    .iter()
                    .map(|e| (e.quantity * 100.0).round() as i64)
                    .collect()
            })
            .collect();
        for i in 0..keys.len() {
            for j in i + 1..keys.len() {
                assert_ne!(keys[i], keys[j], "recommendations {i} and {j} coincide");
            }
        }
        for w in recs.windows(2) {
            assert!(w[0].total_absolute_delta <= w[1].total_absolute_delta + 1.0);
        }
    }

    #[test]
    fn test_cancel_before_start() {
        let problem = eggs_and_rice();
        let cancel = Arc::new(AtomicBool::new(true));
        let mut calls = 0;
        let outcome =
            Optimizer::run_with_progress(&problem, &small_config(), |_| calls += 1, Some(cancel))
                .unwrap();
        assert!(outcome.stats.cancelled);
        assert_eq!(outcome.stats.generations, 0);
        assert_eq!(calls, 0);
        assert!(outcome.result.best().is_some(), "initial population still yields a result");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let problem = eggs_and_rice();
        let err = Optimizer::run(&problem, &small_config().with_population_size(0)).unwrap_err();
        assert!(matches!(err, SearchError::InvalidConfig(_)));
    }

    #[test]
    fn test_percent_complete_rounding() {
        assert_eq!(percent_complete(1, 2000), 0);
        assert_eq!(percent_complete(10, 2000), 1);
        assert_eq!(percent_complete(1000, 2000), 50);
        assert_eq!(percent_complete(2000, 2000), 100);
        assert_eq!(percent_complete(1, 3), 33);
    }
}
