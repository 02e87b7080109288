//! Variation, selection and repair operators.
//!
//! Every operator is a plain function composed directly by the runner:
//!
//! - [`sample_gene`] / [`random_candidate`]: uniform draws inside the box
//! - [`evaluate`]: fitness caching
//! - [`tournament`]: tournament selection with replacement
//! - [`uniform_swap_crossover`]: per-dimension swap between two parents
//! - [`resample_mutation`]: per-dimension fresh draw
//! - [`repair`]: clamp to bounds and round whole-number dimensions
//!
//! # References
//!
//! - Syswerda (1989), "Uniform Crossover in Genetic Algorithms"
//! - Miller & Goldberg (1995), "Genetic Algorithms, Tournament Selection,
//!   and the Effects of Noise"

use rand::Rng;

use super::candidate::Candidate;
use super::problem::SearchProblem;

/// Draws a uniform value for dimension `dim`.
///
/// Whole-number dimensions draw a uniform integer in
/// `[ceil(lower), floor(upper)]`; other dimensions draw a uniform real in
/// `[lower, upper]`.
pub fn sample_gene<R: Rng>(problem: &SearchProblem, dim: usize, rng: &mut R) -> f64 {
    let lo = problem.lower_bounds()[dim];
    let hi = problem.upper_bounds()[dim];
    if problem.is_integer(dim) {
        let lo = lo.ceil() as i64;
        let hi = (hi.floor() as i64).max(lo);
        rng.random_range(lo..=hi) as f64
    } else {
        rng.random_range(lo..=hi)
    }
}

/// Creates an unevaluated candidate with every dimension drawn independently.
pub fn random_candidate<R: Rng>(problem: &SearchProblem, rng: &mut R) -> Candidate {
    let genes = (0..problem.dims())
        .map(|dim| sample_gene(problem, dim, rng))
        .collect();
    Candidate::new(genes)
}

/// Evaluates `candidate` unless its cached fitness is still valid.
pub fn evaluate(problem: &SearchProblem, candidate: &mut Candidate) {
    if !candidate.is_evaluated() {
        let f = problem.fitness(candidate.genes());
        candidate.set_fitness(f);
    }
}

/// Tournament selection: draw `k` candidates with replacement, return the
/// index of the lowest fitness.
///
/// # Panics
/// Panics if `population` is empty.
pub fn tournament<R: Rng>(population: &[Candidate], k: usize, rng: &mut R) -> usize {
    assert!(
        !population.is_empty(),
        "cannot select from empty population"
    );
    let k = k.max(1);
    let n = population.len();

    let mut best_idx = rng.random_range(0..n);
    for _ in 1..k {
        let idx = rng.random_range(0..n);
        if population[idx].fitness_or_worst() < population[best_idx].fitness_or_worst() {
            best_idx = idx;
        }
    }
    best_idx
}

/// Uniform swap crossover: each dimension is swapped between the two
/// parents with probability 0.5. Both parents become children in place.
///
/// # Panics
/// Panics if the parents have different lengths.
pub fn uniform_swap_crossover<R: Rng>(a: &mut Candidate, b: &mut Candidate, rng: &mut R) {
    assert_eq!(
        a.genes().len(),
        b.genes().len(),
        "parents must have equal length"
    );
    let (ga, gb) = (a.genes_mut(), b.genes_mut());
    for (x, y) in ga.iter_mut().zip(gb.iter_mut()) {
        if rng.random_bool(0.5) {
            std::mem::swap(x, y);
        }
    }
}

/// Resampling mutation: each dimension is replaced by a fresh
/// [`sample_gene`] draw with probability `gene_probability`.
pub fn resample_mutation<R: Rng>(
    problem: &SearchProblem,
    candidate: &mut Candidate,
    gene_probability: f64,
    rng: &mut R,
) {
    let genes = candidate.genes_mut();
    for (dim, gene) in genes.iter_mut().enumerate() {
        if rng.random_bool(gene_probability) {
            *gene = sample_gene(problem, dim, rng);
        }
    }
}

/// Returns a feasible copy of `genes`: every dimension clamped to its
/// bounds, whole-number dimensions rounded to the nearest integer that
/// still fits.
pub fn repair(problem: &SearchProblem, genes: &[f64]) -> Vec<f64> {
    let lower = problem.lower_bounds();
    let upper = problem.upper_bounds();
    genes
        .iter()
        .enumerate()
        .map(|(dim, &g)| {
            let g = if g.is_nan() { lower[dim] } else { g };
            let clamped = g.clamp(lower[dim], upper[dim]);
            if problem.is_integer(dim) {
                let rounded = clamped.round();
                if rounded > upper[dim] {
                    upper[dim].floor()
                } else if rounded < lower[dim] {
                    lower[dim].ceil()
                } else {
                    rounded
                }
            } else {
                clamped
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ItemCatalog, ItemProfile};
    use crate::search::problem::{ItemRequest, PfcTriple};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn problem(egg_max: f64, rice_max: f64) -> SearchProblem {
        let catalog = ItemCatalog::new()
            .with_item("eggs", ItemProfile::new(6.0, 5.0, 0.5, "個"))
            .with_item("rice", ItemProfile::new(2.5, 0.3, 28.0, "g"));
        SearchProblem::build(
            &catalog,
            &[
                ItemRequest::new("eggs", egg_max),
                ItemRequest::new("rice", rice_max),
            ],
            PfcTriple::new(20.0, 10.0, 50.0),
        )
        .unwrap()
    }

    fn with_fitness(values: &[f64]) -> Vec<Candidate> {
        values
            .iter()
            .map(|&f| {
                let mut c = Candidate::new(vec![f]);
                c.set_fitness(f);
                c
            })
            .collect()
    }

    #[test]
    fn test_sample_gene_respects_kind_and_bounds() {
        let p = problem(4.0, 200.0);
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen_fraction = false;
        for _ in 0..1000 {
            let eggs = sample_gene(&p, 0, &mut rng);
            assert!((0.0..=4.0).contains(&eggs));
            assert_eq!(eggs.fract(), 0.0);

            let rice = sample_gene(&p, 1, &mut rng);
            assert!((0.0..=200.0).contains(&rice));
            seen_fraction |= rice.fract() != 0.0;
        }
        assert!(seen_fraction, "continuous dimension should not be integral");
    }

    #[test]
    fn test_sample_gene_fractional_integer_bound() {
        let p = problem(0.5, 1.0);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(sample_gene(&p, 0, &mut rng), 0.0);
        }
    }

    #[test]
    fn test_evaluate_uses_cache() {
        let p = problem(4.0, 200.0);
        let mut c = Candidate::new(vec![1.0, 1.0]);
        evaluate(&p, &mut c);
        let expected = p.fitness(&[1.0, 1.0]);
        assert_eq!(c.fitness(), Some(expected));

        // A stale value survives re-evaluation while the cache is valid.
        c.set_fitness(-1.0);
        evaluate(&p, &mut c);
        assert_eq!(c.fitness(), Some(-1.0));

        c.genes_mut()[0] = 2.0;
        evaluate(&p, &mut c);
        assert_eq!(c.fitness(), Some(p.fitness(&[2.0, 1.0])));
    }

    #[test]
    fn test_tournament_favors_best() {
        let pop = with_fitness(&[10.0, 5.0, 1.0, 8.0]);
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = [0u32; 4];
        let n = 10000;
        for _ in 0..n {
            counts[tournament(&pop, 5, &mut rng)] += 1;
        }
        assert!(
            counts[2] > 6000,
            "expected best to win >60% of tournaments, got {}/{n}",
            counts[2]
        );
    }

    #[test]
    fn test_tournament_size_1_is_random() {
        let pop = with_fitness(&[10.0, 5.0, 1.0, 8.0]);
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = [0u32; 4];
        for _ in 0..10000 {
            counts[tournament(&pop, 1, &mut rng)] += 1;
        }
        for &c in &counts {
            assert!(c > 1500, "expected uniform, got counts: {counts:?}");
        }
    }

    #[test]
    #[should_panic(expected = "cannot select from empty population")]
    fn test_tournament_empty_panics() {
        let mut rng = StdRng::seed_from_u64(42);
        tournament(&[], 5, &mut rng);
    }

    #[test]
    fn test_crossover_invalidates_fitness() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut a = Candidate::new(vec![1.0; 8]);
        let mut b = Candidate::new(vec![2.0; 8]);
        a.set_fitness(0.0);
        b.set_fitness(0.0);
        uniform_swap_crossover(&mut a, &mut b, &mut rng);
        assert!(!a.is_evaluated() && !b.is_evaluated());
    }

    #[test]
    fn test_mutation_probability_extremes() {
        let p = problem(4.0, 200.0);
        let mut rng = StdRng::seed_from_u64(9);

        let mut c = Candidate::new(vec![-7.0, -7.0]);
        resample_mutation(&p, &mut c, 0.0, &mut rng);
        assert_eq!(c.genes(), &[-7.0, -7.0]);

        resample_mutation(&p, &mut c, 1.0, &mut rng);
        assert!(c.genes().iter().all(|&g| g >= 0.0));
        assert_eq!(c.genes()[0].fract(), 0.0);
    }

    #[test]
    fn test_repair_examples() {
        let p = problem(4.0, 200.0);
        assert_eq!(repair(&p, &[2.4, 150.256]), vec![2.0, 150.256]);
        assert_eq!(repair(&p, &[-3.0, -1.0]), vec![0.0, 0.0]);
        assert_eq!(repair(&p, &[9.7, 250.0]), vec![4.0, 200.0]);
        assert_eq!(repair(&p, &[f64::NAN, 1.0]), vec![0.0, 1.0]);
    }

    #[test]
    fn test_repair_fractional_integer_bound() {
        let p = problem(4.5, 200.0);
        assert_eq!(repair(&p, &[4.5, 0.0])[0], 4.0);
        assert_eq!(repair(&p, &[100.0, 0.0])[0], 4.0);
    }

    proptest! {
        #[test]
        fn prop_repair_is_feasible(
            egg_max in 0.1f64..20.0,
            rice_max in 0.1f64..500.0,
            eggs in -100.0f64..100.0,
            rice in -1000.0f64..1000.0,
        ) {
            let p = problem(egg_max, rice_max);
            let fixed = repair(&p, &[eggs, rice]);
            prop_assert!(fixed[0] >= 0.0 && fixed[0] <= egg_max);
            prop_assert_eq!(fixed[0].fract(), 0.0);
            prop_assert!(fixed[1] >= 0.0 && fixed[1] <= rice_max);
        }

        #[test]
        fn prop_crossover_conserves_genes(
            xs in proptest::collection::vec(-50.0f64..50.0, 1..16),
            seed in any::<u64>(),
        ) {
            let ys: Vec<f64> = xs.iter().map(|x| x + 100.0).collect();
            let mut a = Candidate::new(xs.clone());
            let mut b = Candidate::new(ys.clone());
            let mut rng = StdRng::seed_from_u64(seed);
            uniform_swap_crossover(&mut a, &mut b, &mut rng);
            for i in 0..xs.len() {
                let pair = (a.genes()[i], b.genes()[i]);
                prop_assert!(pair == (xs[i], ys[i]) || pair == (ys[i], xs[i]));
            }
        }
    }
}
