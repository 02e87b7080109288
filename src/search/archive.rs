//! Elite archive of the best candidates seen during a run.

use std::collections::HashSet;

use super::candidate::Candidate;

/// Bounded archive of the best distinct candidates ever evaluated.
///
/// Members are kept sorted by ascending fitness. A candidate enters when
/// the archive has room or it beats the current worst member, unless a
/// member with an identical genotype is already present. Membership
/// survives the candidate leaving the population.
#[derive(Debug, Clone)]
pub struct EliteArchive {
    capacity: usize,
    members: Vec<Candidate>,
}

impl EliteArchive {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            members: Vec::with_capacity(capacity + 1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in ascending fitness order.
    pub fn members(&self) -> &[Candidate] {
        &self.members
    }

    /// The best candidate seen so far.
    pub fn best(&self) -> Option<&Candidate> {
        self.members.first()
    }

    /// Merges evaluated candidates into the archive. Unevaluated ones are
    /// ignored.
    pub fn update<'a, I>(&mut self, candidates: I)
    where
        I: IntoIterator<Item = &'a Candidate>,
    {
        if self.capacity == 0 {
            return;
        }
        for candidate in candidates {
            let Some(fitness) = candidate.fitness() else {
                continue;
            };
            let full = self.members.len() >= self.capacity;
            if full && fitness >= self.worst_fitness() {
                continue;
            }
            if self.members.iter().any(|m| m.genes() == candidate.genes()) {
                continue;
            }
            // insert after members of equal fitness
            let pos = self
                .members
                .partition_point(|m| m.fitness_or_worst() <= fitness);
            self.members.insert(pos, candidate.clone());
            self.members.truncate(self.capacity);
        }
    }

    /// Up to `n` best members whose genotypes differ once rounded to
    /// `decimals` places.
    pub fn distinct_top(&self, n: usize, decimals: u32) -> Vec<&Candidate> {
        let mut seen = HashSet::new();
        self.members
            .iter()
            .filter(|c| seen.insert(c.rounded_key(decimals)))
            .take(n)
            .collect()
    }

    fn worst_fitness(&self) -> f64 {
        self.members
            .last()
            .map_or(f64::INFINITY, Candidate::fitness_or_worst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(genes: &[f64], fitness: f64) -> Candidate {
        let mut c = Candidate::new(genes.to_vec());
        c.set_fitness(fitness);
        c
    }

    fn fitnesses(archive: &EliteArchive) -> Vec<f64> {
        archive
            .members()
            .iter()
            .map(Candidate::fitness_or_worst)
            .collect()
    }

    #[test]
    fn test_keeps_best_sorted() {
        let mut archive = EliteArchive::new(3);
        let pop: Vec<_> = [5.0, 1.0, 4.0, 2.0, 3.0]
            .iter()
            .map(|&f| cand(&[f], f))
            .collect();
        archive.update(&pop);
        assert_eq!(fitnesses(&archive), vec![1.0, 2.0, 3.0]);
        assert_eq!(archive.best().unwrap().genes(), &[1.0]);
    }

    #[test]
    fn test_membership_survives_population_turnover() {
        let mut archive = EliteArchive::new(2);
        archive.update(&[cand(&[0.0], 0.5), cand(&[1.0], 7.0)]);
        archive.update(&[cand(&[2.0], 9.0), cand(&[3.0], 3.0)]);
        assert_eq!(fitnesses(&archive), vec![0.5, 3.0]);
    }

    #[test]
    fn test_rejects_duplicate_genotype() {
        let mut archive = EliteArchive::new(5);
        archive.update(&[cand(&[1.0, 2.0], 4.0), cand(&[1.0, 2.0], 4.0)]);
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn test_ignores_unevaluated() {
        let mut archive = EliteArchive::new(5);
        archive.update(&[Candidate::new(vec![1.0])]);
        assert!(archive.is_empty());
    }

    #[test]
    fn test_worse_candidate_rejected_when_full() {
        let mut archive = EliteArchive::new(2);
        archive.update(&[cand(&[1.0], 1.0), cand(&[2.0], 2.0)]);
        archive.update(&[cand(&[3.0], 2.0), cand(&[4.0], 8.0)]);
        assert_eq!(fitnesses(&archive), vec![1.0, 2.0]);
        assert_eq!(archive.members()[1].genes(), &[2.0]);
    }

    #[test]
    fn test_distinct_top_dedups_by_rounding() {
        let mut archive = EliteArchive::new(10);
        archive.update(&[
            cand(&[1.001, 3.0], 0.1),
            cand(&[1.004, 3.0], 0.2),
            cand(&[1.5, 3.0], 0.3),
            cand(&[2.0, 3.0], 0.4),
        ]);
        assert_eq!(archive.len(), 4);

        let top = archive.distinct_top(10, 2);
        let genes: Vec<_> = top.iter().map(|c| c.genes()[0]).collect();
        assert_eq!(genes, vec![1.001, 1.5, 2.0]);

        let top1 = archive.distinct_top(1, 2);
        assert_eq!(top1.len(), 1);
        assert_eq!(top1[0].fitness(), Some(0.1));
    }
}
