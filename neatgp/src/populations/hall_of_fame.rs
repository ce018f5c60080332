use crate::Genome;

/// A bounded archive of the best genomes seen
/// over the course of evolution, sorted by
/// decreasing fitness.
///
/// Entries are copies, decoupled from the live
/// population, so later mutation of population
/// members never alters them. Genomes equal to an
/// existing entry are not admitted twice.
#[derive(Clone, Debug)]
pub struct HallOfFame<G> {
    capacity: usize,
    entries: Vec<G>,
}

impl<G: Genome> HallOfFame<G> {
    /// Creates an empty hall of fame holding at most `capacity` genomes.
    pub fn new(capacity: usize) -> HallOfFame<G> {
        HallOfFame {
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Offers each candidate for admission. Candidates
    /// with zero fitness are never admitted.
    ///
    /// Returns the number of genomes admitted.
    pub fn update<'a>(&mut self, candidates: impl IntoIterator<Item = &'a G>) -> usize
    where
        G: 'a,
    {
        let mut candidates: Vec<&G> = candidates
            .into_iter()
            .filter(|g| g.fitness() > 0.0)
            .collect();
        candidates.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));

        let mut admitted = 0;
        for candidate in candidates {
            if self.entries.len() == self.capacity
                && self
                    .entries
                    .last()
                    .map_or(false, |worst| candidate.fitness() <= worst.fitness())
            {
                // Candidates are sorted, so no later one can get in either.
                break;
            }
            if self.entries.iter().any(|e| e == candidate) {
                continue;
            }
            let position = self
                .entries
                .partition_point(|e| e.fitness() >= candidate.fitness());
            self.entries.insert(position, candidate.clone());
            self.entries.truncate(self.capacity);
            admitted += 1;
        }
        admitted
    }

    /// Returns the best genome admitted so far.
    pub fn best(&self) -> Option<&G> {
        self.entries.first()
    }

    /// Returns an iterator over the entries, best first.
    pub fn iter(&self) -> impl Iterator<Item = &G> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
