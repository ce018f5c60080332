use crate::populations::PopulationConfig;
use crate::Genome;

use serde::{Deserialize, Serialize};

/// Species identifier. Specifies
/// the generation in which the species
/// was born, and the count of other species
/// generated in the _same generation_ before
/// the one identified (i.e, if it was the
/// third species born in generation 5, it
/// will be species [5, 2]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesID(pub usize, pub usize);

/// Species are collections of reproductively
/// compatible (within the current [compatibility
/// threshold]) genomes. Membership is determined by
/// calculating the genetic distance to a _representative_,
/// which is the genome that founded the species, and
/// thereafter the best member of the previous generation.
///
/// Members are stored as indices into the population's
/// genome list, which owns the genomes themselves.
///
/// Species stop receiving offspring after
/// [`stagnation_threshold`] generations without
/// improving the species' best fitness.
///
/// [compatibility threshold]: PopulationConfig::compatibility_threshold
/// [`stagnation_threshold`]: PopulationConfig::stagnation_threshold
#[derive(Debug, Clone)]
pub struct Species<G> {
    id: SpeciesID,
    pub(super) members: Vec<usize>,
    representative: G,
    age: usize,
    stagnation: usize,
    max_fitness: f64,
}

impl<G: Genome> Species<G> {
    /// Creates a new species with the specified ID and
    /// representative, whose index in the population is
    /// `founder`. The founder is the species' first member.
    pub fn new(id: SpeciesID, representative: G, founder: usize) -> Species<G> {
        Species {
            id,
            members: vec![founder],
            representative,
            age: 0,
            stagnation: 0,
            max_fitness: 0.0,
        }
    }

    /// Returns the species' ID.
    pub fn id(&self) -> SpeciesID {
        self.id
    }

    /// Returns the species' representative.
    pub fn representative(&self) -> &G {
        &self.representative
    }

    /// Returns the genetic distance between the species'
    /// representative and `other`.
    pub fn genetic_distance(&self, other: &G, config: &G::Config) -> f64 {
        G::genetic_distance(&self.representative, other, config)
    }

    /// Adds a genome, given by its index in the population, to the species.
    pub fn add_member(&mut self, index: usize) {
        self.members.push(index);
    }

    /// Returns the population indices of the species' members.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Returns an iterator over the species' members.
    pub fn genomes<'a>(&'a self, population: &'a [G]) -> impl Iterator<Item = &'a G> {
        self.members.iter().map(move |&i| &population[i])
    }

    /// Returns the number of generations the species has lived.
    pub fn age(&self) -> usize {
        self.age
    }

    /// Returns the best fitness ever reached by the species.
    pub fn max_fitness(&self) -> f64 {
        self.max_fitness
    }

    /// Returns the number of generations the species
    /// has gone without improving its best fitness.
    pub fn time_stagnated(&self) -> usize {
        self.stagnation
    }

    /// Returns the sum of the members' fitnesses.
    pub fn total_fitness(&self, population: &[G]) -> f64 {
        self.genomes(population).map(|g| g.fitness()).sum()
    }

    /// Returns the population index of the species' best member.
    pub fn champion(&self, population: &[G]) -> Option<usize> {
        self.members
            .iter()
            .copied()
            .max_by(|&a, &b| population[a].fitness().total_cmp(&population[b].fitness()))
    }

    /// Ages the species, updates its record of maximum
    /// fitness to keep track of stagnation, and makes its
    /// champion the new representative.
    pub(super) fn update(&mut self, population: &[G]) {
        self.age += 1;
        if let Some(champion) = self.champion(population) {
            let fitness = population[champion].fitness();
            if fitness > self.max_fitness {
                self.max_fitness = fitness;
                self.stagnation = 0;
            } else {
                self.stagnation += 1;
            }
            self.representative = population[champion].clone();
        }
    }

    /// Sorts the members by decreasing fitness.
    pub(super) fn sort_members(&mut self, population: &[G]) {
        self.members
            .sort_by(|&a, &b| population[b].fitness().total_cmp(&population[a].fitness()));
    }

    pub(super) fn count_elite(&self, config: &PopulationConfig) -> usize {
        self.members.len().min(config.elitism)
    }

    pub(super) fn count_survivors(&self, config: &PopulationConfig) -> usize {
        ((self.members.len() as f64 * config.survival_threshold).ceil() as usize)
            .clamp(1, self.members.len().max(1))
    }
}
