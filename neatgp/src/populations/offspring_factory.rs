use super::{PopulationConfig, Species, SpeciesID};
use crate::{Evaluation, Genome};

use rand::prelude::{IteratorRandom, Rng, SliceRandom};

/// Auxiliary type for offspring generation.
/// Handles all the tasks of generating a population's
/// offspring according to the specified configs
/// and allotted offspring.
pub(super) struct OffspringFactory<'a, G: Genome, R> {
    genomes: &'a [G],
    species: &'a [Species<G>],
    history: &'a G::InnovationHistory,
    genetic_config: &'a G::Config,
    population_config: &'a PopulationConfig,
    generation: usize,
    rng: &'a mut R,
}

impl<'a, G: Genome, R: Rng> OffspringFactory<'a, G, R> {
    pub(super) fn new(
        genomes: &'a [G],
        species: &'a [Species<G>],
        history: &'a G::InnovationHistory,
        genetic_config: &'a G::Config,
        population_config: &'a PopulationConfig,
        generation: usize,
        rng: &'a mut R,
    ) -> OffspringFactory<'a, G, R> {
        OffspringFactory {
            genomes,
            species,
            history,
            genetic_config,
            population_config,
            generation,
            rng,
        }
    }

    /// Generate the alloted offspring. Species members
    /// are expected to be sorted by decreasing fitness.
    ///
    /// # Panics
    /// Panics if any offspring violates the genome invariants,
    /// as that means the genetic operators are defective.
    pub(super) fn generate_offspring(&mut self, allotted_offspring: &[usize]) -> Vec<G> {
        let mut offspring = Vec::with_capacity(allotted_offspring.iter().sum());

        let all_species = self.species;
        for (species_index, &allotted) in allotted_offspring.iter().enumerate() {
            let species = &all_species[species_index];
            let elite = species.count_elite(self.population_config).min(allotted);

            offspring.extend(species.members()[..elite].iter().map(|&i| self.genomes[i].clone()));

            for child_index in elite..allotted {
                let child = self.breed(species_index);
                if let Err(e) = child.check_invariants() {
                    panic!(
                        "generation {}: offspring {} of species {:?} violates genome invariants: {}",
                        self.generation,
                        child_index,
                        species.id(),
                        e
                    );
                }
                offspring.push(child);
            }
        }

        offspring
    }

    /// Produces a single child of the species, by crossover
    /// followed by mutation, or by mutation of a single parent.
    fn breed(&mut self, species_index: usize) -> G {
        let all_species = self.species;
        let species = &all_species[species_index];
        let parent1 = self.tournament(species);

        let mut child = if self.rng.gen::<f64>() < self.population_config.crossover_chance {
            let (_, parent2) = self.choose_second_parent(species);
            G::mate(
                parent1,
                parent2,
                self.history,
                self.genetic_config,
                &mut *self.rng,
            )
        } else {
            parent1.clone()
        };
        child.mutate(self.history, self.genetic_config, &mut *self.rng);
        child.set_evaluation(Evaluation::default());
        child
    }

    /// Selects the fittest of a few randomly drawn
    /// members among the species' survivors.
    fn tournament(&mut self, species: &Species<G>) -> &'a G {
        let genomes = self.genomes;
        let survivors = &species.members()[..species.count_survivors(self.population_config)];
        (0..self.population_config.tournament_size)
            .filter_map(|_| survivors.choose(&mut *self.rng))
            .map(|&i| &genomes[i])
            .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
            .unwrap_or_else(|| panic!("no eligible parents in species {:?}", species.id()))
    }

    /// Choose a parent from the current species,
    /// or from another randomly selected.
    fn choose_second_parent(&mut self, current_species: &Species<G>) -> (SpeciesID, &'a G) {
        let all_species = self.species;
        if all_species.len() > 1
            && self.rng.gen::<f64>() < self.population_config.interspecies_mating_chance
        {
            if let Some(other_species) = all_species
                .iter()
                .filter(|s| s.id() != current_species.id() && !s.members().is_empty())
                .choose(&mut *self.rng)
            {
                return (other_species.id(), self.tournament(other_species));
            }
        }
        (current_species.id(), self.tournament(current_species))
    }
}
