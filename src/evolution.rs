use crate::config::SolverConfig;
use crate::data::{Assignment, Candidate};
use crate::fitness::FitnessEvaluator;
use crate::generator::CandidateGenerator;
use log::{debug, info, trace};
use rand::Rng;
use std::time::Instant;

/// Result of one evolutionary run.
#[derive(Debug, Clone)]
pub struct EvolutionOutcome {
    pub best: Candidate,
    /// Generations actually evolved; 0 when the seed population already hit the target.
    pub generations: usize,
    /// Best fitness of the population each time it was ranked.
    pub best_per_generation: Vec<f64>,
}

/// Generational loop: seed, rank, keep the elite, breed the rest.
pub struct EvolutionEngine<'a> {
    config: &'a SolverConfig,
    generator: &'a CandidateGenerator<'a>,
    evaluator: &'a FitnessEvaluator<'a>,
    working_days: usize,
    period_count: usize,
}

impl<'a> EvolutionEngine<'a> {
    pub fn new(
        config: &'a SolverConfig,
        generator: &'a CandidateGenerator<'a>,
        evaluator: &'a FitnessEvaluator<'a>,
        working_days: usize,
        period_count: usize,
    ) -> Self {
        Self {
            config,
            generator,
            evaluator,
            working_days,
            period_count,
        }
    }

    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> EvolutionOutcome {
        let start_time = Instant::now();
        let config = self.config;

        let mut population: Vec<Candidate> = (0..config.population_size)
            .map(|_| self.scored(self.generator.generate(rng)))
            .collect();
        debug!(
            "Seeded population of {} candidates with {} assignments each.",
            population.len(),
            population.first().map_or(0, |c| c.assignments.len())
        );

        let mut best_per_generation = Vec::with_capacity(config.max_generations + 1);
        let mut generations = 0;
        let mut reached_target = false;

        for generation in 0..config.max_generations {
            rank(&mut population);
            let best = population[0].fitness;
            best_per_generation.push(best);
            trace!("Generation {generation}: best fitness {best}");

            if best >= config.target_fitness {
                info!("Target fitness reached after {generation} generations.");
                reached_target = true;
                break;
            }

            let mut next: Vec<Candidate> = population
                .iter()
                .take(config.elite_count)
                .cloned()
                .collect();
            while next.len() < config.population_size {
                let first = tournament_select(&population, config.tournament_size, rng);
                let second = tournament_select(&population, config.tournament_size, rng);
                let child = crossover(&first.assignments, &second.assignments, rng);
                let child = mutate(
                    &child,
                    config.mutation_rate,
                    self.working_days,
                    self.period_count,
                    rng,
                );
                next.push(self.scored(child));
            }
            population = next;
            generations = generation + 1;
        }

        rank(&mut population);
        if !reached_target {
            best_per_generation.push(population[0].fitness);
        }
        let best = population.swap_remove(0);
        info!(
            "Evolution finished in {:.2?}: {} generations, best fitness {}",
            start_time.elapsed(),
            generations,
            best.fitness
        );

        EvolutionOutcome {
            best,
            generations,
            best_per_generation,
        }
    }

    fn scored(&self, assignments: Vec<Assignment>) -> Candidate {
        let fitness = self.evaluator.score(&assignments);
        Candidate {
            assignments,
            fitness,
        }
    }
}

/// Sorts best first. The sort is stable, so ties keep their order.
fn rank(population: &mut [Candidate]) {
    population.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
}

/// Fittest of `size` draws with replacement; the first of equals wins.
pub fn tournament_select<'p, R: Rng + ?Sized>(
    population: &'p [Candidate],
    size: usize,
    rng: &mut R,
) -> &'p Candidate {
    let mut best = &population[rng.random_range(0..population.len())];
    for _ in 1..size {
        let candidate = &population[rng.random_range(0..population.len())];
        if candidate.fitness > best.fitness {
            best = candidate;
        }
    }
    best
}

/// Single-point crossover: `first[..cut]` followed by `second[cut..]`.
///
/// The cut is clamped to the shorter parent. A cut that would fall between
/// the two halves of a lab pair moves back one position, so the whole pair
/// comes from `second`.
pub fn crossover<R: Rng + ?Sized>(
    first: &[Assignment],
    second: &[Assignment],
    rng: &mut R,
) -> Vec<Assignment> {
    let mut cut = if first.is_empty() {
        0
    } else {
        rng.random_range(0..first.len())
    };
    cut = cut.min(second.len());
    if cut > 0 && first[cut - 1].lab_pair {
        cut -= 1;
    }

    first[..cut]
        .iter()
        .chain(&second[cut..])
        .cloned()
        .collect()
}

/// Redraws the day and period of each assignment with probability `rate`.
/// Lab pairs move together and stay back to back. Nothing is re-validated.
pub fn mutate<R: Rng + ?Sized>(
    assignments: &[Assignment],
    rate: f64,
    working_days: usize,
    period_count: usize,
    rng: &mut R,
) -> Vec<Assignment> {
    let mut mutated = assignments.to_vec();
    let mut i = 0;
    while i < mutated.len() {
        let paired = mutated[i].lab_pair
            && mutated
                .get(i + 1)
                .is_some_and(|next| next.subject_id == mutated[i].subject_id);

        if paired {
            if period_count >= 2 && rng.random_bool(rate) {
                let day = rng.random_range(0..working_days);
                let period = rng.random_range(0..period_count - 1);
                for (offset, slot) in mutated[i..i + 2].iter_mut().enumerate() {
                    slot.day = day;
                    slot.period = period + offset;
                }
            }
            i += 2;
        } else {
            if rng.random_bool(rate) {
                mutated[i].day = rng.random_range(0..working_days);
                mutated[i].period = rng.random_range(0..period_count);
            }
            i += 1;
        }
    }
    mutated
}
