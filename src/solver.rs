use crate::data::{OutputSlot, OutputTimetable, TimetableInput, WEEKDAYS};
use crate::decoder::{active_days, decode, empty_grid};
use crate::evolution::EvolutionEngine;
use crate::fitness::FitnessEvaluator;
use crate::generator::CandidateGenerator;
use crate::periods::build_periods;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::time::Instant;

pub const NO_DATA_MESSAGE: &str =
    "No data provided. Please add teachers, subjects, and classrooms.";
pub const NO_PERIODS_MESSAGE: &str =
    "No teaching periods fit within the configured college timing.";

/// Generates a timetable with the evolutionary search.
///
/// Uses `options.seed` when set so runs can be replayed; otherwise seeds
/// from the operating system.
pub fn solve(input: &TimetableInput) -> Result<OutputTimetable, String> {
    let mut rng = match input.options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    solve_with_rng(input, &mut rng)
}

/// Same as [`solve`], drawing every random choice from `rng`.
///
/// Only invalid configuration is an error. Missing data, a day too short for
/// a single period and leftover clashes all come back as a best-effort
/// timetable with `conflicts` filled in.
pub fn solve_with_rng<R: Rng + ?Sized>(
    input: &TimetableInput,
    rng: &mut R,
) -> Result<OutputTimetable, String> {
    validate(input)?;
    let start_time = Instant::now();

    let days = active_days(input.working_days);
    let periods = build_periods(&input.timing);
    let period_count = periods.len();

    if input.subjects.is_empty() || input.teachers.is_empty() || input.classrooms.is_empty() {
        warn!("Generation skipped: teachers, subjects or classrooms missing.");
        return Ok(unsolved(days, periods, BTreeMap::new(), NO_DATA_MESSAGE));
    }
    if period_count == 0 {
        warn!(
            "Generation skipped: no period fits between {} and {}.",
            input.timing.start_time, input.timing.end_time
        );
        let grid = empty_grid(&days, 0, &input.timing);
        return Ok(unsolved(days, periods, grid, NO_PERIODS_MESSAGE));
    }
    check_quotas(input, period_count)?;

    info!(
        "Setting up search with {} subjects, {} teachers, {} rooms over {} days x {} periods...",
        input.subjects.len(),
        input.teachers.len(),
        input.classrooms.len(),
        input.working_days,
        period_count
    );
    let (generator, warnings) = CandidateGenerator::new(input, period_count);
    let evaluator = FitnessEvaluator::new(input);
    let engine = EvolutionEngine::new(
        &input.options,
        &generator,
        &evaluator,
        input.working_days,
        period_count,
    );
    let outcome = engine.run(rng);
    debug!("Best fitness by generation: {:?}", outcome.best_per_generation);

    // re-score the winner with descriptions for the report
    let evaluation = evaluator.evaluate(&outcome.best.assignments);
    let grid = decode(&outcome.best.assignments, input, &days, period_count);
    info!(
        "Timetable generated in {:.2?} with fitness {} and {} conflicts.",
        start_time.elapsed(),
        evaluation.fitness,
        evaluation.conflicts.len()
    );

    Ok(OutputTimetable {
        days,
        periods,
        grid,
        conflicts: evaluation.conflicts,
        warnings,
        unmet_soft_constraints: evaluation.unmet,
        fitness: Some(evaluation.fitness),
        generations: outcome.generations,
    })
}

fn validate(input: &TimetableInput) -> Result<(), String> {
    if !(1..=WEEKDAYS.len()).contains(&input.working_days) {
        return Err(format!(
            "workingDays must be between 1 and {}, got {}",
            WEEKDAYS.len(),
            input.working_days
        ));
    }
    input.options.validate()
}

/// A regular subject cannot meet more often than the week has slots.
fn check_quotas(input: &TimetableInput, period_count: usize) -> Result<(), String> {
    let slots = input.working_days * period_count;
    match input
        .subjects
        .iter()
        .find(|s| !s.is_lab && s.periods_per_week as usize > slots)
    {
        Some(subject) => Err(format!(
            "Subject {} needs {} periods per week but the week has only {} slots",
            subject.name, subject.periods_per_week, slots
        )),
        None => Ok(()),
    }
}

fn unsolved(
    days: Vec<String>,
    periods: Vec<String>,
    grid: BTreeMap<String, Vec<OutputSlot>>,
    message: &str,
) -> OutputTimetable {
    OutputTimetable {
        days,
        periods,
        grid,
        conflicts: vec![message.to_string()],
        warnings: Vec::new(),
        unmet_soft_constraints: Vec::new(),
        fitness: None,
        generations: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GenerationWarning, TimingConfig};
    use crate::generator::tests::{input, room, subject, teacher};
    use rand::rngs::SmallRng;

    fn one_period_day() -> TimingConfig {
        TimingConfig {
            start_time: "09:00".into(),
            end_time: "09:50".into(),
            short_break_duration: 10,
            long_break_duration: 45,
            periods_before_long_break: 4,
        }
    }

    #[test]
    fn trivially_feasible_instance_has_no_conflicts() {
        for seed in 0..10 {
            let mut input = input(
                vec![teacher("t1", "Ada")],
                vec![subject("maths", "t1", 1, false)],
                vec![room("r1", false)],
            );
            input.timing = one_period_day();
            let output = solve_with_rng(&input, &mut SmallRng::seed_from_u64(seed)).unwrap();
            assert!(output.conflicts.is_empty());
            assert_eq!(output.fitness, Some(1000.0));
            assert_eq!(output.periods, vec!["09:00 - 09:50"]);
        }
    }

    #[test]
    fn missing_subjects_short_circuit() {
        let input = input(vec![teacher("t1", "Ada")], vec![], vec![room("r1", false)]);
        let output = solve(&input).unwrap();
        assert_eq!(output.conflicts, vec![NO_DATA_MESSAGE]);
        assert!(output.grid.is_empty());
        assert_eq!(output.days.len(), 5);
        assert_eq!(output.periods.len(), 7);
        assert_eq!(output.fitness, None);
        assert_eq!(output.generations, 0);
    }

    #[test]
    fn single_slot_clash_is_reported() {
        let mut input = input(
            vec![teacher("t1", "Ada")],
            vec![subject("maths", "t1", 1, false), subject("art", "t1", 1, false)],
            vec![room("r1", false)],
        );
        input.timing = one_period_day();
        input.working_days = 1;

        let output = solve_with_rng(&input, &mut SmallRng::seed_from_u64(8)).unwrap();
        assert!(output.fitness.unwrap() < 1000.0);
        assert_eq!(output.generations, 100);
        assert!(
            output
                .conflicts
                .iter()
                .any(|c| c == "Teacher Ada has conflicting classes at Monday period 1")
        );
    }

    #[test]
    fn winning_lab_occupies_adjacent_periods() {
        let input = input(
            vec![teacher("t1", "Ada")],
            vec![subject("lab", "t1", 2, true)],
            vec![room("lab1", true)],
        );
        let output = solve_with_rng(&input, &mut SmallRng::seed_from_u64(21)).unwrap();

        let placed: Vec<(&String, usize)> = output
            .grid
            .iter()
            .flat_map(|(day, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(_, slot)| slot.subject_id == "lab")
                    .map(move |(period, _)| (day, period))
            })
            .collect();
        assert_eq!(placed.len(), 2);
        assert_eq!(placed[0].0, placed[1].0);
        assert_eq!(placed[0].1 + 1, placed[1].1);
    }

    #[test]
    fn grid_respects_day_and_period_bounds() {
        let mut input = input(
            vec![teacher("t1", "Ada"), teacher("t2", "Grace")],
            vec![subject("maths", "t1", 5, false), subject("bio", "t2", 4, false)],
            vec![room("r1", false), room("r2", false)],
        );
        input.working_days = 6;
        let output = solve_with_rng(&input, &mut SmallRng::seed_from_u64(4)).unwrap();
        assert_eq!(output.days.len(), 6);
        assert_eq!(output.grid.len(), 6);
        assert!(output.grid.values().all(|row| row.len() == output.periods.len()));
    }

    #[test]
    fn day_without_periods_yields_empty_rows() {
        let mut input = input(
            vec![teacher("t1", "Ada")],
            vec![subject("maths", "t1", 2, false)],
            vec![room("r1", false)],
        );
        input.timing.end_time = "09:30".into();
        let output = solve(&input).unwrap();
        assert!(output.periods.is_empty());
        assert_eq!(output.conflicts, vec![NO_PERIODS_MESSAGE]);
        assert_eq!(output.grid.len(), 5);
        assert!(output.grid.values().all(Vec::is_empty));
    }

    #[test]
    fn unresolved_subject_surfaces_as_warning() {
        let input = input(
            vec![teacher("t1", "Ada")],
            vec![subject("maths", "t1", 1, false), subject("art", "ghost", 1, false)],
            vec![room("r1", false)],
        );
        let output = solve_with_rng(&input, &mut SmallRng::seed_from_u64(0)).unwrap();
        assert_eq!(
            output.warnings,
            vec![GenerationWarning::UnresolvedTeacher {
                subject_id: "art".into(),
                teacher_id: "ghost".into(),
            }]
        );
        assert!(output.grid.values().flatten().all(|s| s.subject_id != "art"));
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let mut input = input(
            vec![teacher("t1", "Ada"), teacher("t2", "Grace")],
            vec![
                subject("maths", "t1", 5, false),
                subject("chem", "t2", 3, false),
                subject("chem-lab", "t2", 2, true),
            ],
            vec![room("r1", false), room("lab1", true)],
        );
        input.options.seed = Some(99);
        input.options.max_generations = 20;
        assert_eq!(solve(&input).unwrap(), solve(&input).unwrap());
    }

    #[test]
    fn quota_beyond_the_week_is_an_error() {
        let mut input = input(
            vec![teacher("t1", "Ada")],
            vec![subject("maths", "t1", 4_000_000_000, false)],
            vec![room("r1", false)],
        );
        let err = solve(&input).unwrap_err();
        assert!(err.contains("Subject maths"));
        assert!(err.contains("35 slots"));

        input.subjects[0].periods_per_week = 35;
        input.options.max_generations = 1;
        assert!(solve(&input).is_ok());
    }

    #[test]
    fn lab_quota_is_not_bounded_by_its_request() {
        let input = input(
            vec![teacher("t1", "Ada")],
            vec![subject("lab", "t1", u32::MAX, true)],
            vec![room("lab1", true)],
        );
        assert!(solve(&input).is_ok());
    }

    #[test]
    fn invalid_working_days_is_an_error() {
        let mut input = input(
            vec![teacher("t1", "Ada")],
            vec![subject("maths", "t1", 1, false)],
            vec![room("r1", false)],
        );
        input.working_days = 7;
        assert!(solve(&input).is_err());
        input.working_days = 0;
        assert!(solve(&input).is_err());
    }
}
