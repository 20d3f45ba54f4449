use crate::data::{
    Assignment, Classroom, DayIndex, PeriodIndex, RuleSet, Subject, Teacher, TimetableInput,
    UnmetSoftConstraint, WEEKDAYS,
};
use itertools::Itertools;
use std::collections::{HashMap, HashSet};

/// Score of a schedule with nothing to penalise.
pub const BASE_FITNESS: f64 = 1000.0;

const DOUBLE_BOOKING_PENALTY: f64 = 100.0;
const CONTINUOUS_PERIOD_PENALTY: f64 = 20.0;
const WORKLOAD_VARIANCE_WEIGHT: f64 = 5.0;
const EXCESS_PERIOD_PENALTY: f64 = 10.0;
const REPEATED_LAB_PENALTY: f64 = 50.0;
const HEAVY_ADJACENT_PENALTY: f64 = 15.0;
const RESTRICTED_PERIOD_PENALTY: f64 = 50.0;

/// Result of a detailed fitness pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub fitness: f64,
    /// Double bookings, one line per repeated (teacher|room, day, period).
    pub conflicts: Vec<String>,
    pub unmet: Vec<UnmetSoftConstraint>,
}

/// Accumulates penalties; descriptions are only built for a detailed pass.
struct Tally {
    detailed: bool,
    evaluation: Evaluation,
}

impl Tally {
    fn conflict(&mut self, describe: impl FnOnce() -> String) {
        self.evaluation.fitness -= DOUBLE_BOOKING_PENALTY;
        if self.detailed {
            self.evaluation.conflicts.push(describe());
        }
    }

    fn soft(&mut self, penalty: f64, constraint_type: &str, describe: impl FnOnce() -> String) {
        if penalty <= 0.0 {
            return;
        }
        self.evaluation.fitness -= penalty;
        if self.detailed {
            self.evaluation.unmet.push(UnmetSoftConstraint {
                constraint_type: constraint_type.to_string(),
                description: describe(),
            });
        }
    }
}

/// Scores candidate schedules against the hard and soft rules.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator<'a> {
    teachers: HashMap<&'a str, &'a Teacher>,
    rooms: HashMap<&'a str, &'a Classroom>,
    subjects: HashMap<&'a str, &'a Subject>,
    rules: &'a RuleSet,
}

impl<'a> FitnessEvaluator<'a> {
    pub fn new(input: &'a TimetableInput) -> Self {
        Self {
            teachers: input.teachers.iter().map(|t| (t.id.as_str(), t)).collect(),
            rooms: input.classrooms.iter().map(|r| (r.id.as_str(), r)).collect(),
            subjects: input.subjects.iter().map(|s| (s.id.as_str(), s)).collect(),
            rules: &input.rules,
        }
    }

    /// Fitness only; used inside the generational loop.
    pub fn score(&self, assignments: &[Assignment]) -> f64 {
        self.assess(assignments, false).fitness
    }

    /// Fitness plus the conflict and soft-constraint descriptions.
    pub fn evaluate(&self, assignments: &[Assignment]) -> Evaluation {
        self.assess(assignments, true)
    }

    fn assess(&self, assignments: &[Assignment], detailed: bool) -> Evaluation {
        let mut tally = Tally {
            detailed,
            evaluation: Evaluation {
                fitness: BASE_FITNESS,
                conflicts: Vec::new(),
                unmet: Vec::new(),
            },
        };

        self.check_double_bookings(assignments, &mut tally);

        let teacher_day_periods: HashMap<(&str, DayIndex), Vec<PeriodIndex>> = assignments
            .iter()
            .map(|a| ((a.teacher_id.as_str(), a.day), a.period))
            .into_group_map();

        if self.rules.no_teacher_continuous_periods {
            self.check_continuous_periods(&teacher_day_periods, &mut tally);
        }
        if self.rules.balanced_workload {
            self.check_workload_balance(&teacher_day_periods, &mut tally);
        }
        if self.rules.max_classes_per_teacher_per_day > 0 {
            self.check_teacher_daily_limit(&teacher_day_periods, &mut tally);
        }
        if self.rules.daily_max_periods_per_class > 0 {
            self.check_class_daily_limit(assignments, &mut tally);
        }
        if self.rules.labs_once_per_week {
            self.check_labs_once_per_week(assignments, &mut tally);
        }
        if self.rules.avoid_heavy_subjects_adjacent {
            self.check_heavy_adjacency(assignments, &mut tally);
        }
        self.check_restricted_periods(assignments, &mut tally);

        tally.evaluation
    }

    // hard constraints: no teacher or room in two places at once
    fn check_double_bookings(&self, assignments: &[Assignment], tally: &mut Tally) {
        let mut teacher_slots = HashSet::new();
        let mut room_slots = HashSet::new();

        for a in assignments {
            if !teacher_slots.insert((a.teacher_id.as_str(), a.day, a.period)) {
                tally.conflict(|| {
                    format!(
                        "Teacher {} has conflicting classes at {} period {}",
                        self.teacher_name(&a.teacher_id),
                        day_name(a.day),
                        a.period + 1
                    )
                });
            }
            if !room_slots.insert((a.room_id.as_str(), a.day, a.period)) {
                tally.conflict(|| {
                    format!(
                        "Room {} is double-booked at {} period {}",
                        self.room_name(&a.room_id),
                        day_name(a.day),
                        a.period + 1
                    )
                });
            }
        }
    }

    fn check_continuous_periods(
        &self,
        teacher_day_periods: &HashMap<(&str, DayIndex), Vec<PeriodIndex>>,
        tally: &mut Tally,
    ) {
        for ((teacher_id, day), periods) in sorted_entries(teacher_day_periods) {
            let mut periods = periods.clone();
            periods.sort_unstable();
            for run in consecutive_runs(&periods).into_iter().filter(|&run| run > 2) {
                tally.soft(
                    CONTINUOUS_PERIOD_PENALTY * (run - 2) as f64,
                    "No Continuous Periods",
                    || {
                        format!(
                            "Teacher {} teaches {} periods in a row on {}.",
                            self.teacher_name(teacher_id),
                            run,
                            day_name(*day)
                        )
                    },
                );
            }
        }
    }

    fn check_workload_balance(
        &self,
        teacher_day_periods: &HashMap<(&str, DayIndex), Vec<PeriodIndex>>,
        tally: &mut Tally,
    ) {
        let daily_loads: HashMap<&str, Vec<usize>> = teacher_day_periods
            .iter()
            .map(|((teacher_id, _), periods)| (*teacher_id, periods.len()))
            .into_group_map();

        for (teacher_id, loads) in sorted_entries(&daily_loads) {
            let mut loads = loads.clone();
            // fixed summation order keeps seeded runs reproducible
            loads.sort_unstable();
            let variance = population_variance(&loads);
            tally.soft(WORKLOAD_VARIANCE_WEIGHT * variance, "Balanced Workload", || {
                format!(
                    "Teacher {} has an uneven weekly load (daily counts {:?}, variance {:.2}).",
                    self.teacher_name(teacher_id),
                    loads,
                    variance
                )
            });
        }
    }

    fn check_teacher_daily_limit(
        &self,
        teacher_day_periods: &HashMap<(&str, DayIndex), Vec<PeriodIndex>>,
        tally: &mut Tally,
    ) {
        let limit = self.rules.max_classes_per_teacher_per_day as usize;
        for ((teacher_id, day), periods) in sorted_entries(teacher_day_periods) {
            let excess = periods.len().saturating_sub(limit);
            tally.soft(
                EXCESS_PERIOD_PENALTY * excess as f64,
                "Max Classes Per Teacher Per Day",
                || {
                    format!(
                        "Teacher {} has {} classes on {}, limit is {}.",
                        self.teacher_name(teacher_id),
                        periods.len(),
                        day_name(*day),
                        limit
                    )
                },
            );
        }
    }

    fn check_class_daily_limit(&self, assignments: &[Assignment], tally: &mut Tally) {
        let limit = self.rules.daily_max_periods_per_class as usize;
        let occupied: HashMap<DayIndex, HashSet<PeriodIndex>> = assignments
            .iter()
            .map(|a| (a.day, a.period))
            .into_grouping_map()
            .collect();

        for (day, periods) in sorted_entries(&occupied) {
            let excess = periods.len().saturating_sub(limit);
            tally.soft(
                EXCESS_PERIOD_PENALTY * excess as f64,
                "Daily Max Periods",
                || {
                    format!(
                        "{} has {} periods scheduled, limit is {}.",
                        day_name(*day),
                        periods.len(),
                        limit
                    )
                },
            );
        }
    }

    fn check_labs_once_per_week(&self, assignments: &[Assignment], tally: &mut Tally) {
        let lab_days: HashMap<&str, HashSet<DayIndex>> = assignments
            .iter()
            .filter(|a| self.subjects.get(a.subject_id.as_str()).is_some_and(|s| s.is_lab))
            .map(|a| (a.subject_id.as_str(), a.day))
            .into_grouping_map()
            .collect();

        for (subject_id, days) in sorted_entries(&lab_days) {
            let extra = days.len().saturating_sub(1);
            tally.soft(REPEATED_LAB_PENALTY * extra as f64, "Labs Once Per Week", || {
                format!(
                    "Lab {} meets on {} different days.",
                    self.subject_name(subject_id),
                    days.len()
                )
            });
        }
    }

    fn check_heavy_adjacency(&self, assignments: &[Assignment], tally: &mut Tally) {
        let heavy: HashMap<(DayIndex, PeriodIndex), HashSet<&str>> = assignments
            .iter()
            .filter(|a| self.subjects.get(a.subject_id.as_str()).is_some_and(|s| s.heavy))
            .map(|a| ((a.day, a.period), a.subject_id.as_str()))
            .into_grouping_map()
            .collect();

        for ((day, period), here) in sorted_entries(&heavy) {
            let Some(next) = heavy.get(&(*day, period + 1)) else {
                continue;
            };
            let clash = here
                .iter()
                .cartesian_product(next.iter())
                .find(|(a, b)| a != b);
            if let Some((first, second)) = clash {
                tally.soft(HEAVY_ADJACENT_PENALTY, "Avoid Heavy Subjects Adjacent", || {
                    format!(
                        "Heavy subjects {} and {} are back to back on {} periods {} and {}.",
                        self.subject_name(first),
                        self.subject_name(second),
                        day_name(*day),
                        period + 1,
                        period + 2
                    )
                });
            }
        }
    }

    // the generator avoids these; mutation may not
    fn check_restricted_periods(&self, assignments: &[Assignment], tally: &mut Tally) {
        if self.rules.restricted_periods.is_empty() {
            return;
        }
        for a in assignments {
            let is_lab = self
                .subjects
                .get(a.subject_id.as_str())
                .is_some_and(|s| s.is_lab);
            if !is_lab && self.rules.is_restricted(day_name(a.day), a.period) {
                tally.soft(RESTRICTED_PERIOD_PENALTY, "Restricted Period", || {
                    format!(
                        "{} is placed in restricted {} period {}.",
                        self.subject_name(&a.subject_id),
                        day_name(a.day),
                        a.period + 1
                    )
                });
            }
        }
    }

    fn teacher_name<'b>(&'b self, id: &'b str) -> &'b str {
        self.teachers.get(id).map_or(id, |t| t.name.as_str())
    }

    fn room_name<'b>(&'b self, id: &'b str) -> &'b str {
        self.rooms.get(id).map_or(id, |r| r.name.as_str())
    }

    fn subject_name<'b>(&'b self, id: &'b str) -> &'b str {
        self.subjects.get(id).map_or(id, |s| s.name.as_str())
    }
}

fn day_name(day: DayIndex) -> &'static str {
    WEEKDAYS.get(day).copied().unwrap_or("Unknown day")
}

/// Map entries in key order, so penalties are summed deterministically.
fn sorted_entries<K: Ord, V>(map: &HashMap<K, V>) -> Vec<(&K, &V)> {
    map.iter().sorted_by(|a, b| a.0.cmp(b.0)).collect()
}

/// Lengths of the runs of consecutive integers in a sorted slice.
fn consecutive_runs(sorted: &[PeriodIndex]) -> Vec<usize> {
    let mut runs = Vec::new();
    let mut run = 0;
    for (i, &period) in sorted.iter().enumerate() {
        if i > 0 && period == sorted[i - 1] + 1 {
            run += 1;
        } else {
            if run > 0 {
                runs.push(run);
            }
            run = 1;
        }
    }
    if run > 0 {
        runs.push(run);
    }
    runs
}

fn population_variance(values: &[usize]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<usize>() as f64 / n;
    values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / n
}
