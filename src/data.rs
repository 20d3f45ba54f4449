use crate::config::SolverConfig;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

// Type aliases for clarity
pub type TeacherId = String;
pub type SubjectId = String;
pub type RoomId = String;
pub type DayIndex = usize;
pub type PeriodIndex = usize;

pub const WEEKDAYS: [&str; 6] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Periods a lab occupies, always back to back on one day.
pub const LAB_PERIODS: u32 = 2;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    #[serde(default)]
    pub department: String,
    /// Informational only; the owning link lives on [`Subject::teacher_id`].
    #[serde(default)]
    pub subjects: Vec<SubjectId>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub teacher_id: TeacherId,
    pub periods_per_week: u32,
    pub is_lab: bool,
    #[serde(default)]
    pub heavy: bool,
}

impl Subject {
    /// Periods to place per week. Labs are fixed at a single double period.
    pub fn weekly_quota(&self) -> u32 {
        if self.is_lab {
            LAB_PERIODS
        } else {
            self.periods_per_week
        }
    }
}

/// A physical room. Capacity is carried through but not scheduled against.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classroom {
    pub id: RoomId,
    pub name: String,
    #[serde(default)]
    pub capacity: u32,
    pub is_lab: bool,
}

/// Operating hours of a college day. Durations are in minutes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingConfig {
    pub start_time: String,
    pub end_time: String,
    pub short_break_duration: u32,
    pub long_break_duration: u32,
    pub periods_before_long_break: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            start_time: "09:00".to_string(),
            end_time: "17:00".to_string(),
            short_break_duration: 10,
            long_break_duration: 45,
            periods_before_long_break: 4,
        }
    }
}

impl TimingConfig {
    /// True when period `index` is the last one before a long break and
    /// not the final period of a `period_count`-long day.
    pub fn precedes_long_break(&self, index: PeriodIndex, period_count: usize) -> bool {
        let every = self.periods_before_long_break as usize;
        every > 0 && (index + 1) % every == 0 && index + 1 < period_count
    }
}

/// Scheduling rules. Every field is a soft penalty term of the fitness
/// function except `restricted_periods`, which the generator also honours.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleSet {
    pub no_teacher_continuous_periods: bool,
    pub max_classes_per_teacher_per_day: u32,
    pub labs_once_per_week: bool,
    pub daily_max_periods_per_class: u32,
    pub avoid_heavy_subjects_adjacent: bool,
    pub balanced_workload: bool,
    /// Weekday name -> period indices no regular subject may use.
    pub restricted_periods: HashMap<String, Vec<PeriodIndex>>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            no_teacher_continuous_periods: true,
            max_classes_per_teacher_per_day: 6,
            labs_once_per_week: true,
            daily_max_periods_per_class: 8,
            avoid_heavy_subjects_adjacent: true,
            balanced_workload: true,
            restricted_periods: HashMap::new(),
        }
    }
}

impl RuleSet {
    pub fn is_restricted(&self, day_name: &str, period: PeriodIndex) -> bool {
        self.restricted_periods
            .get(day_name)
            .is_some_and(|periods| periods.contains(&period))
    }
}

fn default_working_days() -> usize {
    5
}

/// The complete input for one timetable generation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableInput {
    pub teachers: Vec<Teacher>,
    pub subjects: Vec<Subject>,
    pub classrooms: Vec<Classroom>,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default = "default_working_days")]
    pub working_days: usize,
    #[serde(default)]
    pub rules: RuleSet,
    #[serde(default)]
    pub options: SolverConfig,
}

/// One subject placed in one day/period slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
    pub room_id: RoomId,
    pub day: DayIndex,
    pub period: PeriodIndex,
    /// Set on the first half of a lab; the second half follows it directly.
    #[serde(default)]
    pub lab_pair: bool,
}

/// A trial schedule and its score.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub assignments: Vec<Assignment>,
    pub fitness: f64,
}

/// Describes a soft constraint that was not met in the final schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmetSoftConstraint {
    pub constraint_type: String,
    pub description: String,
}

impl fmt::Display for UnmetSoftConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.constraint_type, self.description)
    }
}

/// A subject left out of every candidate, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GenerationWarning {
    #[serde(rename_all = "camelCase")]
    UnresolvedTeacher {
        subject_id: SubjectId,
        teacher_id: TeacherId,
    },
    #[serde(rename_all = "camelCase")]
    NoMatchingRoom { subject_id: SubjectId, is_lab: bool },
    #[serde(rename_all = "camelCase")]
    LabNeedsTwoPeriods { subject_id: SubjectId },
    #[serde(rename_all = "camelCase")]
    NoOpenPeriod { subject_id: SubjectId },
}

impl fmt::Display for GenerationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedTeacher {
                subject_id,
                teacher_id,
            } => write!(
                f,
                "Subject {subject_id} skipped: teacher {teacher_id} not found"
            ),
            Self::NoMatchingRoom { subject_id, is_lab } => write!(
                f,
                "Subject {subject_id} skipped: no {} room available",
                if *is_lab { "lab" } else { "regular" }
            ),
            Self::LabNeedsTwoPeriods { subject_id } => write!(
                f,
                "Lab {subject_id} skipped: a day has fewer than two periods"
            ),
            Self::NoOpenPeriod { subject_id } => write!(
                f,
                "Subject {subject_id} skipped: every period of the week is restricted"
            ),
        }
    }
}

/// One cell of the output grid. An empty slot still carries its break flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSlot {
    pub subject: String,
    pub subject_id: String,
    pub teacher: String,
    pub teacher_id: String,
    pub room: String,
    pub room_id: String,
    pub is_break: bool,
    pub is_long_break: bool,
    pub is_lab: bool,
    /// Display group 1..=8; 0 for an empty slot.
    pub color: u8,
}

/// The final output of the solver.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputTimetable {
    pub days: Vec<String>,
    pub periods: Vec<String>,
    pub grid: BTreeMap<String, Vec<OutputSlot>>,
    pub conflicts: Vec<String>,
    pub warnings: Vec<GenerationWarning>,
    pub unmet_soft_constraints: Vec<UnmetSoftConstraint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fitness: Option<f64>,
    pub generations: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lab_quota_is_fixed() {
        let lab = Subject {
            id: "s1".into(),
            name: "Physics Lab".into(),
            teacher_id: "t1".into(),
            periods_per_week: 5,
            is_lab: true,
            heavy: false,
        };
        assert_eq!(lab.weekly_quota(), 2);
    }

    #[test]
    fn long_break_flag_skips_last_period() {
        let timing = TimingConfig::default();
        assert!(timing.precedes_long_break(3, 7));
        assert!(!timing.precedes_long_break(2, 7));
        assert!(!timing.precedes_long_break(3, 4));
    }

    #[test]
    fn long_break_flag_without_long_breaks() {
        let timing = TimingConfig {
            periods_before_long_break: 0,
            ..TimingConfig::default()
        };
        assert!(!timing.precedes_long_break(3, 7));
    }

    #[test]
    fn input_deserializes_with_defaults() {
        let json = r#"{
            "teachers": [{"id": "t1", "name": "Ada"}],
            "subjects": [{"id": "s1", "name": "Maths", "teacherId": "t1", "periodsPerWeek": 3, "isLab": false}],
            "classrooms": [{"id": "r1", "name": "101", "isLab": false}],
            "rules": {"balancedWorkload": false, "restrictedPeriods": {"Monday": [0]}}
        }"#;
        let input: TimetableInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.working_days, 5);
        assert_eq!(input.timing, TimingConfig::default());
        assert!(!input.rules.balanced_workload);
        assert!(input.rules.no_teacher_continuous_periods);
        assert!(input.rules.is_restricted("Monday", 0));
        assert!(!input.rules.is_restricted("Tuesday", 0));
    }

    #[test]
    fn warning_serializes_with_kind_tag() {
        let warning = GenerationWarning::UnresolvedTeacher {
            subject_id: "s1".into(),
            teacher_id: "t9".into(),
        };
        let value = serde_json::to_value(&warning).unwrap();
        assert_eq!(value["kind"], "unresolvedTeacher");
        assert_eq!(value["teacherId"], "t9");
        assert_eq!(warning.to_string(), "Subject s1 skipped: teacher t9 not found");
    }
}
