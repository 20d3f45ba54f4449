use crate::config::RoomSelection;
use crate::data::{
    Assignment, Classroom, GenerationWarning, PeriodIndex, RoomId, Subject, TeacherId,
    TimetableInput, WEEKDAYS,
};
use log::{debug, warn};
use rand::Rng;

/// A subject whose teacher and room have been resolved.
#[derive(Debug, Clone)]
struct SubjectPlan<'a> {
    subject: &'a Subject,
    teacher_id: TeacherId,
    room_id: RoomId,
}

/// Builds random candidates. References are resolved once up front, so the
/// per-candidate work is just drawing slots.
#[derive(Debug, Clone)]
pub struct CandidateGenerator<'a> {
    plans: Vec<SubjectPlan<'a>>,
    input: &'a TimetableInput,
    period_count: usize,
}

impl<'a> CandidateGenerator<'a> {
    /// Resolves every subject. Subjects that cannot be placed are left out
    /// and reported as warnings.
    pub fn new(input: &'a TimetableInput, period_count: usize) -> (Self, Vec<GenerationWarning>) {
        let mut plans = Vec::with_capacity(input.subjects.len());
        let mut warnings = Vec::new();

        for subject in &input.subjects {
            match resolve(subject, input, period_count) {
                Ok(plan) => plans.push(plan),
                Err(warning) => {
                    warn!("{warning}");
                    warnings.push(warning);
                }
            }
        }
        debug!(
            "Resolved {} of {} subjects for generation.",
            plans.len(),
            input.subjects.len()
        );

        (
            Self {
                plans,
                input,
                period_count,
            },
            warnings,
        )
    }

    /// Draws one unscored schedule meeting every resolved subject's quota.
    /// Double bookings are allowed here; fitness sorts them out.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Assignment> {
        let working_days = self.input.working_days;
        let mut schedule = Vec::new();

        for plan in &self.plans {
            let place = |day, period, lab_pair| Assignment {
                subject_id: plan.subject.id.clone(),
                teacher_id: plan.teacher_id.clone(),
                room_id: plan.room_id.clone(),
                day,
                period,
                lab_pair,
            };

            if plan.subject.is_lab {
                let day = rng.random_range(0..working_days);
                let period = rng.random_range(0..self.period_count - 1);
                schedule.push(place(day, period, true));
                schedule.push(place(day, period + 1, false));
                continue;
            }

            let mut placed = 0;
            while placed < plan.subject.weekly_quota() {
                let day = rng.random_range(0..working_days);
                let period = rng.random_range(0..self.period_count);
                if self.input.rules.is_restricted(WEEKDAYS[day], period) {
                    continue;
                }
                schedule.push(place(day, period, false));
                placed += 1;
            }
        }
        schedule
    }
}

fn resolve<'a>(
    subject: &'a Subject,
    input: &TimetableInput,
    period_count: usize,
) -> Result<SubjectPlan<'a>, GenerationWarning> {
    let teacher = input
        .teachers
        .iter()
        .find(|t| t.id == subject.teacher_id)
        .ok_or_else(|| GenerationWarning::UnresolvedTeacher {
            subject_id: subject.id.clone(),
            teacher_id: subject.teacher_id.clone(),
        })?;

    let room = pick_room(subject, &input.classrooms, input.options.room_selection).ok_or_else(
        || GenerationWarning::NoMatchingRoom {
            subject_id: subject.id.clone(),
            is_lab: subject.is_lab,
        },
    )?;

    if subject.is_lab {
        if period_count < 2 {
            return Err(GenerationWarning::LabNeedsTwoPeriods {
                subject_id: subject.id.clone(),
            });
        }
    } else if subject.weekly_quota() > 0 && !has_open_period(input, period_count) {
        return Err(GenerationWarning::NoOpenPeriod {
            subject_id: subject.id.clone(),
        });
    }

    Ok(SubjectPlan {
        subject,
        teacher_id: teacher.id.clone(),
        room_id: room.id.clone(),
    })
}

fn pick_room<'a>(
    subject: &Subject,
    classrooms: &'a [Classroom],
    selection: RoomSelection,
) -> Option<&'a Classroom> {
    let matching = classrooms.iter().find(|c| c.is_lab == subject.is_lab);
    match selection {
        RoomSelection::StrictMatch => matching,
        RoomSelection::FallbackToFirst => matching.or_else(|| classrooms.first()),
    }
}

fn has_open_period(input: &TimetableInput, period_count: usize) -> bool {
    WEEKDAYS
        .iter()
        .take(input.working_days)
        .any(|day| (0..period_count).any(|p: PeriodIndex| !input.rules.is_restricted(day, p)))
}
