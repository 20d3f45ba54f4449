use crate::data::{Assignment, OutputSlot, SubjectId, TimetableInput, TimingConfig, WEEKDAYS};
use std::collections::{BTreeMap, HashMap};

/// Number of display colour groups; subjects past this wrap around.
pub const COLOR_COUNT: u8 = 8;

/// Names of the first `working_days` weekdays.
pub fn active_days(working_days: usize) -> Vec<String> {
    WEEKDAYS
        .iter()
        .take(working_days)
        .map(|d| d.to_string())
        .collect()
}

/// Empty grid: one slot per (day, period), break flags already set.
pub fn empty_grid(
    days: &[String],
    period_count: usize,
    timing: &TimingConfig,
) -> BTreeMap<String, Vec<OutputSlot>> {
    let row: Vec<OutputSlot> = (0..period_count)
        .map(|period| OutputSlot {
            is_long_break: timing.precedes_long_break(period, period_count),
            ..OutputSlot::default()
        })
        .collect();
    days.iter().map(|day| (day.clone(), row.clone())).collect()
}

/// Colour index 1..=8 per subject, in subject-list order.
fn subject_colors(input: &TimetableInput) -> HashMap<&SubjectId, u8> {
    let mut colors = HashMap::new();
    let mut next = 1;
    for subject in &input.subjects {
        colors.entry(&subject.id).or_insert_with(|| {
            let color = next;
            next = next % COLOR_COUNT + 1;
            color
        });
    }
    colors
}

/// Lays the winning assignments out on the day/period grid.
///
/// Assignments outside the grid, or whose subject, teacher or room cannot be
/// found, are skipped.
pub fn decode(
    assignments: &[Assignment],
    input: &TimetableInput,
    days: &[String],
    period_count: usize,
) -> BTreeMap<String, Vec<OutputSlot>> {
    let mut grid = empty_grid(days, period_count, &input.timing);
    let colors = subject_colors(input);

    for entry in assignments {
        let Some(day) = days.get(entry.day) else {
            continue;
        };
        let Some(slot) = grid
            .get_mut(day)
            .and_then(|row| row.get_mut(entry.period))
        else {
            continue;
        };

        let subject = input.subjects.iter().find(|s| s.id == entry.subject_id);
        let teacher = input.teachers.iter().find(|t| t.id == entry.teacher_id);
        let room = input.classrooms.iter().find(|r| r.id == entry.room_id);
        let (Some(subject), Some(teacher), Some(room)) = (subject, teacher, room) else {
            continue;
        };

        *slot = OutputSlot {
            subject: subject.name.clone(),
            subject_id: subject.id.clone(),
            teacher: teacher.name.clone(),
            teacher_id: teacher.id.clone(),
            room: room.name.clone(),
            room_id: room.id.clone(),
            is_break: false,
            is_long_break: slot.is_long_break,
            is_lab: subject.is_lab,
            color: colors.get(&subject.id).copied().unwrap_or(1),
        };
    }
    grid
}
