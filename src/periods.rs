use crate::data::TimingConfig;
use log::warn;

/// Length of every teaching period, in minutes.
pub const PERIOD_MINUTES: u32 = 50;

/// Carves the college day into period labels such as `"09:00 - 09:50"`.
///
/// A short break follows every period except every Nth, which is followed by
/// the long break. Carving stops once the next period would run past the end
/// time, so a degenerate config simply yields no periods.
pub fn build_periods(timing: &TimingConfig) -> Vec<String> {
    let (Some(start), Some(end)) = (
        parse_clock(&timing.start_time),
        parse_clock(&timing.end_time),
    ) else {
        warn!(
            "Unparseable college timing {}-{}; no periods generated.",
            timing.start_time, timing.end_time
        );
        return Vec::new();
    };

    let every = timing.periods_before_long_break;
    let mut periods = Vec::new();
    let mut current = start;
    while let Some(period_end) = current
        .checked_add(PERIOD_MINUTES)
        .filter(|&period_end| period_end <= end)
    {
        periods.push(format!(
            "{} - {}",
            format_clock(current),
            format_clock(period_end)
        ));
        let count = periods.len() as u32;
        let gap = if every > 0 && count % every == 0 {
            timing.long_break_duration
        } else {
            timing.short_break_duration
        };
        // a break running past u32 minutes ends the day
        let Some(next) = period_end.checked_add(gap) else {
            break;
        };
        current = next;
    }
    periods
}

/// Minutes since midnight for an `HH:MM` string, at most `24:00`.
fn parse_clock(time: &str) -> Option<u32> {
    let (hours, minutes) = time.trim().split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if minutes >= 60 || hours > 24 || (hours == 24 && minutes > 0) {
        return None;
    }
    Some(hours * 60 + minutes)
}

fn format_clock(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(start: &str, end: &str) -> TimingConfig {
        TimingConfig {
            start_time: start.to_string(),
            end_time: end.to_string(),
            ..TimingConfig::default()
        }
    }

    #[test]
    fn single_period_window() {
        assert_eq!(build_periods(&timing("09:00", "09:50")), vec!["09:00 - 09:50"]);
    }

    #[test]
    fn default_day_inserts_long_break_after_fourth_period() {
        let periods = build_periods(&TimingConfig::default());
        assert_eq!(
            periods,
            vec![
                "09:00 - 09:50",
                "10:00 - 10:50",
                "11:00 - 11:50",
                "12:00 - 12:50",
                "13:35 - 14:25",
                "14:35 - 15:25",
                "15:35 - 16:25",
            ]
        );
    }

    #[test]
    fn end_before_start_yields_nothing() {
        assert!(build_periods(&timing("17:00", "09:00")).is_empty());
    }

    #[test]
    fn window_shorter_than_a_period_yields_nothing() {
        assert!(build_periods(&timing("09:00", "09:49")).is_empty());
    }

    #[test]
    fn malformed_clock_yields_nothing() {
        assert!(build_periods(&timing("nine", "17:00")).is_empty());
        assert!(build_periods(&timing("09:75", "17:00")).is_empty());
    }

    #[test]
    fn huge_break_ends_the_day_after_one_period() {
        let config = TimingConfig {
            short_break_duration: u32::MAX,
            long_break_duration: u32::MAX,
            ..TimingConfig::default()
        };
        assert_eq!(build_periods(&config), vec!["09:00 - 09:50"]);
    }

    #[test]
    fn out_of_range_clock_yields_nothing() {
        assert!(build_periods(&timing("09:00", "99999999:00")).is_empty());
        assert!(build_periods(&timing("4294967295:00", "17:00")).is_empty());
        assert!(build_periods(&timing("09:00", "24:30")).is_empty());
    }

    #[test]
    fn day_may_end_at_midnight() {
        assert_eq!(build_periods(&timing("23:00", "24:00")), vec!["23:00 - 23:50"]);
    }

    #[test]
    fn zero_periods_before_long_break_uses_short_breaks_only() {
        let config = TimingConfig {
            start_time: "08:00".into(),
            end_time: "10:00".into(),
            short_break_duration: 5,
            long_break_duration: 60,
            periods_before_long_break: 0,
        };
        assert_eq!(build_periods(&config), vec!["08:00 - 08:50", "08:55 - 09:45"]);
    }
}
