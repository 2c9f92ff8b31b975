//! Tier recommendation from the day of week and time of day.

use chrono::{Datelike, NaiveDateTime, Weekday};

use super::models::{Tier, TimeWindows};
use super::providers::Clock;

/// Suggest a tier for a job at `at`.
///
/// Rules are checked in order and the first match wins:
/// 1. Friday from the weekend start onwards
/// 2. Saturday, all day
/// 3. Sunday before the weekend end
/// 4. Sun-Thu from night start, or Mon-Fri before night end
/// 5. Sun-Thu evening
///
/// Anything else is `regular`. The result is only a suggestion; the
/// dispatcher still confirms the tier.
pub fn get_recommended_tier(windows: &TimeWindows, at: NaiveDateTime) -> Tier {
    let day = at.weekday();
    let time = at.time();

    let sun_to_thu = matches!(
        day,
        Weekday::Sun | Weekday::Mon | Weekday::Tue | Weekday::Wed | Weekday::Thu
    );
    let mon_to_fri = !matches!(day, Weekday::Sat | Weekday::Sun);

    if day == Weekday::Fri && time >= windows.weekend_start {
        return Tier::Plus50;
    }
    if day == Weekday::Sat {
        return Tier::Plus50;
    }
    if day == Weekday::Sun && time < windows.weekend_end {
        return Tier::Plus50;
    }
    if (sun_to_thu && time >= windows.night_start) || (mon_to_fri && time < windows.night_end) {
        return Tier::Plus50;
    }
    if sun_to_thu && time >= windows.evening_start && time < windows.night_start {
        return Tier::Plus25;
    }
    Tier::Regular
}

/// Recommendation for a planned job time, falling back to the clock.
pub fn recommended_tier_for(
    windows: &TimeWindows,
    planned: Option<NaiveDateTime>,
    clock: &dyn Clock,
) -> Tier {
    get_recommended_tier(windows, planned.unwrap_or_else(|| clock.now()))
}
