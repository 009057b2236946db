//! Economy 7 night window.
//!
//! Traditional meters switch to the night rate at 00:00–07:00 local time, while smart meters use
//! 00:30–07:30 UTC all year round.

use chrono::{DateTime, NaiveDate, NaiveTime, Offset, TimeDelta, TimeZone, Utc};
use itertools::Itertools;

use crate::{
    core::{interval::Interval, rate::Rate},
    prelude::*,
};

/// Night window as offsets from midnight: start inclusive, end exclusive.
#[derive(Copy, Clone, Debug)]
struct Window {
    start: TimeDelta,
    end: TimeDelta,
}

impl Window {
    const LOCAL: Self = Self { start: TimeDelta::zero(), end: TimeDelta::hours(7) };
    const SMART: Self = Self { start: TimeDelta::minutes(30), end: TimeDelta::minutes(450) };

    /// Build the window on the date, shifting the wall-clock boundaries by the UTC offset.
    fn on(self, date: NaiveDate, utc_offset: TimeDelta) -> Interval {
        let midnight = date.and_time(NaiveTime::MIN).and_utc() - utc_offset;
        Interval::new(midnight + self.start, midnight + self.end)
    }
}

/// Check whether the rate belongs to the night window.
///
/// For a traditional meter, the window is built on the rate's local date but with the UTC offset
/// of `now`, so around a clock change it may be off by an hour.
#[must_use]
pub fn is_night_rate<Tz: TimeZone>(rate: &Rate, is_smart_meter: bool, now: &DateTime<Tz>) -> bool {
    let valid_from = rate.interval.start;
    let window = if is_smart_meter {
        Window::SMART.on(valid_from.date_naive(), TimeDelta::zero())
    } else {
        let local_date = valid_from.with_timezone(&now.timezone()).date_naive();
        let utc_offset = TimeDelta::seconds(i64::from(now.offset().fix().local_minus_utc()));
        Window::LOCAL.on(local_date, utc_offset)
    };
    let is_night = window.contains(valid_from);
    trace!(?valid_from, ?window, is_night, "Classified");
    is_night
}

/// Combine the day and night series into one, taking each half-hour from the respective series.
#[must_use]
pub fn merge_day_night<Tz: TimeZone>(
    day_rates: Vec<Rate>,
    night_rates: Vec<Rate>,
    is_smart_meter: bool,
    now: &DateTime<Tz>,
) -> Vec<Rate> {
    day_rates
        .into_iter()
        .filter(|rate| !is_night_rate(rate, is_smart_meter, now))
        .chain(night_rates.into_iter().filter(|rate| is_night_rate(rate, is_smart_meter, now)))
        .sorted_by_key(|rate| rate.interval.start)
        .collect()
}

/// Current moment in the timezone, for [`is_night_rate`].
#[must_use]
pub fn now_in<Tz: TimeZone>(timezone: &Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(timezone)
}

#[cfg(test)]
mod tests {
    use chrono_tz::{Europe::London, Tz};

    use super::*;
    use crate::quantity::rate::KilowattHourRate;

    fn rate_at(start: DateTime<Utc>, value: f64) -> Rate {
        Rate {
            interval: Interval::half_hour_from(start),
            value_exc_vat: KilowattHourRate::from(value),
            value_inc_vat: KilowattHourRate::from(value),
        }
    }

    fn utc(month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, month, day, hour, minute, 0).unwrap()
    }

    fn winter_now() -> DateTime<Tz> {
        London.with_ymd_and_hms(2022, 1, 10, 12, 0, 0).unwrap()
    }

    fn summer_now() -> DateTime<Tz> {
        London.with_ymd_and_hms(2022, 6, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_traditional_meter_winter() {
        let now = winter_now();
        assert!(is_night_rate(&rate_at(utc(1, 5, 0, 0), 1.0), false, &now));
        assert!(is_night_rate(&rate_at(utc(1, 5, 6, 30), 1.0), false, &now));
        assert!(!is_night_rate(&rate_at(utc(1, 5, 7, 0), 1.0), false, &now));
        assert!(!is_night_rate(&rate_at(utc(1, 4, 23, 30), 1.0), false, &now));
    }

    #[test]
    fn test_traditional_meter_summer() {
        let now = summer_now();
        // Local midnight is 23:00 UTC the day before.
        assert!(is_night_rate(&rate_at(utc(6, 1, 23, 0), 1.0), false, &now));
        assert!(!is_night_rate(&rate_at(utc(6, 1, 22, 30), 1.0), false, &now));
        assert!(is_night_rate(&rate_at(utc(6, 2, 5, 30), 1.0), false, &now));
        assert!(!is_night_rate(&rate_at(utc(6, 2, 6, 0), 1.0), false, &now));
    }

    #[test]
    fn test_traditional_meter_uses_current_offset() {
        // 06:30 GMT is local night, but the window is built with the summer offset of `now`.
        let rate = rate_at(utc(1, 5, 6, 30), 1.0);
        assert!(!is_night_rate(&rate, false, &summer_now()));
        assert!(is_night_rate(&rate, false, &winter_now()));
    }

    #[test]
    fn test_smart_meter() {
        for now in [winter_now(), summer_now()] {
            assert!(!is_night_rate(&rate_at(utc(1, 5, 0, 0), 1.0), true, &now));
            assert!(is_night_rate(&rate_at(utc(1, 5, 0, 30), 1.0), true, &now));
            assert!(is_night_rate(&rate_at(utc(6, 5, 7, 0), 1.0), true, &now));
            assert!(!is_night_rate(&rate_at(utc(6, 5, 7, 30), 1.0), true, &now));
        }
    }

    #[test]
    fn test_merge_day_night() {
        let period = Interval::new(utc(1, 5, 0, 0), utc(1, 6, 0, 0));
        let day_rates = period.half_hours().map(|slot| rate_at(slot.start, 30.0)).collect_vec();
        let night_rates = period.half_hours().map(|slot| rate_at(slot.start, 10.0)).collect_vec();
        let rates = merge_day_night(day_rates, night_rates, false, &winter_now());
        assert_eq!(rates.len(), 48);
        assert!(rates.is_sorted_by_key(|rate| rate.interval.start));
        assert_eq!(rates[0].value_inc_vat, KilowattHourRate::from(10.0));
        assert_eq!(rates[13].value_inc_vat, KilowattHourRate::from(10.0));
        assert_eq!(rates[14].value_inc_vat, KilowattHourRate::from(30.0));
        assert_eq!(rates[47].value_inc_vat, KilowattHourRate::from(30.0));
    }
}
