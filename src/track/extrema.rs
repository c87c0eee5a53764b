//! Hysteresis-based local extremum detection.
//!
//! Equinoxes, solstices, perihelia and aphelia are all found the same way:
//! keep the samples inside a comparison window (e.g. `|latitude| < 0.05°`),
//! then walk them in date order tracking the best value seen so far:
//!
//! 1. a sample that strictly improves on the running best replaces it
//! 2. otherwise, a sample more than `debounce` after the running best closes
//!    the window: the best is emitted and the tracker is reset, so the next
//!    in-window sample starts a new window
//!
//! Several near-equal minima inside one crossing collapse into a single event,
//! and two consecutive events are always more than `debounce` apart. The
//! sample that closes a window is not kept, so a window must hold at least two
//! samples to produce its own event.

use chrono::{Duration, NaiveDate};

use crate::domain::{ExtremumEvent, ExtremumKind, Sample, TimeSeries};

/// Streaming state machine behind [`find_extrema`].
#[derive(Debug, Clone)]
pub struct ExtremaTracker {
    kind: ExtremumKind,
    debounce: Duration,
    /// Running best `(date, value)`; `None` until the first finite sample.
    best: Option<(NaiveDate, f64)>,
}

impl ExtremaTracker {
    pub fn new(kind: ExtremumKind, debounce: Duration) -> Self {
        Self {
            kind,
            debounce,
            best: None,
        }
    }

    /// Feed one in-window sample. Samples must arrive in date order.
    ///
    /// Returns the event closed by this sample, if any.
    pub fn push(&mut self, date: NaiveDate, value: f64) -> Option<ExtremumEvent> {
        if !value.is_finite() {
            return None;
        }

        match self.best {
            Some((best_date, best_value)) if !self.kind.improves(value, best_value) => {
                if date - best_date > self.debounce {
                    self.best = None;
                    Some(ExtremumEvent {
                        date: best_date,
                        value: best_value,
                        kind: self.kind,
                    })
                } else {
                    None
                }
            }
            _ => {
                self.best = Some((date, value));
                None
            }
        }
    }

    /// Flush the open window at the end of the series.
    ///
    /// Only a live best is emitted, and not when it sits on the last date of
    /// the series.
    pub fn finish(self, last_date: Option<NaiveDate>) -> Option<ExtremumEvent> {
        let (date, value) = self.best?;
        if Some(date) == last_date {
            return None;
        }
        Some(ExtremumEvent {
            date,
            value,
            kind: self.kind,
        })
    }
}

/// Find the local extrema of `value` over the samples accepted by `predicate`.
///
/// Returns an empty vector when no sample is accepted.
pub fn find_extrema<P, V>(
    series: &TimeSeries,
    predicate: P,
    value: V,
    kind: ExtremumKind,
    debounce: Duration,
) -> Vec<ExtremumEvent>
where
    P: Fn(&Sample) -> bool,
    V: Fn(&Sample) -> f64,
{
    let mut tracker = ExtremaTracker::new(kind, debounce);
    let mut events: Vec<ExtremumEvent> = series
        .samples()
        .iter()
        .filter(|s| predicate(s))
        .filter_map(|s| tracker.push(s.date, value(s)))
        .collect();
    events.extend(tracker.finish(series.last_date()));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::{SyntheticOrbit, generate_series};

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + Duration::days(n)
    }

    fn series_from(values: &[(i64, f64)]) -> TimeSeries {
        let samples = values
            .iter()
            .map(|&(d, v)| Sample {
                date: day(d),
                latitude: v,
                distance: 1.0,
            })
            .collect();
        TimeSeries::new(samples).unwrap()
    }

    #[test]
    fn no_sample_in_window_gives_no_event() {
        let series = series_from(&[(0, 5.0), (1, 4.0), (2, 3.0)]);
        let events = find_extrema(
            &series,
            |s| s.latitude.abs() < 0.05,
            |s| s.latitude.abs(),
            ExtremumKind::Min,
            Duration::days(20),
        );
        assert!(events.is_empty());
    }

    #[test]
    fn one_event_per_window() {
        let series = series_from(&[
            (0, 0.04),
            (1, 0.01),
            (2, 0.03),
            (100, 0.02),
            (101, 0.005),
            (102, 0.04),
            (150, 1.0),
        ]);
        let events = find_extrema(
            &series,
            |s| s.latitude.abs() < 0.05,
            |s| s.latitude.abs(),
            ExtremumKind::Min,
            Duration::days(20),
        );
        let dates: Vec<NaiveDate> = events.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![day(1), day(101)]);
        assert_eq!(events[1].value, 0.005);
        assert!(events.iter().all(|e| e.kind == ExtremumKind::Min));
    }

    #[test]
    fn better_sample_after_debounce_replaces_the_best() {
        // Improvement is checked before the debounce: the day-50 sample takes
        // over the open window and the day-1 minimum is never emitted.
        let series = series_from(&[(0, 0.02), (1, 0.01), (50, 0.001), (51, 0.002), (60, 9.0)]);
        let events = find_extrema(
            &series,
            |s| s.latitude.abs() < 0.05,
            |s| s.latitude.abs(),
            ExtremumKind::Min,
            Duration::days(20),
        );
        let dates: Vec<NaiveDate> = events.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![day(50)]);
    }

    #[test]
    fn sample_closing_a_window_is_dropped() {
        let series = series_from(&[(0, 0.01), (30, 0.02), (31, 0.03), (60, 9.0)]);
        let events = find_extrema(
            &series,
            |s| s.latitude.abs() < 0.05,
            |s| s.latitude.abs(),
            ExtremumKind::Min,
            Duration::days(20),
        );
        let dates: Vec<NaiveDate> = events.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![day(0), day(31)]);
    }

    #[test]
    fn emitted_best_is_not_flushed_twice() {
        let series = series_from(&[(0, 0.01), (30, 0.02)]);
        let events = find_extrema(
            &series,
            |s| s.latitude.abs() < 0.05,
            |s| s.latitude.abs(),
            ExtremumKind::Min,
            Duration::days(20),
        );
        let dates: Vec<NaiveDate> = events.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![day(0)]);
    }

    #[test]
    fn ties_keep_the_earliest_date() {
        let series = series_from(&[(0, 3.0), (1, 3.0), (2, 3.0), (10, 0.0)]);
        let events = find_extrema(
            &series,
            |s| s.latitude > 1.0,
            |s| s.latitude,
            ExtremumKind::Max,
            Duration::days(5),
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].date, day(0));
    }

    #[test]
    fn best_on_last_date_is_not_flushed() {
        let series = series_from(&[(0, 2.0), (1, 3.0), (2, 4.0)]);
        let events = find_extrema(
            &series,
            |s| s.latitude > 1.0,
            |s| s.latitude,
            ExtremumKind::Max,
            Duration::days(5),
        );
        assert!(events.is_empty());
    }

    #[test]
    fn non_finite_values_are_ignored() {
        let mut tracker = ExtremaTracker::new(ExtremumKind::Min, Duration::days(1));
        assert!(tracker.push(day(0), f64::NAN).is_none());
        assert!(tracker.push(day(5), 1.0).is_none());
        let event = tracker.finish(Some(day(9))).unwrap();
        assert_eq!(event.date, day(5));
    }

    #[test]
    fn consecutive_events_respect_debounce_on_noisy_series() {
        let orbit = SyntheticOrbit {
            period_days: 400,
            cycles: 4,
            latitude_noise: 0.02,
            seed: 7,
            ..SyntheticOrbit::default()
        };
        let series = generate_series(&orbit).unwrap();
        let debounce = Duration::days(20);
        // Daily samples move ~0.42° per day near a crossing, so each window
        // holds several samples.
        let events = find_extrema(
            &series,
            |s| s.latitude.abs() < 1.0,
            |s| s.latitude.abs(),
            ExtremumKind::Min,
            debounce,
        );
        assert_eq!(events.len(), 8);
        for pair in events.windows(2) {
            assert!(pair[1].date - pair[0].date > debounce);
        }
    }
}
