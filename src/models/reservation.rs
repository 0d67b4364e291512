use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampMilliSeconds};
use time::OffsetDateTime;

const RFC3339_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Half-open interval `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeRange {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl TimeRange {
    /// Returns `None` unless `start < end` and both fall in years 0 to 9999,
    /// the span RFC 3339 can render.
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Option<Self> {
        let renderable = RFC3339_YEARS.contains(&start.year()) && RFC3339_YEARS.contains(&end.year());
        (renderable && start < end).then_some(Self { start, end })
    }

    /// Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        !(other.end <= self.start || other.start >= self.end)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: String,
    pub plateau_id: String,
    pub plateau_name: String,
    pub client_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
    pub item_ids: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Reservation {
    pub fn time_range(&self) -> TimeRange {
        TimeRange {
            start: self.start_time,
            end: self.end_time,
        }
    }
}

/// Booking request as sent by the client. Times are epoch milliseconds.
#[serde_as]
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewReservation {
    pub plateau_id: String,
    #[serde(default)]
    pub item_ids: Vec<String>,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub start_time: OffsetDateTime,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub end_time: OffsetDateTime,
    pub client_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn range(start: OffsetDateTime, end: OffsetDateTime) -> TimeRange {
        TimeRange::new(start, end).unwrap()
    }

    #[test]
    fn rejects_empty_and_inverted_ranges() {
        let at = datetime!(2024-05-01 10:00 UTC);
        assert!(TimeRange::new(at, at).is_none());
        assert!(TimeRange::new(datetime!(2024-05-01 11:00 UTC), at).is_none());
    }

    #[test]
    fn rejects_years_rfc3339_cannot_render() {
        assert!(TimeRange::new(datetime!(-0100-01-01 10:00 UTC), datetime!(-0100-01-01 11:00 UTC)).is_none());
        assert!(TimeRange::new(datetime!(-0001-12-31 23:00 UTC), datetime!(0000-01-01 01:00 UTC)).is_none());
        assert!(TimeRange::new(datetime!(0000-01-01 10:00 UTC), datetime!(9999-12-31 23:59 UTC)).is_some());
    }

    #[test]
    fn partial_overlap_is_detected_both_ways() {
        let existing = range(datetime!(2024-05-01 10:00 UTC), datetime!(2024-05-01 11:00 UTC));
        let later = range(datetime!(2024-05-01 10:30 UTC), datetime!(2024-05-01 11:30 UTC));
        let earlier = range(datetime!(2024-05-01 09:30 UTC), datetime!(2024-05-01 10:01 UTC));
        assert!(existing.overlaps(&later));
        assert!(later.overlaps(&existing));
        assert!(existing.overlaps(&earlier));
    }

    #[test]
    fn containment_overlaps() {
        let outer = range(datetime!(2024-05-01 08:00 UTC), datetime!(2024-05-01 12:00 UTC));
        let inner = range(datetime!(2024-05-01 09:00 UTC), datetime!(2024-05-01 10:00 UTC));
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
        assert!(outer.overlaps(&outer));
    }

    #[test]
    fn touching_boundaries_do_not_overlap() {
        let existing = range(datetime!(2024-05-01 10:00 UTC), datetime!(2024-05-01 11:00 UTC));
        let after = range(datetime!(2024-05-01 11:00 UTC), datetime!(2024-05-01 12:00 UTC));
        let before = range(datetime!(2024-05-01 09:00 UTC), datetime!(2024-05-01 10:00 UTC));
        assert!(!existing.overlaps(&after));
        assert!(!existing.overlaps(&before));
    }

    #[test]
    fn new_reservation_reads_epoch_millis() {
        let request: NewReservation = serde_json::from_str(
            r#"{"plateauId":"p1","startTime":1714557600000,"endTime":1714561200000,"clientName":"Ana"}"#,
        )
        .unwrap();
        assert_eq!(request.start_time, datetime!(2024-05-01 10:00 UTC));
        assert_eq!(request.end_time, datetime!(2024-05-01 11:00 UTC));
        assert!(request.item_ids.is_empty());
    }

    #[test]
    fn reservation_serializes_rfc3339_camel_case() {
        let reservation = Reservation {
            id: "r1".into(),
            plateau_id: "p1".into(),
            plateau_name: "Court 1".into(),
            client_name: "Ana".into(),
            start_time: datetime!(2024-05-01 10:00 UTC),
            end_time: datetime!(2024-05-01 11:00 UTC),
            item_ids: vec!["A".into()],
            created_at: datetime!(2024-04-30 08:15 UTC),
        };
        let value = serde_json::to_value(&reservation).unwrap();
        assert_eq!(value["plateauName"], "Court 1");
        assert_eq!(value["startTime"], "2024-05-01T10:00:00Z");
        assert_eq!(value["itemIds"][0], "A");
    }
}
