use std::cmp::Ordering;

use tracing::debug;

use evograph_common::EventRecord;

/// Sort events into canonical scoring order: date ascending, undated events
/// last, ties broken by identifier. Every downstream ordering guarantee
/// derives from this sort.
pub fn sort_events(events: &mut [EventRecord]) {
    events.sort_by(|a, b| match (a.date, b.date) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    });
}

/// Generate candidate (source, target) index pairs over events already in
/// canonical order. A pair is emitted iff the target is later in the sort and
/// the whole-day gap is within the window; out-of-window pairs are never
/// generated, not merely scored zero. Pairs involving an undated event have
/// no measurable gap and are always emitted: a missing date alone never
/// excludes a pair from consideration.
///
/// Dates ascend within the dated prefix, so the inner scan breaks at the
/// first out-of-window target. For time-clustered data this keeps the
/// candidate set well below the naive n*(n-1)/2.
pub fn generate_pairs(events: &[EventRecord], max_window_days: i64) -> Vec<(usize, usize)> {
    let first_undated = events.partition_point(|e| e.date.is_some());
    let mut pairs = Vec::new();

    for i in 0..events.len() {
        if i < first_undated {
            let di = match events[i].date {
                Some(d) => d,
                None => continue,
            };
            for j in (i + 1)..first_undated {
                let dj = match events[j].date {
                    Some(d) => d,
                    None => break,
                };
                if (dj - di).num_days() > max_window_days {
                    break;
                }
                pairs.push((i, j));
            }
            for j in first_undated..events.len() {
                pairs.push((i, j));
            }
        } else {
            for j in (i + 1)..events.len() {
                pairs.push((i, j));
            }
        }
    }

    debug!(
        events = events.len(),
        pairs = pairs.len(),
        max_window_days,
        "Generated candidate pairs"
    );
    pairs
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use evograph_common::{EventRecord, EventType};

    fn event(id: &str, date: Option<&str>) -> EventRecord {
        EventRecord {
            id: id.to_string(),
            date: date.map(|d| d.parse().unwrap()),
            event_type: EventType::Unknown,
            actor: None,
            target: None,
            entities: BTreeSet::new(),
            description: String::new(),
        }
    }

    fn sorted(mut events: Vec<EventRecord>) -> Vec<EventRecord> {
        sort_events(&mut events);
        events
    }

    #[test]
    fn sorts_by_date_then_id_with_undated_last() {
        let events = sorted(vec![
            event("c", Some("2008-09-14")),
            event("b", Some("2008-09-10")),
            event("a", Some("2008-09-10")),
            event("z", None),
            event("y", None),
        ]);
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "y", "z"]);
    }

    #[test]
    fn emits_all_in_window_pairs_in_order() {
        let events = sorted(vec![
            event("a", Some("2008-09-10")),
            event("b", Some("2008-09-14")),
            event("c", Some("2008-09-20")),
        ]);
        let pairs = generate_pairs(&events, 365);
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn out_of_window_pairs_are_never_generated() {
        // 400 days apart with a 365-day window: the pair must not exist.
        let events = sorted(vec![
            event("a", Some("2008-01-01")),
            event("b", Some("2009-02-04")),
        ]);
        let pairs = generate_pairs(&events, 365);
        assert!(pairs.is_empty());
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let events = sorted(vec![
            event("a", Some("2008-01-01")),
            event("b", Some("2008-01-31")),
        ]);
        // 30 days apart exactly.
        assert_eq!(generate_pairs(&events, 30), vec![(0, 1)]);
        assert!(generate_pairs(&events, 29).is_empty());
    }

    #[test]
    fn window_break_does_not_skip_undated_tail() {
        let events = sorted(vec![
            event("a", Some("2008-01-01")),
            event("b", Some("2008-06-01")),
            event("u", None),
        ]);
        let pairs = generate_pairs(&events, 30);
        // a–b is out of window, but both still pair with the undated event.
        assert_eq!(pairs, vec![(0, 2), (1, 2)]);
    }

    #[test]
    fn undated_events_pair_with_each_other() {
        let events = sorted(vec![event("u1", None), event("u2", None)]);
        assert_eq!(generate_pairs(&events, 365), vec![(0, 1)]);
    }

    #[test]
    fn same_date_pairs_are_generated_once_in_id_order() {
        let events = sorted(vec![
            event("b", Some("2008-09-10")),
            event("a", Some("2008-09-10")),
        ]);
        let pairs = generate_pairs(&events, 365);
        assert_eq!(pairs, vec![(0, 1)]);
        assert_eq!(events[0].id, "a");
    }

    #[test]
    fn pair_count_is_quadratic_without_window_pressure() {
        let events = sorted(
            (0..10)
                .map(|i| event(&format!("e{i:02}"), Some("2008-09-10")))
                .collect(),
        );
        assert_eq!(generate_pairs(&events, 365).len(), 45);
    }
}
