use std::cmp::Ordering;
use std::collections::HashMap;

use perch_types::models::{AssembledChannel, LiveSnapshotEntry};

use crate::collation::compare_display_names;
use crate::ledger::ChannelRecord;

/// Merge ledger records with a live snapshot into the ordered list.
///
/// Order: favorites first; then recorded last-seen (newest first) ahead of
/// no last-seen; then display name. A live channel never shows a last-seen
/// value, so within its tier it sorts by name among the never-seen-offline.
/// Snapshot entries for channels outside the ledger are ignored.
pub fn assemble(records: &[ChannelRecord], snapshot: &[LiveSnapshotEntry]) -> Vec<AssembledChannel> {
    let mut live: HashMap<&str, &LiveSnapshotEntry> = HashMap::with_capacity(snapshot.len());
    for entry in snapshot {
        // First report of a channel wins
        live.entry(entry.channel_id.as_str()).or_insert(entry);
    }

    let mut channels: Vec<AssembledChannel> = records
        .iter()
        .map(|record| {
            let stream = live.get(record.channel_id.as_str());
            AssembledChannel {
                channel_id: record.channel_id.clone(),
                display_name: record.display_name.clone(),
                profile_image_url: record.profile_image_url.clone(),
                is_favorite: record.is_favorite,
                is_live: stream.is_some(),
                viewer_count: stream.map(|s| s.viewer_count),
                game_name: stream.map(|s| s.game_name.clone()),
                last_seen_at: if stream.is_some() { None } else { record.last_seen_at },
            }
        })
        .collect();

    channels.sort_by(presence_order);
    channels
}

fn presence_order(a: &AssembledChannel, b: &AssembledChannel) -> Ordering {
    b.is_favorite
        .cmp(&a.is_favorite)
        .then_with(|| match (a.last_seen_at, b.last_seen_at) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| compare_display_names(&a.display_name, &b.display_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn record(id: &str, fav: bool, last_seen: Option<DateTime<Utc>>) -> ChannelRecord {
        ChannelRecord {
            channel_id: id.to_lowercase(),
            display_name: id.to_string(),
            profile_image_url: String::new(),
            is_favorite: fav,
            favorite_order: fav.then_some(0),
            last_seen_at: last_seen,
        }
    }

    fn live(id: &str, viewers: u64) -> LiveSnapshotEntry {
        LiveSnapshotEntry {
            channel_id: id.to_lowercase(),
            viewer_count: viewers,
            game_name: "Just Chatting".to_string(),
        }
    }

    fn day(d: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap())
    }

    fn names(list: &[AssembledChannel]) -> Vec<&str> {
        list.iter().map(|c| c.display_name.as_str()).collect()
    }

    #[test]
    fn favorite_then_recency() {
        let records = vec![
            record("Bob", false, day(1)),
            record("Zed", true, None),
            record("Ann", false, day(2)),
        ];
        let list = assemble(&records, &[live("Zed", 500)]);

        assert_eq!(names(&list), vec!["Zed", "Ann", "Bob"]);
        assert!(list[0].is_live);
        assert_eq!(list[0].viewer_count, Some(500));
        assert_eq!(list[0].game_name.as_deref(), Some("Just Chatting"));
        assert!(!list[1].is_live);
        assert_eq!(list[1].viewer_count, None);
        assert_eq!(list[1].last_seen_at, day(2));
    }

    #[test]
    fn live_channel_hides_stored_watermark() {
        let records = vec![record("Ann", false, day(3))];
        let list = assemble(&records, &[live("Ann", 1)]);
        assert_eq!(list[0].last_seen_at, None);
        assert!(list[0].is_live);
    }

    #[test]
    fn recorded_watermark_outranks_live_in_same_tier() {
        let records = vec![
            record("Amy", false, None),
            record("Cal", false, day(1)),
            record("Ben", false, day(9)),
        ];
        let list = assemble(&records, &[live("Ben", 3)]);
        // Ben is live, so his day(9) is hidden and he sorts by name with Amy
        assert_eq!(names(&list), vec!["Cal", "Amy", "Ben"]);
    }

    #[test]
    fn liveness_does_not_cross_favorite_tier() {
        let records = vec![
            record("Live", false, None),
            record("Offline", true, day(1)),
        ];
        let list = assemble(&records, &[live("Live", 9)]);
        assert_eq!(names(&list), vec!["Offline", "Live"]);
    }

    #[test]
    fn names_break_ties_case_insensitively() {
        let records = vec![
            record("zed", false, None),
            record("Bob", false, None),
            record("ann", false, None),
        ];
        assert_eq!(names(&assemble(&records, &[])), vec!["ann", "Bob", "zed"]);
    }

    #[test]
    fn duplicate_and_unknown_snapshot_entries() {
        let records = vec![record("Ann", false, None)];
        let snapshot = vec![live("Ann", 1), live("Ann", 2), live("Stranger", 3)];
        let list = assemble(&records, &snapshot);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].viewer_count, Some(1));
    }
}
