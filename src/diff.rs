use std::collections::BTreeMap;

use crate::types::TelemetryRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordChange {
    pub address: String,
    pub num: Option<String>,
    pub old: Option<String>,
    pub new: Option<String>,
}

type Slot<'a> = (&'a str, Option<&'a str>);

fn slots(records: &[TelemetryRecord]) -> BTreeMap<Slot<'_>, Option<&str>> {
    let mut map = BTreeMap::new();
    for rec in records {
        map.entry((rec.address.as_str(), rec.num.as_deref()))
            .or_insert(rec.data_value.as_deref());
    }
    map
}

/// Per-`(address, num)` value changes between two polls, in address order.
/// Slots that vanished are reported with `new: None`.
pub(crate) fn diff_records(
    previous: &[TelemetryRecord],
    current: &[TelemetryRecord],
) -> Vec<RecordChange> {
    let prev = slots(previous);
    let curr = slots(current);
    let mut changes = Vec::new();

    for (&(address, num), &new) in &curr {
        let old = prev.get(&(address, num)).copied().flatten();
        if !prev.contains_key(&(address, num)) || old != new {
            changes.push(RecordChange {
                address: address.to_string(),
                num: num.map(str::to_string),
                old: old.map(str::to_string),
                new: new.map(str::to_string),
            });
        }
    }

    for (&(address, num), &old) in &prev {
        if !curr.contains_key(&(address, num)) {
            changes.push(RecordChange {
                address: address.to_string(),
                num: num.map(str::to_string),
                old: old.map(str::to_string),
                new: None,
            });
        }
    }

    changes
}
