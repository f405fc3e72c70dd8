//! Per-field price movement between two consecutive observed snapshots.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use board::PriceSnapshot;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    #[default]
    None,
}

impl Direction {
    fn between(previous: u64, current: u64) -> Self {
        match current.cmp(&previous) {
            Ordering::Greater => Self::Up,
            Ordering::Less => Self::Down,
            Ordering::Equal => Self::None,
        }
    }

    pub fn is_change(self) -> bool {
        self != Self::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChanges {
    pub buy_change: Direction,
    pub sell_change: Direction,
}

impl FieldChanges {
    pub fn new(buy_change: Direction, sell_change: Direction) -> Self {
        Self {
            buy_change,
            sell_change,
        }
    }
}

/// Item id to field movement. Items without an entry get no highlight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChangeMap(BTreeMap<i64, FieldChanges>);

impl ChangeMap {
    pub fn get(&self, id: i64) -> Option<&FieldChanges> {
        self.0.get(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if any tracked field moved.
    pub fn has_movement(&self) -> bool {
        self.0
            .values()
            .any(|c| c.buy_change.is_change() || c.sell_change.is_change())
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &FieldChanges)> {
        self.0.iter().map(|(id, changes)| (*id, changes))
    }
}

/// Compares `current` against the snapshot observed right before it.
///
/// With no previous snapshot the map is empty. Items new in `current` are left out.
pub fn diff(previous: Option<&PriceSnapshot>, current: &PriceSnapshot) -> ChangeMap {
    let Some(previous) = previous else {
        return ChangeMap::default();
    };
    let changes = current
        .items
        .iter()
        .filter_map(|item| {
            let before = previous.get(item.id)?;
            Some((
                item.id,
                FieldChanges::new(
                    Direction::between(before.buy, item.buy),
                    Direction::between(before.sell, item.sell),
                ),
            ))
        })
        .collect();
    ChangeMap(changes)
}

/// The last two observed snapshots.
#[derive(Debug, Default, Clone)]
pub struct SnapshotWindow {
    previous: Option<Arc<PriceSnapshot>>,
    current: Option<Arc<PriceSnapshot>>,
}

impl SnapshotWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shifts `snapshot` in and returns its diff against the one it displaced.
    pub fn observe(&mut self, snapshot: Arc<PriceSnapshot>) -> ChangeMap {
        self.previous = self.current.replace(snapshot);
        match &self.current {
            Some(current) => diff(self.previous.as_deref(), current),
            None => ChangeMap::default(),
        }
    }

    pub fn current(&self) -> Option<&Arc<PriceSnapshot>> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&Arc<PriceSnapshot>> {
        self.previous.as_ref()
    }
}
