//! Terminal rendering of the public price board.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use board::wire::ShopInfo;
use board::{format_price, PriceSnapshot};
use changes::{ChangeMap, Direction, SnapshotWindow};
use chrono::Local;
use sync::{SyncState, SyncStatus};
use tokio::time::Instant;

/// Scroll units per rendered row.
pub const LINE_HEIGHT: u32 = 20;

/// Highlights fade before the next poll can produce a new comparison.
pub const HIGHLIGHT_TTL: Duration = Duration::from_secs(2);

pub struct BoardView {
    shop: Option<ShopInfo>,
    window: SnapshotWindow,
    highlights: ChangeMap,
    highlight_until: Option<Instant>,
    status: SyncStatus,
    last_error: Option<String>,
    rows: usize,
    tv: bool,
}

impl BoardView {
    pub fn new(shop: Option<ShopInfo>, rows: usize, tv: bool) -> Self {
        Self {
            shop,
            window: SnapshotWindow::new(),
            highlights: ChangeMap::default(),
            highlight_until: None,
            status: SyncStatus::Loading,
            last_error: None,
            rows: rows.max(1),
            tv,
        }
    }

    pub fn tv(&self) -> bool {
        self.tv
    }

    pub fn toggle_tv(&mut self) -> bool {
        self.tv = !self.tv;
        self.tv
    }

    pub fn snapshot(&self) -> Option<&Arc<PriceSnapshot>> {
        self.window.current()
    }

    pub fn highlights(&self) -> &ChangeMap {
        &self.highlights
    }

    pub fn highlight_deadline(&self) -> Option<Instant> {
        self.highlight_until
    }

    /// Takes in the latest sync state; returns true when a new snapshot was observed.
    pub fn apply(&mut self, state: &SyncState, now: Instant) -> bool {
        self.status = state.status;
        self.last_error = state.last_error.clone();

        let Some(snapshot) = &state.snapshot else {
            return false;
        };
        if self
            .window
            .current()
            .is_some_and(|current| Arc::ptr_eq(current, snapshot))
        {
            return false;
        }

        self.highlights = self.window.observe(Arc::clone(snapshot));
        self.highlight_until = self
            .highlights
            .has_movement()
            .then(|| now + HIGHLIGHT_TTL);
        true
    }

    /// Clears highlights whose time is up.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.highlight_until {
            Some(deadline) if now >= deadline => {
                self.highlights = ChangeMap::default();
                self.highlight_until = None;
                true
            }
            _ => false,
        }
    }

    pub fn content_height(&self) -> u32 {
        let rows = self.snapshot().map(|s| s.len()).unwrap_or(0);
        u32::try_from(rows).unwrap_or(u32::MAX).saturating_mul(LINE_HEIGHT)
    }

    pub fn viewport_height(&self) -> u32 {
        u32::try_from(self.rows)
            .unwrap_or(u32::MAX)
            .saturating_mul(LINE_HEIGHT)
    }

    pub fn render(&self, scroll_position: u32) -> String {
        let mut out = String::new();
        if let Some(shop) = &self.shop {
            let _ = writeln!(out, "=== {} ===", shop.name);
            let _ = writeln!(out, "{} | Hotline: {}", shop.address, shop.hotline);
        }

        let Some(snapshot) = self.snapshot() else {
            let line = match self.status {
                SyncStatus::Error => "Failed to load prices!",
                _ => "Loading...",
            };
            let _ = writeln!(out, "{line}");
            return out;
        };

        let updated = snapshot
            .updated_at
            .with_timezone(&Local)
            .format("%H:%M - %d/%m/%Y");
        let _ = writeln!(out, "Updated {updated}{}", if self.tv { "  [TV]" } else { "" });
        if self.status == SyncStatus::Error {
            let _ = writeln!(
                out,
                "! connection lost, showing last known prices ({})",
                self.last_error.as_deref().unwrap_or("unknown error")
            );
        }

        let _ = writeln!(out, "{:<24}{:>18}{:>18}", "ITEM", "BUY", "SELL");
        let (first, count) = if self.tv {
            (first_visible_row(scroll_position, snapshot.len(), self.rows), self.rows)
        } else {
            (0, snapshot.len())
        };
        for item in snapshot.items.iter().skip(first).take(count) {
            let changes = self.highlights.get(item.id).copied().unwrap_or_default();
            let _ = writeln!(
                out,
                "{:<24}{:>16} {}{:>16} {}",
                item.name,
                format_price(item.buy),
                marker(changes.buy_change),
                format_price(item.sell),
                marker(changes.sell_change),
            );
        }
        out
    }
}

/// Row at the top of the window. Rounds to the nearest row so the end pauses,
/// which stop within the scroll epsilon of each end, still show the first and
/// last rows.
fn first_visible_row(scroll_position: u32, len: usize, rows: usize) -> usize {
    let nearest = (scroll_position.saturating_add(LINE_HEIGHT / 2) / LINE_HEIGHT) as usize;
    nearest.min(len.saturating_sub(rows))
}

fn marker(direction: Direction) -> char {
    match direction {
        Direction::Up => '▲',
        Direction::Down => '▼',
        Direction::None => ' ',
    }
}
