use std::sync::Arc;

use board::{PriceSnapshot, PricedItem};
use sync::{PriceSource, SnapshotCache, SyncError};
use tracing::{info, warn};

use crate::input::normalize_price;

pub const NEW_ROW_NAME: &str = "New item";

const SAVE_ALL_OK: &str = "Prices updated - every display now shows the new prices!";
const SAVE_REJECTED: &str = "Failed to save prices!";
const CONNECTION_ERROR: &str = "Connection error!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Buy,
    Sell,
}

/// The working copy exists only after the first successful load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Uninitialized,
    Editing(Vec<PricedItem>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// Short-lived operator message describing the last commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Yes/no gate asked before destructive actions.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Cancelled,
    Deleted(Arc<PriceSnapshot>),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("prices have not been loaded yet")]
    NotLoaded,
    #[error("no item with id {0}")]
    UnknownItem(i64),
    #[error("no id left above {0} for a new item")]
    IdSpaceExhausted(i64),
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// An operator's locally edited copy of the price list.
///
/// Field edits stay local until a save. Every save sends the whole copy, so a
/// concurrent editor's earlier save is overwritten in full.
pub struct AdminEditSession<S> {
    source: Arc<S>,
    cache: SnapshotCache,
    state: EditState,
    notice: Option<Notice>,
}

impl<S> AdminEditSession<S>
where
    S: PriceSource,
{
    pub fn new(source: Arc<S>, cache: SnapshotCache) -> Self {
        Self {
            source,
            cache,
            state: EditState::Uninitialized,
            notice: None,
        }
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn items(&self) -> Option<&[PricedItem]> {
        match &self.state {
            EditState::Editing(items) => Some(items),
            EditState::Uninitialized => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, EditState::Editing(_))
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Starts editing from `snapshot`. Ignored once editing has begun.
    pub fn seed(&mut self, snapshot: &PriceSnapshot) -> bool {
        if self.is_editing() {
            return false;
        }
        self.state = EditState::Editing(snapshot.items.clone());
        true
    }

    /// Fetches and seeds the working copy if it does not exist yet.
    pub async fn load(&mut self) -> Result<bool, SessionError> {
        if self.is_editing() {
            return Ok(false);
        }
        let snapshot = Arc::new(self.source.fetch().await?);
        self.cache.publish(Arc::clone(&snapshot));
        Ok(self.seed(&snapshot))
    }

    /// Drops the working copy so the next load seeds afresh.
    pub fn reset(&mut self) {
        self.state = EditState::Uninitialized;
        self.notice = None;
    }

    /// Applies raw operator input to one field of one row.
    pub fn edit_field(&mut self, id: i64, field: Field, raw: &str) -> Result<(), SessionError> {
        let item = self.row_mut(id)?;
        match field {
            Field::Name => item.name = raw.to_string(),
            Field::Buy => item.buy = normalize_price(raw),
            Field::Sell => item.sell = normalize_price(raw),
        }
        Ok(())
    }

    /// Appends a blank row and returns its id.
    pub fn add_row(&mut self) -> Result<i64, SessionError> {
        let EditState::Editing(items) = &mut self.state else {
            return Err(SessionError::NotLoaded);
        };
        let highest = items.iter().map(|item| item.id).max().unwrap_or(0);
        let id = highest
            .checked_add(1)
            .ok_or(SessionError::IdSpaceExhausted(highest))?;
        items.push(PricedItem::new(id, NEW_ROW_NAME, 0, 0));
        Ok(id)
    }

    /// Removes a row after confirmation and commits right away.
    ///
    /// If the commit fails the row is put back where it was.
    pub async fn delete_row<C>(&mut self, id: i64, confirm: &mut C) -> Result<DeleteOutcome, SessionError>
    where
        C: Confirm + ?Sized,
    {
        let EditState::Editing(items) = &mut self.state else {
            return Err(SessionError::NotLoaded);
        };
        let index = items
            .iter()
            .position(|item| item.id == id)
            .ok_or(SessionError::UnknownItem(id))?;
        let prompt = format!("Delete \"{}\"?", items[index].name);
        if !confirm.confirm(&prompt) {
            return Ok(DeleteOutcome::Cancelled);
        }

        let removed = items.remove(index);
        let message = format!("Deleted {}", removed.name);
        match self.commit(NoticeKind::Info, message).await {
            Ok(snapshot) => Ok(DeleteOutcome::Deleted(snapshot)),
            Err(err) => {
                if let EditState::Editing(items) = &mut self.state {
                    items.insert(index, removed);
                }
                Err(err)
            }
        }
    }

    /// Commits the whole working copy; only the notice mentions the row.
    pub async fn save_one(&mut self, id: i64) -> Result<Arc<PriceSnapshot>, SessionError> {
        let name = self
            .items()
            .ok_or(SessionError::NotLoaded)?
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.name.clone())
            .ok_or(SessionError::UnknownItem(id))?;
        self.commit(NoticeKind::Success, format!("Saved prices for {name}!"))
            .await
    }

    pub async fn save_all(&mut self) -> Result<Arc<PriceSnapshot>, SessionError> {
        self.commit(NoticeKind::Success, SAVE_ALL_OK.to_string()).await
    }

    async fn commit(
        &mut self,
        kind: NoticeKind,
        success: String,
    ) -> Result<Arc<PriceSnapshot>, SessionError> {
        let items = self.items().ok_or(SessionError::NotLoaded)?.to_vec();
        let rows = items.len();
        match self.source.replace_all(items).await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.cache.publish(Arc::clone(&snapshot));
                info!(rows, updated_at = %snapshot.updated_at, "price list committed");
                self.notice = Some(Notice::new(kind, success));
                Ok(snapshot)
            }
            Err(err) => {
                warn!(error = %err, rows, "price list commit failed");
                let message = if err.is_rejection() {
                    SAVE_REJECTED
                } else {
                    CONNECTION_ERROR
                };
                self.notice = Some(Notice::new(NoticeKind::Error, message));
                Err(err.into())
            }
        }
    }

    fn row_mut(&mut self, id: i64) -> Result<&mut PricedItem, SessionError> {
        let EditState::Editing(items) = &mut self.state else {
            return Err(SessionError::NotLoaded);
        };
        items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(SessionError::UnknownItem(id))
    }
}
