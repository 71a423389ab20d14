//! # Order Draft State
//!
//! The open order lives in `Arc<Mutex<OrderDraft>>`; each command takes the
//! lock, works on the draft and releases it before any `.await`.
//!
//! Each invocation of the shell is a separate process, so the draft is also
//! kept as JSON on disk: loaded at startup, written after every change.
//!
//! ```text
//! weigh ──────────► with_draft_mut(add_weighed_line) ──► persist()
//! order remove ───► with_draft_mut(remove_line) ───────► persist()
//! order commit ───► with_draft(clone) ─► db commit ─► with_draft_mut(clear) ─► persist()
//! order show ─────► with_draft(DraftTotals::from)
//! ```

use bascula_core::OrderDraft;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone)]
pub struct DraftState {
    draft: Arc<Mutex<OrderDraft>>,
    path: Option<PathBuf>,
}

impl DraftState {
    /// In-memory only.
    pub fn new() -> Self {
        DraftState {
            draft: Arc::new(Mutex::new(OrderDraft::new())),
            path: None,
        }
    }

    /// Loads the draft saved at `path`, or starts an empty one.
    ///
    /// An unreadable draft file is set aside as `*.corrupt` so the cashier
    /// can keep working.
    pub fn load(path: impl Into<PathBuf>) -> ApiResult<Self> {
        let path = path.into();
        let draft = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<OrderDraft>(&contents) {
                Ok(draft) => {
                    debug!(?path, lines = draft.line_count(), "Draft restored");
                    draft
                }
                Err(e) => {
                    warn!(?path, "Discarding unreadable draft: {}", e);
                    let aside = path.with_extension("corrupt");
                    if let Err(e) = std::fs::rename(&path, &aside) {
                        warn!(?path, ?aside, "Could not set the unreadable draft aside: {}", e);
                    }
                    OrderDraft::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => OrderDraft::new(),
            Err(e) => return Err(ApiError::internal(format!("Could not read draft: {}", e))),
        };

        Ok(DraftState {
            draft: Arc::new(Mutex::new(draft)),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read access to the draft.
    pub fn with_draft<F, R>(&self, f: F) -> ApiResult<R>
    where
        F: FnOnce(&OrderDraft) -> R,
    {
        let draft = self
            .draft
            .lock()
            .map_err(|_| ApiError::internal("Order draft lock poisoned"))?;
        Ok(f(&draft))
    }

    /// Write access to the draft.
    pub fn with_draft_mut<F, R>(&self, f: F) -> ApiResult<R>
    where
        F: FnOnce(&mut OrderDraft) -> R,
    {
        let mut draft = self
            .draft
            .lock()
            .map_err(|_| ApiError::internal("Order draft lock poisoned"))?;
        Ok(f(&mut draft))
    }

    /// Writes the draft to disk; a blank draft (no lines, client or tier
    /// override) removes the file.
    pub fn persist(&self) -> ApiResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let contents = self.with_draft(|d| {
            if d.is_blank() {
                None
            } else {
                Some(serde_json::to_string_pretty(d))
            }
        })?;

        match contents {
            None => match std::fs::remove_file(path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(ApiError::internal(format!("Could not remove draft: {}", e))),
            },
            Some(json) => {
                let json = json.map_err(|e| ApiError::internal(format!("Could not encode draft: {}", e)))?;
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| ApiError::internal(format!("Could not create draft dir: {}", e)))?;
                }
                std::fs::write(path, json)
                    .map_err(|e| ApiError::internal(format!("Could not save draft: {}", e)))?;
                debug!(?path, "Draft saved");
                Ok(())
            }
        }
    }
}

impl Default for DraftState {
    fn default() -> Self {
        Self::new()
    }
}
