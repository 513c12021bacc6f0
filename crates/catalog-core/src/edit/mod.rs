//! ============================================================================
//! Edit Module - Local, unpersisted product edits
//! ============================================================================
//! - `EditForm`: validates what the user typed
//! - `EditOverlay`: stores patches per product id and applies them on read
//! ============================================================================

mod form;
mod overlay;

pub use form::{EditError, EditForm, MAX_RATING};
pub use overlay::{EditOverlay, EditStore, InMemoryEditStore, ProductEdits};
