//! Core library for editing monster gambit packs.
//! Imports a pack document into a typed rule model, applies edits, and writes the
//! model back into the original JSON text while keeping everything it does not own.

pub mod catalog;
pub mod codec;
mod error;
mod host;
mod import;
pub mod model;
mod session;
pub mod statics;
mod sync;
mod value;

pub use catalog::ActionCatalog;
pub use error::{EditError, GambitError, SessionError, Warning};
pub use host::TextFile;
pub use import::{Imported, import};
pub use model::{
    Condition, GambitRule, LoopCount, MonsterAttribute, MonsterAttrs, MonsterEntry, MonsterId,
    PackDocument, PackType, RuleArena, RuleHandle, RuleKey,
};
pub use session::{Applied, Edit, EditOutcome, EditingSession, EditorSurface};
pub use sync::{SyncOptions, Synced, synchronize, synchronize_with};
pub use value::{LineEnding, PackNumber, PackValue};
