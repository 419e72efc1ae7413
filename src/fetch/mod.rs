//! Tile fetching
//!
//! Session state, collaborator interfaces, and the per-tile assembler.

mod assembler;
pub mod cancel;
mod session;
mod source;

pub use assembler::TileAssembler;
pub use cancel::{CancelHandle, CancelToken};
pub use session::FetchSession;
pub use source::{ChromSizesSource, IndexedVariantReader, VariantParser};
