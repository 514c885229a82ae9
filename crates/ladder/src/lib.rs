//! PvP ladder scanning.
//!
//! Reads a leaderboard, resolves every qualifying entrant's active talent
//! loadout, validates it against the specialization's tree and encodes the survivors
//! for the UI.

pub mod encode;
pub mod leaderboard;
pub mod raw;
pub mod realms;
pub mod resolver;
pub mod scanner;
pub mod validate;

pub use encode::{LadderJson, LoadoutEncoder, RealmTable};
pub use leaderboard::Bracket;
pub use resolver::{LoadoutOutcome, LoadoutResolver, Resolved};
pub use scanner::{LadderScanner, ScanOptions, SpecLadder};
pub use validate::{validate_loadout, ValidationError};
