//! Talent tree assembly.
//!
//! Turns the talent-tree index, per-spec trees, PvP talents and spell media
//! of the game data API into [`common::TalentTree`]s, compensating for specs
//! the API serves incorrectly or not at all.

pub mod assembler;
pub mod export;
pub mod filter;
pub mod index;
pub mod media;
pub mod node;
pub mod pvp;
pub mod raw;
pub mod strategy;

pub use assembler::TreeAssembler;
pub use export::TalentTreeJson;
pub use index::TreeIndex;
pub use pvp::PvpCatalog;
pub use strategy::{ReferenceNode, ReferenceTree, StrategyTable, TreeStrategy};
