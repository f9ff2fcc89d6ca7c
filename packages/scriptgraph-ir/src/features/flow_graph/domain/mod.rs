//! CFG domain models

mod block;
mod cfg;
mod snapshot;

pub use block::{BasicBlock, BlockKind};
pub use cfg::Cfg;
pub use snapshot::{BlockSnapshot, CfgSnapshot};
