//! Serializable CFG snapshot
//!
//! The wire form consumers see: `{id, stmts, preds, succs}` per block with
//! statements rendered as text. The fingerprint covers everything but
//! itself, so two snapshots of unchanged code compare equal byte for byte.

use serde::{Deserialize, Serialize};

use super::block::BlockKind;
use crate::shared::models::{DeclId, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSnapshot {
    pub id: usize,
    pub kind: BlockKind,
    pub stmts: Vec<String>,
    pub preds: Vec<usize>,
    pub succs: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfgSnapshot {
    pub function: DeclId,
    pub blocks: Vec<BlockSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl CfgSnapshot {
    /// blake3 digest over function id, block kinds, statements and edges
    pub fn compute_fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.function.as_bytes());
        for block in &self.blocks {
            hasher.update(&(block.id as u64).to_le_bytes());
            hasher.update(block.kind.as_str().as_bytes());
            for stmt in &block.stmts {
                hasher.update(stmt.as_bytes());
                hasher.update(b"\n");
            }
            for succ in &block.succs {
                hasher.update(&(*succ as u64).to_le_bytes());
            }
            hasher.update(b"\x00");
        }
        hasher.finalize().to_hex().to_string()
    }

    pub fn with_fingerprint(mut self) -> Self {
        self.fingerprint = Some(self.compute_fingerprint());
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
