//! ID generation utilities
//!
//! Declaration ids are textual and deterministic (`@<file>: <qualified>`),
//! so re-analysing unchanged source reproduces them exactly. Content
//! fingerprints use blake3.

use crate::shared::models::DeclId;

/// ID Generator for declarations and snapshots
pub struct IdGenerator;

impl IdGenerator {
    /// Declaration id for a qualified name inside a file
    pub fn decl_id(file_path: &str, qualified: &str) -> DeclId {
        format!("@{}: {}", file_path, qualified)
    }

    /// Split a declaration id back into `(file, qualified)`
    pub fn split_decl_id(id: &str) -> Option<(&str, &str)> {
        id.strip_prefix('@')?.split_once(": ")
    }

    /// Call-site id: `<caller>#<statement index>`
    pub fn call_site_id(function_id: &str, stmt_index: usize) -> String {
        format!("{}#{}", function_id, stmt_index)
    }
}

/// blake3 content hash (hex) for change detection
pub fn content_hash(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}
