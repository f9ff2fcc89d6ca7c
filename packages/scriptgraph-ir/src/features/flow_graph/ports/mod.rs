//! Flow graph ports

use crate::features::flow_graph::domain::Cfg;
use crate::features::ir_generation::domain::IrFunction;
use crate::shared::models::Result;

/// Builds the CFG of one lowered function
pub trait FlowAnalyzer: Send + Sync {
    fn build_cfg(&self, function: &IrFunction) -> Result<Cfg>;

    /// Whether snapshots carry a content fingerprint
    fn fingerprints(&self) -> bool {
        false
    }
}
