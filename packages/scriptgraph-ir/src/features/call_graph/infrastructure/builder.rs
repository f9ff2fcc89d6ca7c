//! Mutable call-graph builder
//!
//! Fragments are merged one at a time by a single writer. Resolution is
//! deferred to [`CallGraphBuilder::freeze`] so a call into a unit merged
//! later still resolves; fragments are processed in file-path order there,
//! which keeps node ids independent of merge order.

use ahash::AHashSet;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::symbols::SymbolTable;
use crate::config::CallGraphConfig;
use crate::features::call_graph::domain::{CallGraph, CallNode, EdgeInfo, UnitFragment};
use crate::features::call_graph::ports::FragmentMerger;
use crate::features::ir_generation::domain::Callee;
use crate::shared::graph::{IdGraph, NodeId};
use crate::shared::models::{
    DeclId, Diagnostic, DiagnosticKind, Diagnostics, Result, ScriptGraphError, Severity, Span,
};

#[derive(Debug, Default)]
pub struct CallGraphBuilder {
    config: CallGraphConfig,
    symbols: SymbolTable,
    fragments: Vec<UnitFragment>,
    files: AHashSet<String>,
}

impl CallGraphBuilder {
    pub fn new(config: CallGraphConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Target of one call site, `None` for the unknown sink
    fn resolve_call(&self, file: &str, callee: &Callee) -> Option<DeclId> {
        let imports = self.config.resolve_imports;
        let id = match callee {
            Callee::Decl(id) => Some(id.clone()),
            Callee::Imported { module, name } if imports => {
                self.symbols.resolve_export(file, module, name)
            }
            Callee::Member { class, name } if self.config.resolve_methods => self.symbols.lookup_method(
                file,
                class,
                name,
                self.config.max_hierarchy_depth,
                imports,
            ),
            _ => None,
        }?;
        self.symbols.is_function(&id).then_some(id)
    }

    fn node_of(graph: &IdGraph<CallNode>, symbols: &SymbolTable, id: &str) -> Option<NodeId> {
        let node = if symbols.is_class(id) {
            CallNode::Class(id.to_string())
        } else {
            CallNode::Function(id.to_string())
        };
        graph.get_id(&node).ok()
    }

    fn unresolved(site_caller: &str, callee: &Callee) -> Option<Diagnostic> {
        let message = match callee {
            Callee::Unknown(_) => return None,
            Callee::Decl(id) => format!("{} is not a function", id),
            Callee::Imported { module, name } => format!("import {} from '{}' did not resolve", name, module),
            Callee::Member { class, name } => format!("no method {} on {}", name, class),
        };
        Some(
            Diagnostic::new(DiagnosticKind::UnresolvedTarget, Severity::Info, message, Span::zero())
                .in_function(site_caller),
        )
    }
}

impl FragmentMerger for CallGraphBuilder {
    fn merge(&mut self, fragment: UnitFragment) -> Result<()> {
        if !self.files.insert(fragment.file_path.clone()) {
            return Err(ScriptGraphError::call_graph("unit merged twice").with_file(&fragment.file_path));
        }
        self.symbols.register(&fragment);
        debug!(
            file = %fragment.file_path,
            functions = fragment.functions.len(),
            call_sites = fragment.call_sites.len(),
            "Merged fragment"
        );
        self.fragments.push(fragment);
        Ok(())
    }

    fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    fn freeze(mut self) -> Result<CallGraph> {
        self.fragments.sort_by(|a, b| a.file_path.cmp(&b.file_path));

        let mut graph: IdGraph<CallNode> = IdGraph::new();
        graph.add_node(CallNode::Unknown);
        for fragment in &self.fragments {
            for class in &fragment.classes {
                graph.add_node(CallNode::Class(class.id.clone()));
            }
            for function in &fragment.functions {
                graph.add_node(CallNode::Function(function.id.clone()));
            }
        }

        let unknown = NodeId(0);
        let mut edges: FxHashMap<(NodeId, NodeId), EdgeInfo> = FxHashMap::default();
        let mut diagnostics = Diagnostics::new();
        for fragment in &self.fragments {
            for site in &fragment.call_sites {
                let Some(from) = Self::node_of(&graph, &self.symbols, &site.caller) else {
                    warn!(caller = %site.caller, "Call site outside any known function");
                    continue;
                };
                let to = self
                    .resolve_call(&fragment.file_path, &site.callee)
                    .and_then(|id| Self::node_of(&graph, &self.symbols, &id))
                    .unwrap_or(unknown);
                if to == unknown {
                    if let Some(diagnostic) = Self::unresolved(&site.caller, &site.callee) {
                        diagnostics.push(diagnostic);
                    }
                }
                graph.add_edge(from, to)?;
                edges.entry((from, to)).or_default().call_sites.push(site.id.clone());
            }

            if !self.config.dependency_edges {
                continue;
            }
            for dep in &fragment.dependencies {
                let from = Self::node_of(&graph, &self.symbols, &dep.from);
                let to = self
                    .symbols
                    .resolve_ref(&fragment.file_path, &dep.to, self.config.resolve_imports)
                    .and_then(|id| Self::node_of(&graph, &self.symbols, &id));
                let (Some(from), Some(to)) = (from, to) else {
                    continue;
                };
                if from == to {
                    continue;
                }
                graph.add_edge(from, to)?;
                edges.entry((from, to)).or_default().add_ref(dep.kind);
            }
        }

        let mut calls: IdGraph<CallNode> = IdGraph::with_capacity(graph.node_count());
        for node in graph.nodes() {
            calls.add_node(node.clone());
        }
        for (from, to) in graph.edges() {
            if edges.get(&(from, to)).is_some_and(EdgeInfo::is_call) {
                calls.add_edge(from, to)?;
            }
        }

        let mut exported: Vec<DeclId> = self
            .fragments
            .iter()
            .flat_map(|f| f.exported_decls().cloned())
            .collect();
        exported.sort();
        exported.dedup();

        debug!(
            units = self.fragments.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            unresolved = diagnostics.len(),
            "Froze call graph"
        );
        Ok(CallGraph {
            graph,
            calls,
            edges,
            exported,
            diagnostics,
            files: self.fragments.into_iter().map(|f| f.file_path).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::call_graph::domain::{CallSite, FunctionEntry};
    use crate::features::ir_generation::domain::{
        DeclRef, DependencyRef, ExportEntry, ExportTarget, FunctionKind, RefKind,
    };
    use pretty_assertions::assert_eq;

    fn function(id: &str) -> FunctionEntry {
        FunctionEntry {
            id: id.to_string(),
            kind: FunctionKind::Function,
            class: None,
        }
    }

    fn site(caller: &str, index: usize, callee: Callee) -> CallSite {
        CallSite {
            caller: caller.to_string(),
            id: format!("{}#{}", caller, index),
            callee,
        }
    }

    fn units() -> Vec<UnitFragment> {
        vec![
            UnitFragment {
                file_path: "util.ets".to_string(),
                functions: vec![function("@util.ets: %dflt"), function("@util.ets: helper")],
                exports: vec![ExportEntry {
                    name: "helper".to_string(),
                    target: ExportTarget::Decl("@util.ets: helper".to_string()),
                }],
                call_sites: vec![site("@util.ets: helper", 0, Callee::Unknown("log".to_string()))],
                ..UnitFragment::default()
            },
            UnitFragment {
                file_path: "main.ets".to_string(),
                functions: vec![function("@main.ets: %dflt"), function("@main.ets: run")],
                call_sites: vec![
                    site(
                        "@main.ets: run",
                        0,
                        Callee::Imported {
                            module: "./util".to_string(),
                            name: "helper".to_string(),
                        },
                    ),
                    site(
                        "@main.ets: run",
                        3,
                        Callee::Imported {
                            module: "./util".to_string(),
                            name: "helper".to_string(),
                        },
                    ),
                    site("@main.ets: run", 5, Callee::Decl("@main.ets: run".to_string())),
                ],
                dependencies: vec![DependencyRef {
                    from: "@main.ets: %dflt".to_string(),
                    to: DeclRef::Decl("@main.ets: run".to_string()),
                    kind: RefKind::Value,
                }],
                ..UnitFragment::default()
            },
        ]
    }

    fn freeze(config: CallGraphConfig, fragments: Vec<UnitFragment>) -> CallGraph {
        let mut builder = CallGraphBuilder::new(config);
        for fragment in fragments {
            builder.merge(fragment).unwrap();
        }
        builder.freeze().unwrap()
    }

    #[test]
    fn test_imported_call_resolves_and_dedupes() {
        let cg = freeze(CallGraphConfig::default(), units());
        let run = cg.node_id("@main.ets: run").unwrap();
        let helper = cg.node_id("@util.ets: helper").unwrap();
        let info = cg.edge(run, helper).unwrap();
        assert_eq!(
            info.call_sites,
            vec!["@main.ets: run#0".to_string(), "@main.ets: run#3".to_string()]
        );
        assert!(cg.calls_unknown("@util.ets: helper"));
        assert!(!cg.calls_unknown("@main.ets: run"));
        assert_eq!(cg.recursion_groups(), vec![vec!["@main.ets: run".to_string()]]);
    }

    #[test]
    fn test_node_ids_independent_of_merge_order() {
        let mut reversed = units();
        reversed.reverse();
        let a = freeze(CallGraphConfig::default(), units());
        let b = freeze(CallGraphConfig::default(), reversed);
        assert_eq!(a.triples(), b.triples());
        assert_eq!(
            a.node_id("@util.ets: helper").unwrap(),
            b.node_id("@util.ets: helper").unwrap()
        );
    }

    #[test]
    fn test_disabled_imports_go_to_unknown() {
        let cg = freeze(CallGraphConfig::default().resolve_imports(false), units());
        let callees: Vec<String> = cg
            .callees("@main.ets: run")
            .unwrap()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(callees, vec!["unknown".to_string(), "@main.ets: run".to_string()]);

        // Two import sites miss, the `log` site was never resolvable
        let misses: Vec<&str> = cg
            .diagnostics()
            .iter()
            .map(|d| d.function.as_deref().unwrap_or(""))
            .collect();
        assert_eq!(misses, vec!["@main.ets: run", "@main.ets: run"]);
        assert!(cg
            .diagnostics()
            .iter()
            .all(|d| d.kind == DiagnosticKind::UnresolvedTarget));
    }

    #[test]
    fn test_dependency_edges_are_not_calls() {
        let cg = freeze(CallGraphConfig::default(), units());
        let module = cg.node_id("@main.ets: %dflt").unwrap();
        let run = cg.node_id("@main.ets: run").unwrap();
        assert!(cg.graph().contains_edge(module, run));
        assert!(!cg.call_edges().contains_edge(module, run));
        assert_eq!(cg.edge(module, run).unwrap().refs, vec![RefKind::Value]);

        let without = freeze(CallGraphConfig::default().dependency_edges(false), units());
        assert!(!without.graph().contains_edge(module, run));
    }

    #[test]
    fn test_duplicate_unit_rejected() {
        let mut builder = CallGraphBuilder::default();
        builder.merge(units().remove(0)).unwrap();
        assert!(builder.merge(units().remove(0)).is_err());
        assert_eq!(builder.fragment_count(), 1);
    }

    #[test]
    fn test_unknown_name_lookup_fails() {
        let cg = freeze(CallGraphConfig::default(), units());
        assert!(cg.node_id("@nowhere.ets: f").is_err());
        assert!(cg.callees("@nowhere.ets: f").is_err());
    }
}
