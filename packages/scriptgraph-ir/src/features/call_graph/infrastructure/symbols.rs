//! Whole-program symbol table
//!
//! Module keys are file paths without their extension (`src/util` for
//! `src/util.ets`); a directory import also matches its `index` unit.
//! Relative specifiers resolve against the importing file's directory,
//! anything else must match a key exactly.

use ahash::{AHashMap, AHashSet};

use crate::features::call_graph::domain::UnitFragment;
use crate::features::ir_generation::domain::{DeclRef, ExportTarget};
use crate::shared::models::DeclId;

/// Re-export chains longer than this are treated as unresolvable
const MAX_REEXPORT_DEPTH: usize = 16;

const EXTENSIONS: &[&str] = &[".d.ets", ".d.ts", ".ets", ".ts", ".tsx", ".mts", ".js", ".jsx", ".mjs"];

#[derive(Debug, Clone)]
struct ClassSymbol {
    file_path: String,
    super_class: Option<DeclRef>,
    constructor: DeclId,
    methods: AHashMap<String, DeclId>,
}

#[derive(Debug, Clone, Default)]
struct ModuleSymbols {
    file_path: String,
    exports: AHashMap<String, ExportTarget>,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    functions: AHashSet<DeclId>,
    classes: AHashMap<DeclId, ClassSymbol>,
    modules: AHashMap<String, ModuleSymbols>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, fragment: &UnitFragment) {
        self.functions
            .extend(fragment.functions.iter().map(|f| f.id.clone()));
        for class in &fragment.classes {
            let mut methods = AHashMap::with_capacity(class.methods.len());
            for method in &class.methods {
                methods
                    .entry(method.name.clone())
                    .or_insert_with(|| method.id.clone());
            }
            self.classes.insert(
                class.id.clone(),
                ClassSymbol {
                    file_path: fragment.file_path.clone(),
                    super_class: class.super_class.clone(),
                    constructor: class.constructor.clone(),
                    methods,
                },
            );
        }
        let exports = fragment
            .exports
            .iter()
            .map(|e| (e.name.clone(), e.target.clone()))
            .collect();
        self.modules.insert(
            module_key(&fragment.file_path),
            ModuleSymbols {
                file_path: fragment.file_path.clone(),
                exports,
            },
        );
    }

    pub fn is_function(&self, id: &str) -> bool {
        self.functions.contains(id)
    }

    pub fn is_class(&self, id: &str) -> bool {
        self.classes.contains_key(id)
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    fn module(&self, importer: &str, specifier: &str) -> Option<&ModuleSymbols> {
        let key = resolve_specifier(importer, specifier);
        self.modules
            .get(&key)
            .or_else(|| self.modules.get(&format!("{}/index", key)))
    }

    /// Declaration exported as `name` by the module `specifier` names
    pub fn resolve_export(&self, importer: &str, specifier: &str, name: &str) -> Option<DeclId> {
        let mut importer = importer.to_string();
        let mut specifier = specifier.to_string();
        let mut name = name.to_string();
        for _ in 0..MAX_REEXPORT_DEPTH {
            let module = self.module(&importer, &specifier)?;
            match module.exports.get(&name)? {
                ExportTarget::Decl(id) => return Some(id.clone()),
                ExportTarget::Reexport {
                    module: next,
                    name: next_name,
                } => {
                    importer = module.file_path.clone();
                    specifier = next.clone();
                    name = next_name.clone();
                }
                ExportTarget::Value(_) => return None,
            }
        }
        None
    }

    /// Declaration a reference from `file` denotes, when it is known
    pub fn resolve_ref(&self, file: &str, target: &DeclRef, imports: bool) -> Option<DeclId> {
        match target {
            DeclRef::Decl(id) if self.is_function(id) || self.is_class(id) => Some(id.clone()),
            DeclRef::Imported { module, name } if imports => self.resolve_export(file, module, name),
            _ => None,
        }
    }

    /// Method `name` of `class`, walking `extends` across units
    ///
    /// `constructor` names the class's constructor function.
    pub fn lookup_method(
        &self,
        file: &str,
        class: &DeclRef,
        name: &str,
        max_depth: usize,
        imports: bool,
    ) -> Option<DeclId> {
        let mut current = self.resolve_ref(file, class, imports)?;
        let mut seen = AHashSet::new();
        for _ in 0..max_depth {
            if !seen.insert(current.clone()) {
                return None;
            }
            let symbol = self.classes.get(&current)?;
            let found = if name == "constructor" {
                Some(&symbol.constructor)
            } else {
                symbol.methods.get(name)
            };
            if let Some(id) = found {
                return Some(id.clone());
            }
            let parent = symbol.super_class.as_ref()?;
            current = self.resolve_ref(&symbol.file_path, parent, imports)?;
        }
        None
    }
}

/// File path without its extension, `/`-separated
pub fn module_key(path: &str) -> String {
    let path = path.replace('\\', "/");
    let path = path.strip_prefix("./").unwrap_or(&path);
    for ext in EXTENSIONS {
        if let Some(stem) = path.strip_suffix(ext) {
            return stem.to_string();
        }
    }
    path.to_string()
}

/// Module key an import specifier denotes from `importer`
pub fn resolve_specifier(importer: &str, specifier: &str) -> String {
    if !specifier.starts_with('.') {
        return module_key(specifier);
    }
    let importer = importer.replace('\\', "/");
    let mut segments: Vec<&str> = importer.split('/').collect();
    segments.pop();
    segments.retain(|s| !s.is_empty() && *s != ".");
    for part in specifier.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    module_key(&segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::call_graph::domain::{ClassEntry, FunctionEntry};
    use crate::features::ir_generation::domain::{ExportEntry, FunctionKind, IrMethod};

    fn fragment(file: &str, functions: &[&str], exports: Vec<ExportEntry>) -> UnitFragment {
        UnitFragment {
            file_path: file.to_string(),
            functions: functions
                .iter()
                .map(|f| FunctionEntry {
                    id: format!("@{}: {}", file, f),
                    kind: FunctionKind::Function,
                    class: None,
                })
                .collect(),
            exports,
            ..UnitFragment::default()
        }
    }

    #[test]
    fn test_specifier_resolution() {
        assert_eq!(resolve_specifier("src/app/main.ets", "./util"), "src/app/util");
        assert_eq!(resolve_specifier("src/app/main.ets", "../lib/io.ets"), "src/lib/io");
        assert_eq!(resolve_specifier("main.ts", "./a"), "a");
        assert_eq!(resolve_specifier("src/main.ets", "@ohos/router"), "@ohos/router");
        assert_eq!(module_key("./src/a.d.ts"), "src/a");
    }

    #[test]
    fn test_reexport_chain() {
        let mut symbols = SymbolTable::new();
        symbols.register(&fragment(
            "lib/impl.ets",
            &["helper"],
            vec![ExportEntry {
                name: "helper".to_string(),
                target: ExportTarget::Decl("@lib/impl.ets: helper".to_string()),
            }],
        ));
        symbols.register(&fragment(
            "lib/index.ets",
            &[],
            vec![ExportEntry {
                name: "run".to_string(),
                target: ExportTarget::Reexport {
                    module: "./impl".to_string(),
                    name: "helper".to_string(),
                },
            }],
        ));
        assert_eq!(
            symbols.resolve_export("app.ets", "./lib", "run"),
            Some("@lib/impl.ets: helper".to_string())
        );
        assert_eq!(symbols.resolve_export("app.ets", "./lib", "missing"), None);
    }

    #[test]
    fn test_method_lookup_walks_imported_base() {
        let mut symbols = SymbolTable::new();
        let mut base = fragment(
            "base.ets",
            &["Base.constructor", "Base.greet"],
            vec![ExportEntry {
                name: "Base".to_string(),
                target: ExportTarget::Decl("@base.ets: Base".to_string()),
            }],
        );
        base.classes.push(ClassEntry {
            id: "@base.ets: Base".to_string(),
            super_class: None,
            constructor: "@base.ets: Base.constructor".to_string(),
            methods: vec![IrMethod {
                name: "greet".to_string(),
                id: "@base.ets: Base.greet".to_string(),
                is_static: false,
            }],
        });
        let mut derived = fragment("derived.ets", &["Derived.constructor"], vec![]);
        derived.classes.push(ClassEntry {
            id: "@derived.ets: Derived".to_string(),
            super_class: Some(DeclRef::Imported {
                module: "./base".to_string(),
                name: "Base".to_string(),
            }),
            constructor: "@derived.ets: Derived.constructor".to_string(),
            methods: vec![],
        });
        symbols.register(&base);
        symbols.register(&derived);

        let derived_ref = DeclRef::Decl("@derived.ets: Derived".to_string());
        assert_eq!(
            symbols.lookup_method("derived.ets", &derived_ref, "greet", 8, true),
            Some("@base.ets: Base.greet".to_string())
        );
        assert_eq!(symbols.lookup_method("derived.ets", &derived_ref, "greet", 8, false), None);
        assert_eq!(
            symbols.lookup_method("derived.ets", &derived_ref, "constructor", 8, true),
            Some("@derived.ets: Derived.constructor".to_string())
        );
        assert_eq!(symbols.lookup_method("derived.ets", &derived_ref, "missing", 8, true), None);
    }
}
