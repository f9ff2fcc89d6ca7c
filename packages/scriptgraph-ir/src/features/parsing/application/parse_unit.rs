//! Parse unit use case

use rayon::prelude::*;
use tracing::debug;

use crate::features::parsing::domain::SourceUnit;
use crate::features::parsing::ports::SourceParser;
use crate::shared::models::Result;

/// Parse unit use case
pub struct ParseUnitUseCase<P: SourceParser> {
    parser: P,
}

impl<P: SourceParser> ParseUnitUseCase<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }

    /// Parse one file
    pub fn execute(&self, source: &str, file_path: &str) -> Result<SourceUnit> {
        let unit = self.parser.parse(source, file_path)?;
        debug!(
            file = file_path,
            language = self.parser.language_name(),
            statements = unit.body.len(),
            "Parsed source unit"
        );
        Ok(unit)
    }

    /// Parse many `(path, source)` pairs in parallel, keeping input order
    pub fn execute_batch(&self, files: &[(String, String)]) -> Vec<Result<SourceUnit>> {
        crate::init_rayon();
        files
            .par_iter()
            .map(|(path, source)| self.execute(source, path))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::domain::{Stmt, StmtKind};
    use crate::shared::models::{ScriptGraphError, Span};

    struct MockParser;

    impl SourceParser for MockParser {
        fn parse(&self, source: &str, file_path: &str) -> Result<SourceUnit> {
            if source.is_empty() {
                return Err(ScriptGraphError::parse("empty input").with_file(file_path));
            }
            Ok(SourceUnit::new(
                file_path,
                vec![Stmt::new(StmtKind::Empty, Span::zero())],
            ))
        }

        fn supports_extension(&self, ext: &str) -> bool {
            ext == "ets"
        }

        fn language_name(&self) -> &'static str {
            "mock"
        }
    }

    #[test]
    fn test_parse_unit_use_case() {
        let use_case = ParseUnitUseCase::new(MockParser);
        let unit = use_case.execute(";", "entry.ets").unwrap();
        assert_eq!(unit.file_path, "entry.ets");
        assert_eq!(unit.body.len(), 1);
    }

    #[test]
    fn test_batch_keeps_order_and_isolates_failures() {
        let use_case = ParseUnitUseCase::new(MockParser);
        let files = vec![
            ("a.ets".to_string(), ";".to_string()),
            ("b.ets".to_string(), String::new()),
            ("c.ets".to_string(), ";".to_string()),
        ];
        let results = use_case.execute_batch(&files);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().file_path, "c.ets");
    }
}
