//! TypeScript tree-sitter node kinds
//!
//! These constants match the node type names of the tree-sitter-typescript
//! grammar (which embeds the JavaScript grammar).

use lazy_static::lazy_static;
use std::collections::HashSet;

// Program structure
pub const PROGRAM: &str = "program";
pub const ERROR: &str = "ERROR";
pub const COMMENT: &str = "comment";

// Declarations
pub const LEXICAL_DECLARATION: &str = "lexical_declaration";
pub const VARIABLE_DECLARATION: &str = "variable_declaration";
pub const VARIABLE_DECLARATOR: &str = "variable_declarator";
pub const FUNCTION_DECLARATION: &str = "function_declaration";
pub const GENERATOR_FUNCTION_DECLARATION: &str = "generator_function_declaration";
pub const CLASS_DECLARATION: &str = "class_declaration";
pub const ABSTRACT_CLASS_DECLARATION: &str = "abstract_class_declaration";
pub const INTERFACE_DECLARATION: &str = "interface_declaration";
pub const TYPE_ALIAS_DECLARATION: &str = "type_alias_declaration";
pub const ENUM_DECLARATION: &str = "enum_declaration";
pub const ENUM_ASSIGNMENT: &str = "enum_assignment";
pub const AMBIENT_DECLARATION: &str = "ambient_declaration";
pub const FUNCTION_SIGNATURE: &str = "function_signature";

// Statements
pub const EXPRESSION_STATEMENT: &str = "expression_statement";
pub const STATEMENT_BLOCK: &str = "statement_block";
pub const RETURN_STATEMENT: &str = "return_statement";
pub const THROW_STATEMENT: &str = "throw_statement";
pub const IF_STATEMENT: &str = "if_statement";
pub const ELSE_CLAUSE: &str = "else_clause";
pub const WHILE_STATEMENT: &str = "while_statement";
pub const DO_STATEMENT: &str = "do_statement";
pub const FOR_STATEMENT: &str = "for_statement";
pub const FOR_IN_STATEMENT: &str = "for_in_statement";
pub const TRY_STATEMENT: &str = "try_statement";
pub const CATCH_CLAUSE: &str = "catch_clause";
pub const FINALLY_CLAUSE: &str = "finally_clause";
pub const SWITCH_STATEMENT: &str = "switch_statement";
pub const SWITCH_CASE: &str = "switch_case";
pub const SWITCH_DEFAULT: &str = "switch_default";
pub const BREAK_STATEMENT: &str = "break_statement";
pub const CONTINUE_STATEMENT: &str = "continue_statement";
pub const LABELED_STATEMENT: &str = "labeled_statement";
pub const EMPTY_STATEMENT: &str = "empty_statement";

// Import/Export
pub const IMPORT_STATEMENT: &str = "import_statement";
pub const IMPORT_CLAUSE: &str = "import_clause";
pub const NAMED_IMPORTS: &str = "named_imports";
pub const IMPORT_SPECIFIER: &str = "import_specifier";
pub const NAMESPACE_IMPORT: &str = "namespace_import";
pub const EXPORT_STATEMENT: &str = "export_statement";
pub const EXPORT_CLAUSE: &str = "export_clause";
pub const EXPORT_SPECIFIER: &str = "export_specifier";

// Functions and parameters
pub const FUNCTION: &str = "function";
pub const FUNCTION_EXPRESSION: &str = "function_expression";
pub const GENERATOR_FUNCTION: &str = "generator_function";
pub const ARROW_FUNCTION: &str = "arrow_function";
pub const FORMAL_PARAMETERS: &str = "formal_parameters";
pub const REQUIRED_PARAMETER: &str = "required_parameter";
pub const OPTIONAL_PARAMETER: &str = "optional_parameter";

// Classes
pub const CLASS: &str = "class";
pub const CLASS_HERITAGE: &str = "class_heritage";
pub const EXTENDS_CLAUSE: &str = "extends_clause";
pub const METHOD_DEFINITION: &str = "method_definition";
pub const PUBLIC_FIELD_DEFINITION: &str = "public_field_definition";
pub const FIELD_DEFINITION: &str = "field_definition";

// Expressions
pub const IDENTIFIER: &str = "identifier";
pub const SHORTHAND_PROPERTY_IDENTIFIER: &str = "shorthand_property_identifier";
pub const PROPERTY_IDENTIFIER: &str = "property_identifier";
pub const PRIVATE_PROPERTY_IDENTIFIER: &str = "private_property_identifier";
pub const THIS: &str = "this";
pub const SUPER: &str = "super";
pub const NUMBER: &str = "number";
pub const STRING: &str = "string";
pub const TEMPLATE_STRING: &str = "template_string";
pub const TEMPLATE_SUBSTITUTION: &str = "template_substitution";
pub const REGEX: &str = "regex";
pub const TRUE: &str = "true";
pub const FALSE: &str = "false";
pub const NULL: &str = "null";
pub const UNDEFINED: &str = "undefined";
pub const ARRAY: &str = "array";
pub const OBJECT: &str = "object";
pub const PAIR: &str = "pair";
pub const SPREAD_ELEMENT: &str = "spread_element";
pub const COMPUTED_PROPERTY_NAME: &str = "computed_property_name";
pub const MEMBER_EXPRESSION: &str = "member_expression";
pub const SUBSCRIPT_EXPRESSION: &str = "subscript_expression";
pub const CALL_EXPRESSION: &str = "call_expression";
pub const NEW_EXPRESSION: &str = "new_expression";
pub const OPTIONAL_CHAIN: &str = "optional_chain";
pub const BINARY_EXPRESSION: &str = "binary_expression";
pub const UNARY_EXPRESSION: &str = "unary_expression";
pub const UPDATE_EXPRESSION: &str = "update_expression";
pub const ASSIGNMENT_EXPRESSION: &str = "assignment_expression";
pub const AUGMENTED_ASSIGNMENT_EXPRESSION: &str = "augmented_assignment_expression";
pub const TERNARY_EXPRESSION: &str = "ternary_expression";
pub const PARENTHESIZED_EXPRESSION: &str = "parenthesized_expression";
pub const SEQUENCE_EXPRESSION: &str = "sequence_expression";
pub const AWAIT_EXPRESSION: &str = "await_expression";
pub const YIELD_EXPRESSION: &str = "yield_expression";

// TypeScript expression wrappers
pub const AS_EXPRESSION: &str = "as_expression";
pub const SATISFIES_EXPRESSION: &str = "satisfies_expression";
pub const NON_NULL_EXPRESSION: &str = "non_null_expression";
pub const TYPE_ASSERTION: &str = "type_assertion";

// Patterns
pub const ARRAY_PATTERN: &str = "array_pattern";
pub const OBJECT_PATTERN: &str = "object_pattern";
pub const PAIR_PATTERN: &str = "pair_pattern";
pub const ASSIGNMENT_PATTERN: &str = "assignment_pattern";
pub const OBJECT_ASSIGNMENT_PATTERN: &str = "object_assignment_pattern";
pub const SHORTHAND_PROPERTY_IDENTIFIER_PATTERN: &str = "shorthand_property_identifier_pattern";
pub const REST_PATTERN: &str = "rest_pattern";

// Types
pub const TYPE_ANNOTATION: &str = "type_annotation";
pub const GENERIC_TYPE: &str = "generic_type";

lazy_static! {
    /// Function-like nodes that lower to `FunctionDef`
    pub static ref FUNCTION_KINDS: HashSet<&'static str> = {
        let mut set = HashSet::new();
        set.insert(FUNCTION);
        set.insert(FUNCTION_EXPRESSION);
        set.insert(GENERATOR_FUNCTION);
        set.insert(ARROW_FUNCTION);
        set
    };

    /// TypeScript wrappers that carry no runtime behavior
    pub static ref TYPE_WRAPPER_KINDS: HashSet<&'static str> = {
        let mut set = HashSet::new();
        set.insert(AS_EXPRESSION);
        set.insert(SATISFIES_EXPRESSION);
        set.insert(NON_NULL_EXPRESSION);
        set
    };

    /// Type-only declarations erased at runtime
    pub static ref TYPE_ONLY_DECLARATIONS: HashSet<&'static str> = {
        let mut set = HashSet::new();
        set.insert(INTERFACE_DECLARATION);
        set.insert(TYPE_ALIAS_DECLARATION);
        set.insert(AMBIENT_DECLARATION);
        set.insert(FUNCTION_SIGNATURE);
        set
    };
}

/// Check if a node kind is a function-like expression
pub fn is_function_kind(kind: &str) -> bool {
    FUNCTION_KINDS.contains(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_sets() {
        assert!(is_function_kind(ARROW_FUNCTION));
        assert!(!is_function_kind(FUNCTION_DECLARATION));
        assert!(TYPE_WRAPPER_KINDS.contains(AS_EXPRESSION));
        assert!(TYPE_ONLY_DECLARATIONS.contains(INTERFACE_DECLARATION));
    }
}
