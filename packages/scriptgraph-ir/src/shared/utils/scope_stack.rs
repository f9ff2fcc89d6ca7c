//! Scope stack for qualified declaration names
//!
//! Tracks the chain of named enclosing declarations during lowering and
//! hands out per-scope counters for anonymous functions.

#[derive(Debug, Clone)]
struct Frame {
    name: String,
    anonymous: u32,
    anonymous_classes: u32,
}

/// Scope stack for building qualified names (`outer.inner`)
#[derive(Debug, Clone)]
pub struct ScopeStack {
    frames: Vec<Frame>,
    separator: &'static str,
    root_anonymous: u32,
    root_anonymous_classes: u32,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    /// Create a new scope stack with default separator "."
    pub fn new() -> Self {
        Self::with_separator(".")
    }

    pub fn with_separator(separator: &'static str) -> Self {
        Self {
            frames: Vec::new(),
            separator,
            root_anonymous: 0,
            root_anonymous_classes: 0,
        }
    }

    pub fn push(&mut self, name: impl Into<String>) {
        self.frames.push(Frame {
            name: name.into(),
            anonymous: 0,
            anonymous_classes: 0,
        });
    }

    pub fn pop(&mut self) -> Option<String> {
        self.frames.pop().map(|f| f.name)
    }

    /// Current qualified name
    pub fn fqn(&self) -> String {
        self.frames
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join(self.separator)
    }

    /// Qualified name of `name` declared in the current scope
    pub fn fqn_with(&self, name: &str) -> String {
        if self.frames.is_empty() {
            name.to_string()
        } else {
            format!("{}{}{}", self.fqn(), self.separator, name)
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Innermost scope name
    pub fn current(&self) -> Option<&str> {
        self.frames.last().map(|f| f.name.as_str())
    }

    /// Next anonymous function name in the current scope (`%AM0$outer`)
    ///
    /// Counters are per scope, so the same source text nested under two
    /// different parents yields two different qualified names.
    pub fn next_anonymous(&mut self) -> String {
        let (counter, owner) = match self.frames.last_mut() {
            Some(frame) => {
                let n = frame.anonymous;
                frame.anonymous += 1;
                (n, frame.name.clone())
            }
            None => {
                let n = self.root_anonymous;
                self.root_anonymous += 1;
                (n, "%dflt".to_string())
            }
        };
        format!("%AM{}${}", counter, owner)
    }

    /// Next anonymous class name in the current scope (`%AC0$outer`)
    pub fn next_anonymous_class(&mut self) -> String {
        let (counter, owner) = match self.frames.last_mut() {
            Some(frame) => {
                let n = frame.anonymous_classes;
                frame.anonymous_classes += 1;
                (n, frame.name.clone())
            }
            None => {
                let n = self.root_anonymous_classes;
                self.root_anonymous_classes += 1;
                (n, "%dflt".to_string())
            }
        };
        format!("%AC{}${}", counter, owner)
    }

    /// Execute a closure within a new scope
    pub fn with_scope<F, R>(&mut self, name: impl Into<String>, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.push(name);
        let result = f(self);
        self.pop();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_stack_fqn() {
        let mut stack = ScopeStack::new();
        stack.push("Foo");
        stack.push("bar");
        assert_eq!(stack.fqn(), "Foo.bar");
        assert_eq!(stack.fqn_with("inner"), "Foo.bar.inner");
    }

    #[test]
    fn test_with_scope_restores() {
        let mut stack = ScopeStack::new();
        stack.push("outer");
        let inner = stack.with_scope("inner", |s| s.fqn());
        assert_eq!(inner, "outer.inner");
        assert_eq!(stack.fqn(), "outer");
    }

    #[test]
    fn test_anonymous_names_are_per_scope() {
        let mut stack = ScopeStack::new();
        assert_eq!(stack.next_anonymous(), "%AM0$%dflt");
        stack.push("outer");
        assert_eq!(stack.next_anonymous(), "%AM0$outer");
        assert_eq!(stack.next_anonymous(), "%AM1$outer");
        stack.pop();
        stack.push("other");
        assert_eq!(stack.next_anonymous(), "%AM0$other");
    }

    #[test]
    fn test_anonymous_classes_count_separately() {
        let mut stack = ScopeStack::new();
        assert_eq!(stack.next_anonymous(), "%AM0$%dflt");
        assert_eq!(stack.next_anonymous_class(), "%AC0$%dflt");
        stack.push("f");
        assert_eq!(stack.next_anonymous_class(), "%AC0$f");
    }
}
