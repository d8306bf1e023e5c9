//! The static semantic analyzer: one recursive walk over the AST that
//! registers every class/method in a [`ClassManager`], enforces scope
//! discipline through a [`ScopeManager`], and raises the first rule
//! violation it finds. A tagged-`Expr` match and a handful of plain
//! functions, rather than a visitor object with dynamic dispatch.

use crate::ast::{Assign, Block, ClassDecl, Expr, MethodDecl, Program};
use crate::error::Sol25Error;

use super::symbol_table::{ClassManager, ScopeManager};

/// Runs static semantic analysis over `program`, mutating a fresh symbol
/// table as it goes. Returns on the first rule violation; the symbol table
/// itself is dropped with the `Analyzer` once this returns.
pub fn analyze(program: &Program) -> Result<(), Sol25Error> {
    let mut analyzer = Analyzer::new();
    analyzer.run(program)
}

struct Analyzer {
    classes: ClassManager,
    scopes: ScopeManager,
    current_class: Option<String>,
}

impl Analyzer {
    fn new() -> Self {
        Self {
            classes: ClassManager::new(),
            scopes: ScopeManager::new(),
            current_class: None,
        }
    }

    fn run(&mut self, program: &Program) -> Result<(), Sol25Error> {
        self.classes.load_builtins();

        // Pre-pass: register every class declaration up front (name -> parent)
        // so methods can refer to classes declared later in the source.
        for class in &program.classes {
            self.classes.declare_class(&class.name, &class.parent)?;
            self.classes.reference_class(&class.parent);
        }

        for class in &program.classes {
            self.visit_class(class)?;
        }

        self.classes.verify_all_defined()?;
        self.check_main_run()?;
        self.check_acyclic_inheritance()?;
        Ok(())
    }

    fn check_main_run(&self) -> Result<(), Sol25Error> {
        let main = self
            .classes
            .lookup_class("Main")
            .filter(|c| c.is_defined)
            .ok_or_else(|| Sol25Error::main_run("class 'Main' is missing"))?;
        let run = main
            .methods
            .get("run")
            .ok_or_else(|| Sol25Error::main_run("class 'Main' is missing method 'run'"))?;
        if run.param_count != 0 {
            return Err(Sol25Error::arity("method 'run' must have no parameters"));
        }
        Ok(())
    }

    fn check_acyclic_inheritance(&self) -> Result<(), Sol25Error> {
        for class in self.classes.all_classes() {
            let mut visited = std::collections::HashSet::new();
            let mut current = Some(class.name.clone());
            while let Some(name) = current {
                if !visited.insert(name.clone()) {
                    return Err(Sol25Error::other_semantic(format!(
                        "cyclic inheritance detected for class '{name}'"
                    )));
                }
                current = self.classes.lookup_class(&name).and_then(|c| c.parent.clone());
            }
        }
        Ok(())
    }

    fn visit_class(&mut self, class: &ClassDecl) -> Result<(), Sol25Error> {
        self.current_class = Some(class.name.clone());
        // Register every method before analyzing any body, so a `self` send
        // can resolve a sibling method declared later in the same class.
        for method in &class.methods {
            self.register_method(method)?;
        }
        for method in &class.methods {
            self.visit_method_body(method)?;
        }
        self.current_class = None;
        Ok(())
    }

    fn register_method(&mut self, method: &MethodDecl) -> Result<(), Sol25Error> {
        let current_class = self
            .current_class
            .clone()
            .ok_or_else(|| Sol25Error::internal("method visited outside of any class context"))?;

        if method.selector == "run" && method.body.arity() != 0 {
            return Err(Sol25Error::arity("method 'run' must have no parameters"));
        }

        if let Some(parent) = self
            .classes
            .lookup_class(&current_class)
            .and_then(|c| c.parent.clone())
        {
            if let Some(parent_method) = self.classes.lookup_method(&parent, &method.selector) {
                if parent_method.param_count != method.body.arity() {
                    return Err(Sol25Error::arity(format!(
                        "override of method '{}' in class '{current_class}' has incorrect arity: \
                         parent declares {}, override declares {}",
                        method.selector,
                        parent_method.param_count,
                        method.body.arity()
                    )));
                }
            }
        }

        self.classes
            .insert_method(&current_class, &method.selector, method.body.clone())
    }

    fn visit_method_body(&mut self, method: &MethodDecl) -> Result<(), Sol25Error> {
        self.scopes.enter_scope();
        self.scopes.define_pseudovariable("self")?;
        self.scopes.define_pseudovariable("super")?;
        let result = self.visit_block_body(&method.body);
        self.scopes.exit_scope()?;
        result
    }

    fn visit_block(&mut self, block: &Block) -> Result<(), Sol25Error> {
        self.scopes.enter_scope();
        let result = self.visit_block_body(block);
        self.scopes.exit_scope()?;
        result
    }

    fn visit_block_body(&mut self, block: &Block) -> Result<(), Sol25Error> {
        // A collision against another formal parameter already in this
        // block is a redefinition (OtherSemantic); a collision against
        // anything else already in scope (only the inherited Pseudo set
        // reaches here, since each block scope starts empty otherwise) is a
        // VariableCollision. `ScopeManager::define_formal_parameter`'s own
        // unconditional VariableCollision only fires for the second case,
        // so the redefinition case is classified here first.
        for param in &block.parameters {
            if self.scopes.is_defined(param) {
                if self.scopes.is_formal_parameter(param) {
                    return Err(Sol25Error::other_semantic(format!(
                        "redefinition of formal parameter '{param}'"
                    )));
                }
                return Err(Sol25Error::variable_collision(format!(
                    "collision of formal parameter '{param}'"
                )));
            }
            self.scopes.define_formal_parameter(param)?;
        }
        for stmt in &block.statements {
            self.visit_assign(stmt)?;
        }
        Ok(())
    }

    fn visit_assign(&mut self, assign: &Assign) -> Result<(), Sol25Error> {
        if self.scopes.is_formal_parameter(&assign.target) {
            return Err(Sol25Error::variable_collision(format!(
                "assignment to formal parameter '{}' is not allowed",
                assign.target
            )));
        }
        if !self.scopes.is_defined(&assign.target) {
            self.scopes.define_variable(&assign.target);
        }
        self.visit_expr(&assign.expr)
    }

    fn visit_expr(&mut self, expr: &Expr) -> Result<(), Sol25Error> {
        match expr {
            Expr::IntLiteral(_)
            | Expr::StringLiteral(_)
            | Expr::NilLiteral
            | Expr::TrueLiteral
            | Expr::FalseLiteral => Ok(()),
            Expr::IdentifierRef(name) => self.check_identifier(name),
            Expr::BlockLiteral(block) => self.visit_block(block),
            Expr::Send {
                receiver,
                selector,
                args,
            } => self.visit_send(receiver, selector, args),
        }
    }

    fn check_identifier(&self, name: &str) -> Result<(), Sol25Error> {
        if name.chars().next().is_some_and(|c| c.is_uppercase()) {
            if self.classes.lookup_class(name).is_none() {
                return Err(Sol25Error::undefined_symbol(format!(
                    "class '{name}' is not defined"
                )));
            }
        } else if name != "self" && name != "super" && !self.scopes.is_defined(name) {
            return Err(Sol25Error::undefined_symbol(format!(
                "variable '{name}' is not defined"
            )));
        }
        Ok(())
    }

    fn visit_send(&mut self, receiver: &Expr, selector: &str, args: &[Expr]) -> Result<(), Sol25Error> {
        self.visit_expr(receiver)?;
        for arg in args {
            self.visit_expr(arg)?;
        }

        match receiver {
            Expr::IdentifierRef(name) if name.chars().next().is_some_and(|c| c.is_uppercase()) => {
                self.check_class_method_send(name, selector, args.len())
            }
            Expr::IdentifierRef(name) if name == "self" => {
                self.check_self_send(selector, args.len())
            }
            Expr::IdentifierRef(name) => {
                // Already checked defined by `visit_expr` above; no static
                // arity check for a non-`self` receiver (§9 open question #2).
                let _ = name;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn check_class_method_send(
        &self,
        class_name: &str,
        selector: &str,
        arg_count: usize,
    ) -> Result<(), Sol25Error> {
        if let Some(method) = self.classes.lookup_method(class_name, selector) {
            if method.param_count != arg_count {
                return Err(Sol25Error::arity(format!(
                    "class method '{selector}' of class '{class_name}' expects \
                     {} arguments, but was given {arg_count}",
                    method.param_count
                )));
            }
            return Ok(());
        }
        if selector.contains(':') {
            return self.check_composite_selector(class_name, selector, arg_count);
        }
        Err(Sol25Error::undefined_symbol(format!(
            "class '{class_name}' has no class method '{selector}'"
        )))
    }

    fn check_self_send(&self, selector: &str, arg_count: usize) -> Result<(), Sol25Error> {
        let Some(current_class) = self.current_class.as_deref() else {
            return Ok(());
        };
        if let Some(method) = self.classes.lookup_method(current_class, selector) {
            if method.param_count != arg_count {
                return Err(Sol25Error::arity(format!(
                    "instance method '{selector}' of class '{current_class}' expects \
                     {} arguments, but was given {arg_count}",
                    method.param_count
                )));
            }
        }
        Ok(())
    }

    /// A composite selector like `startsWith:endsBefore:` is resolved one
    /// keyword part at a time against the receiver class. `startsWith` must
    /// be immediately followed by `endsBefore`, and `ifTrue` by `ifFalse`
    /// (hard-coded structural constraints, §4.4); the sum of each known
    /// part's declared arity must equal the number of arguments actually
    /// passed. A part that the class doesn't know contributes nothing to
    /// the expected count.
    fn check_composite_selector(
        &self,
        class_name: &str,
        selector: &str,
        arg_count: usize,
    ) -> Result<(), Sol25Error> {
        let parts: Vec<&str> = selector.split(':').filter(|p| !p.is_empty()).collect();

        for (i, part) in parts.iter().enumerate() {
            if *part == "startsWith" && parts.get(i + 1) != Some(&"endsBefore") {
                return Err(Sol25Error::undefined_symbol(
                    "'startsWith:' must be immediately followed by 'endsBefore:'",
                ));
            }
            if *part == "ifTrue" && parts.get(i + 1) != Some(&"ifFalse") {
                return Err(Sol25Error::undefined_symbol(
                    "'ifTrue:' must be immediately followed by 'ifFalse:'",
                ));
            }
        }

        let expected: usize = parts
            .iter()
            .filter_map(|part| {
                let keyword = format!("{part}:");
                self.classes
                    .lookup_method(class_name, &keyword)
                    .map(|m| m.param_count)
            })
            .sum();

        if expected != arg_count {
            return Err(Sol25Error::arity(format!(
                "combined method call '{selector}' of class '{class_name}' expects \
                 {expected} arguments, but got {arg_count}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build;
    use crate::parser::parse;

    fn analyze_source(src: &str) -> Result<(), Sol25Error> {
        let parsed = parse(src);
        assert!(parsed.ok(), "unexpected parse errors: {:?}", parsed.errors);
        let program = build(&parsed.syntax()).expect("AST build should succeed");
        analyze(&program)
    }

    #[test]
    fn accepts_the_minimal_program() {
        assert!(analyze_source("class Main : Object { run [ | ] }").is_ok());
    }

    #[test]
    fn rejects_missing_main() {
        let err = analyze_source("class A : Object { run [ | ] }").unwrap_err();
        assert_eq!(err.exit_code(), 31);
    }

    #[test]
    fn rejects_run_with_parameters() {
        let err = analyze_source("class Main : Object { run [ :x | ] }").unwrap_err();
        assert_eq!(err.exit_code(), 33);
    }

    #[test]
    fn rejects_cyclic_inheritance() {
        let err = analyze_source(
            "class A : B { } class B : A { } class Main : Object { run [ | ] }",
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 35);
    }

    #[test]
    fn rejects_assignment_to_a_formal_parameter() {
        let err = analyze_source(
            "class Main : Object { run [ | b := [ :x | x := x plus: 1 . y := x . ] . \
             y := 100 . _ := b value: 10 . ] }",
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 34);
    }

    #[test]
    fn rejects_duplicate_method_in_a_class() {
        let err = analyze_source(
            "class Main : Object { run [ | ] run [ | ] }",
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 35);
    }

    #[test]
    fn rejects_redeclaring_a_builtin_class() {
        let err = analyze_source("class Object : Object { } class Main : Object { run [ | ] }")
            .unwrap_err();
        assert_eq!(err.exit_code(), 35);
    }

    #[test]
    fn accepts_a_class_method_send() {
        assert!(analyze_source(
            "class Main : Object { run [ | x := Integer from: 2 . ] }"
        )
        .is_ok());
    }

    #[test]
    fn rejects_undefined_variable() {
        let err = analyze_source("class Main : Object { run [ | x := y . ] }").unwrap_err();
        assert_eq!(err.exit_code(), 32);
    }

    #[test]
    fn rejects_if_true_without_if_false() {
        let err = analyze_source(
            "class Main : Object { run [ | x := True ifTrue: [ | ] . ] }",
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 32);
    }

    #[test]
    fn accepts_if_true_if_false_composite_selector() {
        assert!(analyze_source(
            "class Main : Object { run [ | x := True ifTrue: [ | ] ifFalse: [ | ] . ] }"
        )
        .is_ok());
    }

    #[test]
    fn override_with_mismatched_arity_is_an_arity_error() {
        let err = analyze_source(
            "class A : Object { foo [ | ] } \
             class B : A { foo [ :x | ] } \
             class Main : Object { run [ | ] }",
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 33);
    }

    #[test]
    fn self_send_with_wrong_arity_in_current_class_is_caught() {
        let err = analyze_source(
            "class Main : Object { \
               run [ | x := self greet . ] \
               greet [ :x | ] \
             }",
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 33);
    }

    #[test]
    fn non_self_receiver_send_is_not_arity_checked() {
        assert!(analyze_source(
            "class Main : Object { run [ | x := 1 . y := x plus: 1 plus: 2 . ] }"
        )
        .is_ok());
    }
}
