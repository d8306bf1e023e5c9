//! The `ClassManager`/`ScopeManager` pair: a class/method registry and a
//! lexical-scope stack, both built up during semantic analysis and
//! discarded once it finishes.
//!
//! `indexmap::IndexMap` backs both, so class/method/scope iteration order
//! always matches declaration order.

use indexmap::IndexMap;

use crate::ast::Block;
use crate::error::Sol25Error;

/// A method as the symbol table sees it — either declared by user source
/// (`body` present) or one of the preloaded built-ins (`body` absent).
#[derive(Debug, Clone)]
pub struct MethodSymbol {
    pub selector: String,
    pub param_count: usize,
    pub is_builtin: bool,
    pub body: Option<Block>,
}

impl MethodSymbol {
    fn builtin(selector: &str, param_count: usize) -> Self {
        Self {
            selector: selector.to_string(),
            param_count,
            is_builtin: true,
            body: None,
        }
    }

    fn user(selector: String, body: Block) -> Self {
        let param_count = body.arity();
        Self {
            selector,
            param_count,
            is_builtin: false,
            body: Some(body),
        }
    }
}

/// A class as the symbol table sees it. `is_defined` distinguishes a class
/// that has actually been declared from one merely referenced so far (as
/// someone else's parent) — see [`ClassManager::declare_class`].
#[derive(Debug, Clone)]
pub struct ClassSymbol {
    pub name: String,
    pub parent: Option<String>,
    pub methods: IndexMap<String, MethodSymbol>,
    pub is_builtin: bool,
    pub is_defined: bool,
}

impl ClassSymbol {
    fn new(name: impl Into<String>, parent: Option<&str>, is_builtin: bool, is_defined: bool) -> Self {
        Self {
            name: name.into(),
            parent: parent.map(str::to_string),
            methods: IndexMap::new(),
            is_builtin,
            is_defined,
        }
    }

    fn add_builtin_method(&mut self, selector: &str, param_count: usize) {
        self.methods
            .insert(selector.to_string(), MethodSymbol::builtin(selector, param_count));
    }
}

/// Registry of every class SOL25 knows about: the seven preloaded built-ins
/// plus whatever the program declares.
#[derive(Debug, Default)]
pub struct ClassManager {
    classes: IndexMap<String, ClassSymbol>,
}

impl ClassManager {
    pub fn new() -> Self {
        Self {
            classes: IndexMap::new(),
        }
    }

    /// Preloads `Object`, `Nil`, `True`, `False`, `Integer`, `String`,
    /// `Block` with the method set of §6.
    pub fn load_builtins(&mut self) {
        let mut object = ClassSymbol::new("Object", None, true, true);
        object.add_builtin_method("new", 0);
        object.add_builtin_method("from:", 1);
        object.add_builtin_method("identicalTo:", 1);
        object.add_builtin_method("equalTo:", 1);
        object.add_builtin_method("asString", 0);
        object.add_builtin_method("isNumber", 0);
        object.add_builtin_method("isString", 0);
        object.add_builtin_method("isBlock", 0);
        object.add_builtin_method("isNil", 0);
        self.classes.insert(object.name.clone(), object);

        let mut nil = ClassSymbol::new("Nil", Some("Object"), true, true);
        nil.add_builtin_method("asString", 0);
        self.classes.insert(nil.name.clone(), nil);

        for name in ["True", "False"] {
            let mut class = ClassSymbol::new(name, Some("Object"), true, true);
            class.add_builtin_method("not", 0);
            class.add_builtin_method("and:", 1);
            class.add_builtin_method("or:", 1);
            class.add_builtin_method("ifTrue:ifFalse:", 2);
            self.classes.insert(class.name.clone(), class);
        }

        let mut integer = ClassSymbol::new("Integer", Some("Object"), true, true);
        integer.add_builtin_method("equalTo:", 1);
        integer.add_builtin_method("greaterThan:", 1);
        integer.add_builtin_method("plus:", 1);
        integer.add_builtin_method("minus:", 1);
        integer.add_builtin_method("multiplyBy:", 1);
        integer.add_builtin_method("divBy:", 1);
        integer.add_builtin_method("asString", 0);
        integer.add_builtin_method("asInteger", 0);
        integer.add_builtin_method("timesRepeat:", 1);
        self.classes.insert(integer.name.clone(), integer);

        let mut string = ClassSymbol::new("String", Some("Object"), true, true);
        string.add_builtin_method("read", 0);
        string.add_builtin_method("print", 0);
        string.add_builtin_method("equalTo:", 1);
        string.add_builtin_method("asString", 0);
        string.add_builtin_method("asInteger", 0);
        string.add_builtin_method("concatenateWith:", 1);
        string.add_builtin_method("startsWith:endsBefore:", 2);
        self.classes.insert(string.name.clone(), string);

        let mut block = ClassSymbol::new("Block", Some("Object"), true, true);
        block.add_builtin_method("value", 0);
        block.add_builtin_method("value:", 1);
        block.add_builtin_method("whileTrue:", 1);
        self.classes.insert(block.name.clone(), block);
    }

    /// Declares `name` with parent `parent`. If `name` was previously only
    /// referenced (e.g. as someone else's parent, not yet declared itself),
    /// this marks it defined and records its parent. Fails if `name` is a
    /// built-in, or if it has already been declared once.
    pub fn declare_class(&mut self, name: &str, parent: &str) -> Result<(), Sol25Error> {
        if let Some(existing) = self.classes.get_mut(name) {
            if existing.is_builtin {
                return Err(Sol25Error::other_semantic(format!(
                    "cannot redeclare built-in class '{name}'"
                )));
            }
            if existing.is_defined {
                return Err(Sol25Error::other_semantic(format!(
                    "class '{name}' is defined multiple times"
                )));
            }
            existing.is_defined = true;
            existing.parent = Some(parent.to_string());
            return Ok(());
        }
        self.classes
            .insert(name.to_string(), ClassSymbol::new(name, Some(parent), false, true));
        Ok(())
    }

    /// Records a reference to `name` (e.g. as a parent) without declaring
    /// it, so that forward references resolve once the real declaration is
    /// seen, and [`Self::verify_all_defined`] can still flag it if it never
    /// is.
    pub fn reference_class(&mut self, name: &str) {
        self.classes
            .entry(name.to_string())
            .or_insert_with(|| ClassSymbol::new(name, None, false, false));
    }

    /// Inserts `selector` into `class_name`'s method table. Fails if the
    /// class is built-in or already has a method with that selector.
    pub fn insert_method(
        &mut self,
        class_name: &str,
        selector: &str,
        body: Block,
    ) -> Result<(), Sol25Error> {
        let class = self.classes.get_mut(class_name).ok_or_else(|| {
            Sol25Error::internal(format!("insert_method on undeclared class '{class_name}'"))
        })?;
        if class.is_builtin {
            return Err(Sol25Error::other_semantic(format!(
                "cannot define method '{selector}' inside built-in class '{class_name}'"
            )));
        }
        if class.methods.contains_key(selector) {
            return Err(Sol25Error::other_semantic(format!(
                "method '{selector}' is already defined in class '{class_name}'"
            )));
        }
        class
            .methods
            .insert(selector.to_string(), MethodSymbol::user(selector.to_string(), body));
        Ok(())
    }

    pub fn lookup_class(&self, name: &str) -> Option<&ClassSymbol> {
        self.classes.get(name)
    }

    /// Walks the parent chain starting at `class_name` looking for
    /// `selector`, stopping (and returning `None`) if a class is revisited —
    /// an inheritance cycle must not hang this lookup.
    pub fn lookup_method(&self, class_name: &str, selector: &str) -> Option<&MethodSymbol> {
        let mut visited = std::collections::HashSet::new();
        let mut current = Some(class_name.to_string());
        while let Some(name) = current {
            if !visited.insert(name.clone()) {
                return None;
            }
            let class = self.classes.get(&name)?;
            if let Some(method) = class.methods.get(selector) {
                return Some(method);
            }
            current = class.parent.clone();
        }
        None
    }

    /// Every class referenced (as a parent or otherwise) must end up
    /// declared.
    pub fn verify_all_defined(&self) -> Result<(), Sol25Error> {
        for class in self.classes.values() {
            if !class.is_defined {
                return Err(Sol25Error::undefined_symbol(format!(
                    "class '{}' is not defined",
                    class.name
                )));
            }
        }
        Ok(())
    }

    /// All declared classes in insertion order, for the post-pass
    /// acyclicity check.
    pub fn all_classes(&self) -> impl Iterator<Item = &ClassSymbol> {
        self.classes.values()
    }
}

/// What a name in a [`Scope`] is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Variable,
    FormalParameter,
    Pseudo,
}

type Scope = IndexMap<String, Binding>;

/// A stack of lexical scopes. Entering a scope carries forward only its
/// parent's `Pseudo` bindings (`self`/`super`); variables and formal
/// parameters never leak across a block boundary.
#[derive(Debug, Default)]
pub struct ScopeManager {
    scopes: Vec<Scope>,
}

impl ScopeManager {
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    pub fn enter_scope(&mut self) {
        let mut scope = Scope::new();
        if let Some(top) = self.scopes.last() {
            for (name, binding) in top {
                if *binding == Binding::Pseudo {
                    scope.insert(name.clone(), Binding::Pseudo);
                }
            }
        }
        self.scopes.push(scope);
    }

    pub fn exit_scope(&mut self) -> Result<(), Sol25Error> {
        self.scopes
            .pop()
            .map(|_| ())
            .ok_or_else(|| Sol25Error::internal("attempted to exit a scope with an empty stack"))
    }

    fn top_mut(&mut self) -> &mut Scope {
        if self.scopes.is_empty() {
            self.scopes.push(Scope::new());
        }
        self.scopes.last_mut().expect("just ensured non-empty")
    }

    fn top(&self) -> Option<&Scope> {
        self.scopes.last()
    }

    pub fn define_variable(&mut self, id: &str) {
        self.top_mut().entry(id.to_string()).or_insert(Binding::Variable);
    }

    pub fn define_formal_parameter(&mut self, id: &str) -> Result<(), Sol25Error> {
        let top = self.top_mut();
        if top.contains_key(id) {
            return Err(Sol25Error::variable_collision(format!(
                "collision of formal parameter '{id}'"
            )));
        }
        top.insert(id.to_string(), Binding::FormalParameter);
        Ok(())
    }

    pub fn define_pseudovariable(&mut self, id: &str) -> Result<(), Sol25Error> {
        let top = self.top_mut();
        if top.contains_key(id) {
            return Err(Sol25Error::variable_collision(format!(
                "pseudo-variable '{id}' is already defined"
            )));
        }
        top.insert(id.to_string(), Binding::Pseudo);
        Ok(())
    }

    pub fn is_defined(&self, id: &str) -> bool {
        self.top().is_some_and(|s| s.contains_key(id))
    }

    pub fn is_formal_parameter(&self, id: &str) -> bool {
        self.top()
            .and_then(|s| s.get(id))
            .is_some_and(|b| *b == Binding::FormalParameter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Block;

    fn empty_block() -> Block {
        Block {
            parameters: Vec::new(),
            statements: Vec::new(),
        }
    }

    #[test]
    fn loads_all_seven_builtins() {
        let mut cm = ClassManager::new();
        cm.load_builtins();
        for name in ["Object", "Nil", "True", "False", "Integer", "String", "Block"] {
            assert!(cm.lookup_class(name).is_some(), "missing builtin {name}");
        }
    }

    #[test]
    fn object_has_is_nil() {
        let mut cm = ClassManager::new();
        cm.load_builtins();
        assert!(cm.lookup_method("Object", "isNil").is_some());
    }

    #[test]
    fn declaring_a_builtin_name_fails() {
        let mut cm = ClassManager::new();
        cm.load_builtins();
        let err = cm.declare_class("Object", "Integer").unwrap_err();
        assert_eq!(err.exit_code(), 35);
    }

    #[test]
    fn redeclaring_a_class_fails() {
        let mut cm = ClassManager::new();
        cm.declare_class("A", "Object").unwrap();
        let err = cm.declare_class("A", "Object").unwrap_err();
        assert_eq!(err.exit_code(), 35);
    }

    #[test]
    fn referenced_then_declared_class_becomes_defined() {
        let mut cm = ClassManager::new();
        cm.reference_class("A");
        assert!(!cm.lookup_class("A").unwrap().is_defined);
        cm.declare_class("A", "Object").unwrap();
        assert!(cm.lookup_class("A").unwrap().is_defined);
    }

    #[test]
    fn method_lookup_walks_the_parent_chain() {
        let mut cm = ClassManager::new();
        cm.load_builtins();
        cm.declare_class("A", "Object").unwrap();
        assert!(cm.lookup_method("A", "asString").is_some());
    }

    #[test]
    fn method_lookup_stops_on_a_cycle() {
        let mut cm = ClassManager::new();
        cm.declare_class("A", "B").unwrap();
        cm.declare_class("B", "A").unwrap();
        assert!(cm.lookup_method("A", "whatever").is_none());
    }

    #[test]
    fn insert_method_rejects_duplicates() {
        let mut cm = ClassManager::new();
        cm.declare_class("A", "Object").unwrap();
        cm.insert_method("A", "run", empty_block()).unwrap();
        let err = cm.insert_method("A", "run", empty_block()).unwrap_err();
        assert_eq!(err.exit_code(), 35);
    }

    #[test]
    fn scope_carries_only_pseudo_bindings_forward() {
        let mut sm = ScopeManager::new();
        sm.enter_scope();
        sm.define_pseudovariable("self").unwrap();
        sm.define_variable("x");
        sm.define_formal_parameter("p").unwrap();
        sm.enter_scope();
        assert!(sm.is_defined("self"));
        assert!(!sm.is_defined("x"));
        assert!(!sm.is_defined("p"));
    }

    #[test]
    fn formal_parameter_collision_is_an_error() {
        let mut sm = ScopeManager::new();
        sm.enter_scope();
        sm.define_formal_parameter("x").unwrap();
        let err = sm.define_formal_parameter("x").unwrap_err();
        assert_eq!(err.exit_code(), 34);
    }

    #[test]
    fn exiting_an_empty_scope_stack_is_internal_error() {
        let mut sm = ScopeManager::new();
        let err = sm.exit_scope().unwrap_err();
        assert_eq!(err.exit_code(), 99);
    }
}
