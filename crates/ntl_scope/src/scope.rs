//! The scope arena.
//!
//! Scopes are records in a flat vector indexed by [`ScopeId`], each holding
//! its bindings and a parent id. Lookup walks parent links; there is no
//! pointer chasing and no ownership cycle.

use rustc_hash::FxHashMap;

pub type ScopeId = usize;

/// What kind of declaration produced a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Builtin,
    Var,
    Const,
    Param,
    Fn,
    Class,
    Enum,
    Macro,
    Namespace,
    Import,
}

/// One name bound in a scope.
#[derive(Debug, Clone)]
pub struct Binding {
    pub kind: BindingKind,
    /// Source line of the declaration; 0 for builtins.
    pub line: u32,
    pub used: bool,
}

#[derive(Debug, Default)]
struct ScopeRecord {
    bindings: FxHashMap<String, Binding>,
    parent: Option<ScopeId>,
}

/// All scopes created during analysis.
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<ScopeRecord>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    pub fn push(&mut self, parent: Option<ScopeId>) -> ScopeId {
        self.scopes.push(ScopeRecord {
            bindings: FxHashMap::default(),
            parent,
        });
        self.scopes.len() - 1
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope].parent
    }

    pub fn declare(&mut self, scope: ScopeId, name: &str, kind: BindingKind, line: u32) {
        self.scopes[scope].bindings.insert(
            name.to_string(),
            Binding {
                kind,
                line,
                used: false,
            },
        );
    }

    /// Whether `name` is declared directly in `scope` (no parent walk).
    pub fn declared_here(&self, scope: ScopeId, name: &str) -> bool {
        self.scopes[scope].bindings.contains_key(name)
    }

    /// Resolve a name against the scope chain.
    pub fn lookup(&self, mut scope: ScopeId, name: &str) -> Option<&Binding> {
        loop {
            if let Some(binding) = self.scopes[scope].bindings.get(name) {
                return Some(binding);
            }
            scope = self.scopes[scope].parent?;
        }
    }

    /// Resolve a name, mark its binding used, and return the binding kind.
    pub fn mark_used(&mut self, scope: ScopeId, name: &str) -> Option<BindingKind> {
        let owner = self.find_owner(scope, name)?;
        let binding = self.scopes[owner]
            .bindings
            .get_mut(name)
            .expect("owner scope lost the binding");
        binding.used = true;
        Some(binding.kind)
    }

    fn find_owner(&self, mut scope: ScopeId, name: &str) -> Option<ScopeId> {
        loop {
            if self.scopes[scope].bindings.contains_key(name) {
                return Some(scope);
            }
            scope = self.scopes[scope].parent?;
        }
    }

    /// Every non-builtin name visible from `scope`, with its declaration
    /// line. Inner declarations shadow outer ones.
    pub fn visible_names(&self, scope: ScopeId) -> Vec<(String, u32)> {
        let mut seen = FxHashMap::default();
        let mut current = Some(scope);
        while let Some(id) = current {
            for (name, binding) in &self.scopes[id].bindings {
                if binding.kind != BindingKind::Builtin {
                    seen.entry(name.clone()).or_insert(binding.line);
                }
            }
            current = self.scopes[id].parent;
        }
        let mut names: Vec<(String, u32)> = seen.into_iter().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_parents() {
        let mut arena = ScopeArena::new();
        let root = arena.push(None);
        let child = arena.push(Some(root));
        arena.declare(root, "outer", BindingKind::Const, 1);
        arena.declare(child, "inner", BindingKind::Var, 2);
        assert!(arena.lookup(child, "outer").is_some());
        assert!(arena.lookup(child, "inner").is_some());
        assert!(arena.lookup(root, "inner").is_none());
    }

    #[test]
    fn shadowing_resolves_to_the_inner_binding() {
        let mut arena = ScopeArena::new();
        let root = arena.push(None);
        let child = arena.push(Some(root));
        arena.declare(root, "x", BindingKind::Var, 1);
        arena.declare(child, "x", BindingKind::Const, 5);
        assert_eq!(arena.lookup(child, "x").unwrap().line, 5);
    }

    #[test]
    fn visible_names_excludes_builtins() {
        let mut arena = ScopeArena::new();
        let root = arena.push(None);
        arena.declare(root, "console", BindingKind::Builtin, 0);
        arena.declare(root, "mine", BindingKind::Const, 3);
        assert_eq!(arena.visible_names(root), vec![("mine".to_string(), 3)]);
    }
}
