use rustc_hash::FxHashMap;

use reyna_util::Symbol;

use crate::types::Type;

/// A stack of name->type maps (§4.3). Simpler than a full rib/arena scope
/// tree since the checker never needs to resolve a name after the fact -
/// it only ever asks "what's in scope right now".
pub struct ScopeStack {
    scopes: Vec<FxHashMap<Symbol, Type>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self { scopes: vec![FxHashMap::default()] }
    }

    pub fn push(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    pub fn declare(&mut self, name: Symbol, ty: Type) {
        self.scopes.last_mut().expect("at least one scope").insert(name, ty);
    }

    pub fn lookup(&self, name: Symbol) -> Option<&Type> {
        self.scopes.iter().rev().find_map(|s| s.get(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reyna_util::Interner;

    #[test]
    fn inner_scope_shadows_outer() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let mut scopes = ScopeStack::new();
        scopes.declare(x, Type::Int64);
        scopes.push();
        scopes.declare(x, Type::Bool);
        assert_eq!(scopes.lookup(x), Some(&Type::Bool));
        scopes.pop();
        assert_eq!(scopes.lookup(x), Some(&Type::Int64));
    }
}
