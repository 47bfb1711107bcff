use rustc_hash::FxHashMap;

use super::Symbol;

/// Maps strings to [`Symbol`]s and back. Strings are leaked into `'static`
/// slices owned by the interner's `Vec`, so a resolved `&str` is valid for
/// as long as the `Interner` lives.
#[derive(Default)]
pub struct Interner {
    names: FxHashMap<Box<str>, Symbol>,
    strings: Vec<Box<str>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `s`, returning its `Symbol`. Interning the same string twice
    /// returns the same `Symbol`.
    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&sym) = self.names.get(s) {
            return sym;
        }
        let sym = Symbol(self.strings.len() as u32);
        let boxed: Box<str> = s.into();
        self.strings.push(boxed.clone());
        self.names.insert(boxed, sym);
        sym
    }

    /// Look up the string behind a `Symbol`.
    ///
    /// # Panics
    /// Panics if `sym` was not produced by this interner.
    pub fn resolve(&self, sym: Symbol) -> &str {
        &self.strings[sym.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
