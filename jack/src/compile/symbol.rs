use smol_str::SmolStr;
use std::collections::BTreeMap;

use super::ir::Segment;
use crate::error::{JackError, JackResult};

/// Declaration category of an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SymbolKind {
    /// Shared by all instances of the class.
    Static,
    /// Per instance, addressed through `this`.
    Field,
    /// Subroutine parameter.
    Argument,
    /// Subroutine `var` declaration.
    Local,
}

impl SymbolKind {
    /// VM segment where variables of this kind live.
    #[inline]
    pub fn segment(self) -> Segment {
        match self {
            SymbolKind::Static => Segment::Static,
            SymbolKind::Field => Segment::This,
            SymbolKind::Argument => Segment::Argument,
            SymbolKind::Local => Segment::Local,
        }
    }

    /// Class level symbols outlive every subroutine in the class.
    #[inline]
    fn is_class_level(self) -> bool {
        matches!(self, SymbolKind::Static | SymbolKind::Field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: SmolStr,
    /// Declared type, either a primitive or a class name.
    pub ty: SmolStr,
    pub kind: SymbolKind,
    /// Running index within the symbol's kind.
    pub index: u16,
}

#[derive(Debug, Default)]
struct Scope {
    symbols: BTreeMap<SmolStr, Symbol>,
    counts: BTreeMap<SymbolKind, u16>,
}

impl Scope {
    fn define(&mut self, name: &str, ty: &str, kind: SymbolKind) -> JackResult<u16> {
        let count = self.counts.entry(kind).or_insert(0);
        let index = *count;
        *count = index.checked_add(1).ok_or(JackError::Limit("variables"))?;

        // A redefinition still uses up an index, but
        // lookups keep resolving to the first definition.
        self.symbols.entry(SmolStr::from(name)).or_insert_with(|| Symbol {
            name: SmolStr::from(name),
            ty: SmolStr::from(ty),
            kind,
            index,
        });

        Ok(index)
    }

    #[inline]
    fn count(&self, kind: SymbolKind) -> u16 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    #[inline]
    fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    fn clear(&mut self) {
        self.symbols.clear();
        self.counts.clear();
    }
}

/// Two level symbol table for one class.
///
/// Statics and fields are kept in the class scope for the lifetime
/// of the table. Arguments and locals are kept in the subroutine
/// scope, which is emptied by [`SymbolTable::start_subroutine`].
/// Lookups search the subroutine scope first, so its names
/// shadow those of the class.
#[derive(Debug, Default)]
pub struct SymbolTable {
    class: Scope,
    subroutine: Scope,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty the subroutine scope and restart the
    /// argument and local indices at zero.
    pub fn start_subroutine(&mut self) {
        self.subroutine.clear();
    }

    /// Define a new symbol and return its assigned index.
    ///
    /// Fails when the kind has run out of 16-bit indices.
    pub fn define(&mut self, name: &str, ty: &str, kind: SymbolKind) -> JackResult<u16> {
        self.scope_mut(kind).define(name, ty, kind)
    }

    /// Number of symbols of the given kind defined in the current scope.
    pub fn var_count(&self, kind: SymbolKind) -> u16 {
        if kind.is_class_level() {
            self.class.count(kind)
        } else {
            self.subroutine.count(kind)
        }
    }

    /// Lookup the given symbol name according to the scope rules.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.subroutine.get(name).or_else(|| self.class.get(name))
    }

    #[inline]
    pub fn kind_of(&self, name: &str) -> Option<SymbolKind> {
        self.lookup(name).map(|symbol| symbol.kind)
    }

    #[inline]
    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.lookup(name).map(|symbol| symbol.ty.as_str())
    }

    #[inline]
    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.lookup(name).map(|symbol| symbol.index)
    }

    fn scope_mut(&mut self, kind: SymbolKind) -> &mut Scope {
        if kind.is_class_level() {
            &mut self.class
        } else {
            &mut self.subroutine
        }
    }
}
