//! Variable bindings of the calculator.

use indexmap::IndexMap;
use smartstring::alias::String;

/// A simple symbol table mapping variable names to 64-bit integer values.
///
/// Variables keep their insertion order, so dumping the table lists them in
/// the order they were first assigned.
///
/// # Examples
/// ```rust
/// # use lalrex_calc::SymTab;
/// let mut symtab = SymTab::new();
/// symtab.set("x", 42);
/// assert_eq!(symtab.get("x"), 42);
/// assert_eq!(symtab.get("y"), 0); // undefined symbol returns 0
/// ```
#[derive(Debug, Default)]
pub struct SymTab {
    tab: IndexMap<String, i64>,
}

impl SymTab {
    /// Creates a new, empty symbol table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or updates the value of a variable.
    pub fn set(&mut self, name: impl AsRef<str>, value: i64) {
        self.tab.insert(String::from(name.as_ref()), value);
    }

    /// Retrieves the value of a variable, `0` if undefined.
    pub fn get(&self, name: impl AsRef<str>) -> i64 {
        *self.tab.get(name.as_ref()).unwrap_or(&0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_defaults() {
        let mut symtab = SymTab::new();
        assert_eq!(symtab.get("missing"), 0);
        symtab.set("counter", 100);
        assert_eq!(symtab.get("counter"), 100);
        symtab.set("counter", -1);
        assert_eq!(symtab.get("counter"), -1);
    }
}
