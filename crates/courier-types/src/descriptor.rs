//! Static description of a message type.
//!
//! A `TypeDescriptor` splits the compiler-reported type path into the pieces
//! identity resolution needs: the bare `name`, the `full_name` and the
//! `module` it lives in.

use std::fmt;

/// Name parts of a Rust type, derived from [`std::any::type_name`].
///
/// For `my_app::orders::Wrapper<my_app::orders::Item>`:
/// - `full_name` is the whole path, generic arguments included
/// - `name` is `Wrapper`
/// - `module` is `my_app::orders`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    pub name: &'static str,
    pub full_name: &'static str,
    pub module: &'static str,
}

impl TypeDescriptor {
    /// Describe `T`.
    pub fn of<T: ?Sized>() -> Self {
        Self::from_type_name(std::any::type_name::<T>())
    }

    /// Split an already-rendered type path.
    pub fn from_type_name(full_name: &'static str) -> Self {
        // Generic arguments carry their own paths; split only the base.
        let base = full_name.split('<').next().unwrap_or(full_name);
        let name = base.rsplit("::").next().unwrap_or(base);
        let module = base[..base.len() - name.len()].trim_end_matches("::");
        Self {
            name,
            full_name,
            module,
        }
    }

    /// Whether this type lives in one of `modules` (or a child of one).
    ///
    /// An empty module list admits every type.
    pub fn in_modules(&self, modules: &[String]) -> bool {
        if modules.is_empty() {
            return true;
        }
        modules.iter().any(|m| {
            self.module == m.as_str()
                || self
                    .module
                    .strip_prefix(m.as_str())
                    .is_some_and(|rest| rest.starts_with("::"))
        })
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name)
    }
}
