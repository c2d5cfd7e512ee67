use crate::{AsValue, Result};
use std::fmt::Display;

/// A parameterized, backend-prepared query handle.
///
/// Drivers pre-parse the statement and later bind positional parameters.
/// Values are converted via the `AsValue` trait.
///
/// # Binding Semantics
/// * `bind` appends a value (driver chooses actual placeholder numbering).
/// * `bind_index` sets the parameter at `index` (from 0).
///
/// Methods return `&mut Self` for fluent chaining:
/// ```rust,ignore
/// prepared.bind(player)?.bind("First Join")?;
/// ```
pub trait Prepared: Send + Sync + Display {
    /// Append a parameter value.
    fn bind(&mut self, value: impl AsValue) -> Result<&mut Self>;
    /// Bind a value at a specific index.
    fn bind_index(&mut self, value: impl AsValue, index: u64) -> Result<&mut Self>;
}
