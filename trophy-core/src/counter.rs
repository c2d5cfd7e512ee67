use crate::{
    ACHIEVEMENTS_TABLE, DATE_COLUMN, DatabaseError, PLAYER_COLUMN, is_identifier_safe,
};
use std::{
    borrow::Cow,
    fmt::{self, Display},
};

/// A named per-player progress counter.
///
/// The name is both the table name (after the prefix) and the value column,
/// so it is restricted to ASCII letters, digits and underscore.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Counter(Cow<'static, str>);

impl Counter {
    /// Number of times a player joined the server.
    pub const CONNECTIONS: Counter = Counter(Cow::Borrowed("connections"));

    pub const MAX_NAME_LEN: usize = 64;

    /// Names taken by the achievements table and the shared columns.
    const RESERVED: [&'static str; 3] = [ACHIEVEMENTS_TABLE, PLAYER_COLUMN, DATE_COLUMN];

    pub fn new(name: impl Into<Cow<'static, str>>) -> Result<Self, DatabaseError> {
        let name = name.into();
        if name.is_empty() || name.len() > Self::MAX_NAME_LEN || !is_identifier_safe(&name) {
            return Err(DatabaseError::configuration(format!(
                "`{name}` is not a valid counter name, expected 1 to {} ASCII letters, digits or underscores",
                Self::MAX_NAME_LEN
            )));
        }
        if Self::RESERVED
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(&name))
        {
            return Err(DatabaseError::configuration(format!(
                "`{name}` is a reserved name and cannot be used for a counter"
            )));
        }
        Ok(Self(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
