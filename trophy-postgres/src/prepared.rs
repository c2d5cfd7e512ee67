use std::fmt::{self, Display};
use tokio_postgres::Statement;
use trophy_core::{AsValue, Error, Prepared, Result, Value};

pub struct PostgresPrepared {
    pub(crate) statement: Statement,
    pub(crate) sql: String,
    pub(crate) params: Vec<Option<Value>>,
    pub(crate) index: u64,
}

impl PostgresPrepared {
    pub(crate) fn new(statement: Statement, sql: String) -> Self {
        let params = vec![None; statement.params().len()];
        Self {
            statement,
            sql,
            params,
            index: 0,
        }
    }

    /// The bound values, in placeholder order. Fails when one is missing.
    pub(crate) fn take_params(&mut self) -> Result<Vec<Value>> {
        if let Some(i) = self.params.iter().position(Option::is_none) {
            return Err(Error::msg(format!(
                "The parameter ${} of `{}` was not set",
                i + 1,
                self.sql
            )));
        }
        self.index = 0;
        Ok(self.params.iter_mut().filter_map(Option::take).collect())
    }
}

impl Prepared for PostgresPrepared {
    fn bind(&mut self, value: impl AsValue) -> Result<&mut Self> {
        self.bind_index(value, self.index)
    }

    fn bind_index(&mut self, value: impl AsValue, index: u64) -> Result<&mut Self> {
        let len = self.params.len();
        let Some(param) = self.params.get_mut(index as usize) else {
            return Err(Error::msg(format!(
                "Cannot bind the parameter {}, `{}` has {} parameters",
                index + 1,
                self.sql,
                len
            )));
        };
        *param = Some(value.as_value());
        self.index = index + 1;
        Ok(self)
    }
}

impl Display for PostgresPrepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
