use crate::{Executor, Result};
use std::{borrow::Cow, future::Future};

/// A live session with the database.
pub trait Connection: Executor {
    /// Establish a connection to the given URL.
    fn connect(url: Cow<'static, str>) -> impl Future<Output = Result<Self>> + Send;

    /// Close the session gracefully. Dropping the connection also closes it.
    fn disconnect(self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}
