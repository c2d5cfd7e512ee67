mod as_value;
mod config;
mod connection;
mod counter;
mod driver;
mod error;
mod executor;
mod manager;
mod operation;
mod pool;
mod prepared;
mod query;
mod schema;
mod stripes;
mod util;
mod value;
mod writer;

pub use ::anyhow::Context;
pub use as_value::*;
pub use config::*;
pub use connection::*;
pub use counter::*;
pub use driver::*;
pub use error::*;
pub use executor::*;
pub use manager::*;
pub use operation::*;
pub use pool::*;
pub use prepared::*;
pub use query::*;
pub use schema::*;
pub use stripes::*;
pub use util::*;
pub use value::*;
pub use writer::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T, E = Error> = std::result::Result<T, E>;
pub type Error = anyhow::Error;
