mod as_value;
mod connection;
mod cursor;
mod driver;
mod error;
mod executor;
mod finder;
mod identity;
mod instance;
mod mapper;
mod options;
mod property;
mod property_future;
mod query;
mod schema;
mod table_ref;
mod target;
mod util;
mod value;
mod value_type;
pub mod writer;

pub use ::anyhow::Context;
pub use as_value::*;
pub use connection::*;
pub use cursor::*;
pub use driver::*;
pub use error::*;
pub use executor::*;
pub use finder::*;
pub use identity::*;
pub use instance::*;
pub use mapper::*;
pub use options::*;
pub use property::*;
pub use property_future::*;
pub use query::*;
pub use schema::*;
pub use table_ref::*;
pub use target::*;
pub use util::*;
pub use value::*;
pub use value_type::*;
pub use writer::{GenericSqlWriter, SqlWriter};
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
