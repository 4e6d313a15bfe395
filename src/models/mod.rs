mod fund;
mod holding;
mod id;
mod id_generator;
mod quote;
mod staging;
mod transaction;

pub use fund::FundMetadata;
pub use holding::Holding;
pub use id::{Id, IdError};
pub use id_generator::{FixedIdGenerator, IdGenerator, UuidIdGenerator};
pub use quote::Quote;
pub use staging::{RawFundRow, RawTransactionRow, RawValue};
pub use transaction::{TradeSide, TradeSideError, Transaction};
