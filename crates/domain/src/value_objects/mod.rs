//! Value Objects - Immutable, identity-less domain primitives

mod contact_email;
mod database;
mod operation;
mod param_value;

pub use contact_email::ContactEmail;
pub use database::Database;
pub use operation::{Operation, ResponseMode};
pub use param_value::ParamValue;
