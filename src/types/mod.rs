//! Core record and keyword types.
//!
//! These are the values every decoder emits. Keyword enums are closed sets;
//! [`Symbol`] wraps them so unrecognized text survives decoding.

mod keywords;
mod mac;
mod record;
mod symbol;

pub use keywords::{AppProtocol, IpProtocol, PortStatus, TcpFlag};
pub use mac::MacAddr;
pub use record::{Banner, Record, Status};
pub use symbol::Symbol;
