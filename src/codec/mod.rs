//! Dynamic value codec.
//!
//! # Data Flow
//! ```text
//! Inbound wire JSON value
//!     → convert.rs (decode: total, every JSON shape has a DynamicValue)
//!     → DynamicValue handed to handler code
//!
//! Handler-built DynamicValue
//!     → convert.rs (encode: fails on values JSON cannot carry)
//!     → wire JSON value
//! ```
//!
//! # Design Decisions
//! - `DynamicValue` is a closed union; no other runtime type reaches handlers
//! - All numbers are IEEE-754 doubles, as on the wire
//! - Map conversion is atomic: the first failing key aborts the whole map

pub mod convert;
pub mod value;

pub use convert::{decode, decode_map, encode, encode_map, CodecError, WireMap, WireValue};
pub use value::{DynamicValue, Parameters};
