//! ntl_infer: Structural type inference for NTL.
//!
//! Types are structured values (see [`Type`]); the printed form is derived
//! for display and for union deduplication, never parsed back. Annotation
//! strings from the parser are normalized into [`Type`] once, on entry.
//!
//! In the default mode incompatibilities are warnings; strict mode escalates
//! declaration and plain `=` assignment mismatches to `TYPE_MISMATCH`
//! errors. The walk also carries the non-aborting lints (chained assignment,
//! division by literal zero, try without catch/finally, excessive parameter
//! count).

mod infer;
mod types;

pub use infer::{infer, Inferer};
pub use types::{Literal, Type};
