//! Pathology domain module.
//!
//! - `model`: profile types (`PathologyProfile`, `SymptomFact`)
//! - `catalog`: the read-only lookup (`PathologyCatalog`)
//! - `builtin`: the eight dental profiles shipped with the simulator

mod builtin;
mod catalog;
mod model;

pub use builtin::builtin_profiles;
pub use catalog::PathologyCatalog;
pub use model::{PathologyProfile, SymptomFact};
