//! Procedural map generation: a batch utility that turns validated
//! [`GenerationParams`] into a populated road graph and building set, ready
//! to hand to `dt-world::World::new`.
//!
//! | module      | responsibility                                          |
//! |-------------|----------------------------------------------------------|
//! | `params`    | `GenerationParams` + its validate-on-build builder        |
//! | `generate`  | the hierarchical center/backbone/rural generation pass    |
//! | `error`     | `GeneratorError`, the validation failure type              |

mod error;
mod generate;
mod params;


pub use error::{GeneratorError, GeneratorResult};
pub use generate::{generate, GeneratedMap};
pub use params::{GenerationParams, GenerationParamsBuilder};
