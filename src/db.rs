//! SQL side of the bridge: entities shared with the REST sink, drivers and schema migrations.

pub mod driver;
pub mod entity;
pub mod migrations;

pub mod prelude {
    pub use super::entity::*;
}
