//! Domain layer
//!
//! Users, groups and expenses, plus the ports the services depend on.
//! - `entities`: expense records, split maps and settlement output
//! - `ports`: repository and image store traits implemented by adapters

pub mod entities;
pub mod ports;
