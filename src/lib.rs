mod case;
mod determinant;
mod error;
mod jac;
mod lindex;
mod loadcase;
mod margin;
mod metric;
mod network;
mod newton;
mod pfopt;
mod powerflow;
mod radial;
mod registry;
mod sbus;
mod session;
mod sweep;
mod topology;
mod traits;
mod ybus;

pub mod debug;
pub mod plot;
pub mod report;

#[cfg(test)]
mod tests;

pub use case::*;
pub use determinant::*;
pub use error::*;
pub use jac::*;
pub use lindex::*;
pub use loadcase::*;
pub use margin::*;
pub use metric::*;
pub use network::*;
pub use newton::*;
pub use pfopt::*;
pub use powerflow::*;
pub use radial::*;
pub use registry::*;
pub use sbus::*;
pub use session::*;
pub use sweep::*;
pub use topology::*;
pub use traits::*;
pub use ybus::*;
