//! Hardware Signing
//!
//! Everything between a decoded transaction and the signed output:
//! 1. `classify` picks the signing mode from the body and the signing files
//! 2. `validate` enforces the mode's cardinality rules
//! 3. a [`DeviceSession`] produces signatures
//! 4. `assemble` verifies them and builds the output

pub mod descriptor;
pub mod device;
pub mod flow;
pub mod mode;
pub mod params;
pub mod path;
pub mod policy;
pub mod witness;

pub use descriptor::*;
pub use device::*;
pub use flow::*;
pub use mode::{classify, ClassificationError, SigningMode};
pub use params::*;
pub use path::{DerivationPath, PathError, HARDENED};
pub use policy::*;
pub use witness::*;
