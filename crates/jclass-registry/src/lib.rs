//! The cross-class registry a batch decompilation run uses to answer two
//! questions the bytecode itself can't: "is this anonymous class's body
//! available to inline?" (§4.8) and "what are this method's overloads,
//! for cast-removal ranking?" (§9).

mod registry;

pub use registry::{ClassRegistry, RegistrationError};
