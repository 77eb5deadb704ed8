//! Language server for the FSM state-machine DSL.
//!
//! Services are wired through [`inject`]: the runtime module supplies the
//! language services, the IDE module overrides and extends them, and
//! [`setup::create_injector`] merges the two and builds the injector.

pub mod backend;
pub mod capabilities;
pub mod check;
pub mod diagnostics;
pub mod formatting;
pub mod generate;
pub mod ide;
pub mod inject;
pub mod language;
pub mod line_index;
pub mod navigation;
pub mod setup;
