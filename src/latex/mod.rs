//! LaTeX support: signatures, default tables, the annotated-text builder, and
//! the babel-aware fragmentizer.

pub mod builder;
pub mod defaults;
pub mod fragmentizer;
pub mod matcher;
pub mod options;
pub mod signature;
