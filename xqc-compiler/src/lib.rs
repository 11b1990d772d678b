//! Turns parsed xqc trees into executable programs.
//!
//! The passes run in order: [`simplify`] rewrites what can be decided
//! without types, [`TypeChecker`] infers static information and raises type
//! errors, [`Optimizer`] rewrites the checked tree, and [`assign_modes`]
//! picks how bound values are evaluated.
mod compile;
mod error;
mod filter;
mod optimize;
mod promotion;
mod simplify;
mod strategy;
mod typecheck;

pub use compile::{compile, compile_expr, compile_pattern, compile_program, compile_value_template};
pub use optimize::Optimizer;
pub use simplify::simplify;
pub use strategy::assign_modes;
pub use typecheck::TypeChecker;
