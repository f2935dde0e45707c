pub mod cell;
pub mod codec;
pub mod engine;
pub mod error;
pub mod grid;
pub mod input;
pub mod program;
pub mod stack;
pub mod trace;
pub mod vars;
