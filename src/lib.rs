//! vundo - a branching, persistent undo tree for a modal text editor.

pub mod collab;
pub mod commands;
pub mod error;
pub mod undo;
