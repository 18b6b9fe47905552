/*
 * This module provides the application logic layer, centered around
 * `EditorSession`, the explicit session object that UI front ends drive: it owns
 * the open store, the profile model, the icon cache and the current selection.
 * Unit tests for `EditorSession` are in `handler_tests.rs`.
 */
pub mod handler;

#[cfg(test)]
mod handler_tests;

pub use handler::{APP_NAME, EditorSession};
