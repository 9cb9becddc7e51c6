//! Property-based tests for the forgekit toolkit

mod selection_machine;
