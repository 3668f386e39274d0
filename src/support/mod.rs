//! Small self-contained utilities with no dependency on the program model.

pub mod graph;
