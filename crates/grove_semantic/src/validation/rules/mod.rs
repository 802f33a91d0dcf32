pub(crate) mod arguments;
pub(crate) mod directives;
pub(crate) mod fields;
pub(crate) mod fragments;
pub(crate) mod operations;
pub(crate) mod variables;
