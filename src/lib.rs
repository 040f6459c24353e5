//! hydrostate - model state restore core for a gridded land-surface
//! hydrology model
//!
//! Restores the per-cell simulation state (soil moisture and ice, snowpack,
//! soil thermal profile, canopy interception, optional lake) from a model
//! state file written by the counterpart writer, at a caller-supplied restart
//! configuration. Both the length-delimited binary encoding and the
//! line-delimited text encoding of the state file are supported behind one
//! codec abstraction; everything above the codec is encoding-agnostic.

pub mod codec;
pub mod config;
pub mod observability;
pub mod restore;
pub mod state;
