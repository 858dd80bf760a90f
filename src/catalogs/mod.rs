//! Raw catalog readers. Only tabular Gaia-style CSV exports are supported.

pub mod gaia;
