//! Core of mcstools, post-processing of minimal cut sets and the constraint based modeling
//! utilities used to prepare models for their computation.

pub mod analysis;
pub mod configuration;
pub mod io;
pub mod mcs;
pub mod metabolic_model;
pub mod optimize;

#[cfg(test)]
pub(crate) mod test_utils;
