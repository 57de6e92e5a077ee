//! Techno-economic models of electricity storage technologies.
//!
//! A storage technology is described by its design (charging and discharging power and
//! duration, round-trip efficiency), its costs and the prices of the energy it consumes. From
//! these, the crate derives the technology's cycling behaviour, investment cost and levelised
//! cost of storage (LCOS). Technologies are either specified entirely by the user
//! ([`technology::generic`]) or backed by reference data ([`technology::data_driven`]).
#![warn(missing_docs)]
use anyhow::{Context, Result};
use std::path::PathBuf;

pub mod analysis;
pub mod cli;
pub mod costs;
pub mod currency;
pub mod error;
pub mod id;
pub mod input;
pub mod interpolation;
pub mod log;
pub mod output;
pub mod quantity;
pub mod reference;
pub mod scene;
pub mod settings;
pub mod technology;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the directory in which the program settings and saved scene are stored
pub fn get_lcos_config_dir() -> Result<PathBuf> {
    let mut config_dir = dirs::config_dir().context("Configuration directory could not be found")?;
    config_dir.push("lcos");

    Ok(config_dir)
}
