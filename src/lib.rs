//! Core library for the catalog-tools command line application.
//!
//! The library reads catalog, script, and calculated-field CSV exports and
//! renders them into a cross-linked Excel workbook. Responsibilities are kept
//! narrow: CSV and Excel adapters live under [`catalog::io`], typed records in
//! [`catalog::model`], sheet naming in [`catalog::naming`], the pure workbook
//! layout in [`catalog::layout`], and the end-to-end run in [`catalog::export`].

pub mod catalog;

pub use catalog::{CatalogError, Result, config, error, export, io, layout, model, naming};
