#![warn(clippy::all)]
#![doc = include_str!("../README.md")]

// Modules that make up the CSV uploader library.
mod args;
mod catalog;
mod dataset;
mod error;
mod file_dialog;
mod headless;
mod layout;
mod preview;
mod session;
mod traits;
mod upload;

// Publicly expose the contents of these modules.
pub use self::{
    args::Arguments, catalog::*, dataset::*, error::*, file_dialog::*, headless::*, layout::*,
    preview::*, session::*, traits::*, upload::*,
};
