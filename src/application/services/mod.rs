//! Application services

pub mod navigation;

pub use navigation::{FileReport, NavDocument, NavigationService};
