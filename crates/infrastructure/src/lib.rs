//! Meridian DNS Infrastructure Layer
pub mod dns;
