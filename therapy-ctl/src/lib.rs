//! # therapy-ctl: canvas remote control
//!
//! Issues single canvas commands, prints the event stream, and runs the
//! interactive drawing tools against a running Therapy instance.

pub mod commands;
pub mod config;
