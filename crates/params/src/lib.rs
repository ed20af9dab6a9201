//! Constant values shared by the SLH-DSA ACVP harness crates.

#![no_std]

pub mod acvp;
pub mod slh_dsa;
