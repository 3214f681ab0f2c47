//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one node, or the whole
//! rig, against the simulated peripherals.  All tests run on the host with
//! no real hardware required.

#![cfg(not(target_os = "espidf"))]

mod mock_hw;
mod rig_tests;
mod tms_tests;
mod wcs_tests;
