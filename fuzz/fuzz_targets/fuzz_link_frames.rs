//! Fuzz target: serial line framing and command parsing
//!
//! Drives arbitrary byte sequences through `LineFramer` and every line it
//! yields through `parse_frame` + `Command::apply`, asserting that nothing
//! panics and accepted commands stay within range.
//!
//! cargo fuzz run fuzz_link_frames

#![no_main]

use libfuzzer_sys::fuzz_target;
use tankflow::config::LINE_MAX_LEN;
use tankflow::context::WcsContext;
use tankflow::protocol::{Command, LineFramer, parse_frame};

fuzz_target!(|data: &[u8]| {
    let mut framer = LineFramer::new();
    let mut ctx = WcsContext::new();

    framer.feed(data, |line| {
        assert!(!line.is_empty() && line.len() < LINE_MAX_LEN);
        if let Ok(cmd) = parse_frame(&line) {
            if let Command::SetValve(percent) = cmd {
                assert!(percent <= 100, "accepted out-of-range valve command");
            }
            cmd.apply(&mut ctx, 0);
        }
    });

    // After a reset the framer must accept bytes cleanly again.
    framer.reset();
    framer.feed(data, |_| {});
});
