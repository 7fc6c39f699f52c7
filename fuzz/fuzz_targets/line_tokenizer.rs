#![no_main]

use libfuzzer_sys::fuzz_target;
use pathseq::sequence::SequenceTracker;
use pathseq::tokenizer::tokenize;

fuzz_target!(|data: &[u8]| {
    // Arbitrary log content must never panic the processing loop
    let content = String::from_utf8_lossy(data);
    let mut tracker = SequenceTracker::with_idle_horizon(16);
    for line in content.lines() {
        if let Some(token) = tokenize(line) {
            let _ = tracker.observe(token.client, token.path);
        }
    }
});
