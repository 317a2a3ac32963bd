#![no_main]

use libfuzzer_sys::fuzz_target;
use streamstats::history::parse_records;
use streamstats::model::DisplayLimits;
use streamstats::range::dataset_range;
use streamstats::report::write_report;
use streamstats::stats::{Rankings, aggregate};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(records) = parse_records(raw) else {
        return;
    };
    let Ok(range) = dataset_range(&records) else {
        return;
    };

    let aggregation = aggregate(&records, &range.full_window());
    let rankings = Rankings::from_aggregation(&aggregation);
    assert!(
        rankings
            .songs
            .windows(2)
            .all(|pair| pair[0].played_ms >= pair[1].played_ms)
    );
    let _ = write_report(&mut std::io::sink(), &rankings, DisplayLimits::default());
});
