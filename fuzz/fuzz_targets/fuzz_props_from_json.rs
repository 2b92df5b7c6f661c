#![no_main]

use libfuzzer_sys::fuzz_target;
use sizereport_core::attrs::{RESERVED_KEYS, forwarded_attributes};
use sizereport_core::{Props, SizeReportConfig};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(props) = Props::from_json_str(text) else {
        return;
    };

    let forwarded = forwarded_attributes(&props);
    assert!(RESERVED_KEYS.iter().all(|key| !forwarded.contains_key(key)));
    assert!(forwarded.len() <= props.len());

    if let Ok(config) = SizeReportConfig::from_props(&props) {
        assert_eq!(config.passthrough, forwarded);
        let style = config.effective_style();
        assert_eq!(style.get("flex").and_then(|v| v.as_str()), Some("1 0 auto"));
    }
});
