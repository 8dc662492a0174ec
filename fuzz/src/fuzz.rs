#![no_main]
use leapconv::convert::{convert, Mode, Record};
use leapconv::*;
use libfuzzer_sys::fuzz_target;

fn fuzz_convert(leaps: &LeapSecs, text: &str, mode: Mode) {
    for record in convert(leaps, text, mode) {
        if let Record::Converted(c) = record {
            assert!(c.unix_seconds >= 0);
            assert_eq!(c.unix_seconds * 1000, c.unix_millis);
            assert_eq!(Some(c.gps_seconds), leaps.unix_to_gps(c.unix_seconds));
        }
    }
}

fn fuzz_feed(text: &str) {
    let feed = match nist::read_str(text) {
        Ok(feed) => feed,
        Err(Error::Nom(_)) => return,
        Err(err) => panic!("\ninput {:?}\nerror {}\n", text, err),
    };
    let table = Table::default();
    match table.replace(feed.leap_epochs()) {
        Ok(count) => assert_eq!(count, table.current().len()),
        Err(Error::Empty) => assert_eq!(LeapSecs::builtin(), *table.current()),
        Err(err) => panic!("\ninput {:?}\nerror {}\n", text, err),
    }
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 1 {
        return;
    }
    let text = match std::str::from_utf8(&data[1..]) {
        Ok(text) => text,
        Err(_) => return,
    };
    let leaps = LeapSecs::builtin();
    match data[0] {
        0 => fuzz_convert(&leaps, text, Mode::Auto),
        1 => fuzz_convert(&leaps, text, Mode::Paragraph),
        2 => fuzz_convert(&leaps, text, Mode::Gps),
        3 => fuzz_feed(text),
        _ => (),
    }
});
