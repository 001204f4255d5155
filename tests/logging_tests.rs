use battleship_server::{init_logging, parse_level};
use log::LevelFilter;

#[test]
fn test_parse_level() {
    assert_eq!(parse_level(Some("debug")), LevelFilter::Debug);
    assert_eq!(parse_level(Some(" warn ")), LevelFilter::Warn);
    assert_eq!(parse_level(Some("OFF")), LevelFilter::Off);
    assert_eq!(parse_level(Some("loud")), LevelFilter::Info);
    assert_eq!(parse_level(None), LevelFilter::Info);
}

#[test]
fn test_init_twice_is_harmless() {
    init_logging();
    init_logging();
    log::info!("logger initialised");
}
