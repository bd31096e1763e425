use weave_types::{discovery_port, ident_port, DEFAULT_BASE_PORT};

#[test]
fn default_ports_match_spec_offsets() {
    assert_eq!(discovery_port(DEFAULT_BASE_PORT), 13345);
    assert_eq!(ident_port(DEFAULT_BASE_PORT), 14345);
}

#[test]
fn ports_track_a_custom_base() {
    let base = 20000;
    assert_eq!(discovery_port(base), 21000);
    assert_eq!(ident_port(base), 22000);
}
