//! End-to-end parser scenarios over literal byte inputs.

use abc::{AbcFile, Error, ParseOptions};

fn options() -> ParseOptions {
    ParseOptions::default()
}

#[test]
fn empty_header_then_truncated_pools_is_corrupt() {
    // version (46, 16), then the stream ends before the int pool's count.
    let bytes = [0x2e, 0x00, 0x10, 0x00];
    let err = AbcFile::from_bytes(&bytes, options()).unwrap_err();
    assert!(matches!(err, Error::AbcCorrupt));
}

#[test]
fn s1_header_version_fields_are_major_then_minor() {
    let mut bytes = vec![0x2e, 0x00, 0x10, 0x00];
    bytes.extend(std::iter::repeat(0x00).take(7));
    bytes.extend([0x00, 0x00, 0x00, 0x00, 0x00]); // method_info, metadata, class, script, body counts

    let file = AbcFile::from_bytes(&bytes, options()).unwrap();
    assert_eq!(file.major_version, 46);
    assert_eq!(file.minor_version, 16);
}

#[test]
fn s2_int_pool_resolves_signed_values() {
    let mut bytes = vec![0x2e, 0x00, 0x10, 0x00];
    bytes.push(0x03); // int count = 3
    bytes.push(0x01); // int[1] = 1
    bytes.extend([0xff, 0xff, 0xff, 0xff, 0x0f]); // int[2] = -1 (0xFFFFFFFF as i32)
    bytes.extend(std::iter::repeat(0x00).take(6)); // remaining constant pools, empty
    bytes.extend([0x00, 0x00, 0x00, 0x00, 0x00]); // method_info, metadata, class, script, body counts

    let file = AbcFile::from_bytes(&bytes, options()).unwrap();
    assert_eq!(*file.int(0).unwrap(), 0);
    assert_eq!(*file.int(1).unwrap(), 1);
    assert_eq!(*file.int(2).unwrap(), -1);
}

#[test]
fn s3_illegal_u30_in_a_pool_count() {
    let mut bytes = vec![0x2e, 0x00, 0x10, 0x00];
    bytes.extend([0xff, 0xff, 0xff, 0xff, 0x0f]); // int pool count, illegal U30
    let err = AbcFile::from_bytes(&bytes, options()).unwrap_err();
    assert!(matches!(err, Error::AbcIllegalU30 { value: 0xFFFFFFFF }));
}

#[test]
fn s4_multiname_pool_kinds_and_illegal_ns_set_index() {
    let mut bytes = vec![0x2e, 0x00, 0x10, 0x00];
    bytes.extend([0x00, 0x00, 0x00, 0x00, 0x00]); // int, uint, double, string, namespace pools empty
    bytes.push(0x01); // namespace_set pool: count = 1 (sentinel only)
    // multiname pool: count = 4 -> QName, RTQNameL, illegal Multiname
    bytes.push(0x04);
    bytes.extend([0x07, 0x00, 0x00]); // QName(ns=0, name=0)
    bytes.push(0x11); // RTQNameL, no operands
    bytes.extend([0x09, 0x00, 0x00]); // Multiname with ns-set index 0: illegal

    let err = AbcFile::from_bytes(&bytes, options()).unwrap_err();
    assert!(matches!(
        err,
        Error::AbcIllegalMultinamePoolIndex { index: 0 }
    ));
}

#[test]
fn s5_class_final_and_interface_conflict() {
    let mut bytes = vec![0x2e, 0x00, 0x10, 0x00];
    bytes.extend([0x00, 0x00, 0x00]); // int, uint, double empty
    bytes.extend([0x02, 0x01, 0x41]); // string pool: strings[1] = "A"
    bytes.extend([0x02, 0x08, 0x01]); // namespace pool: ordinary namespace naming "A"
    bytes.push(0x01); // namespace_set pool: sentinel only
    bytes.extend([0x02, 0x07, 0x01, 0x01]); // multiname pool: QName(ns=1, name=1)
    bytes.extend([0x00, 0x00]); // method_info, metadata counts
    bytes.push(0x01); // class count = 1
    bytes.push(0x01); // instance name = the QName above
    bytes.push(0x00); // super name = 0 (any)
    bytes.push(0x06); // ClassFinal | ClassInterface

    let err = AbcFile::from_bytes(&bytes, options()).unwrap_err();
    assert!(matches!(
        err,
        Error::AbcInvalidInstanceInfoFlags { flag_bits: 0x06, .. }
    ));
}

#[test]
fn s6_method_need_arguments_and_need_rest_conflict() {
    let mut bytes = vec![0x2e, 0x00, 0x10, 0x00];
    bytes.extend(std::iter::repeat(0x00).take(7)); // all 7 constant pools empty
    bytes.push(0x01); // method_info count = 1
    bytes.push(0x00); // param count = 0
    bytes.push(0x00); // return type = 0 (any)
    bytes.push(0x00); // name index = 0 (empty string)
    bytes.push(0x05); // NEED_ARGUMENTS | NEED_REST

    let err = AbcFile::from_bytes(&bytes, options()).unwrap_err();
    assert!(matches!(
        err,
        Error::MethodInfoInvalidFlags { flag_bits: 0x05, .. }
    ));
}

#[test]
fn lenient_utf8_mode_replaces_invalid_sequences_in_string_pool() {
    let mut bytes = vec![0x2e, 0x00, 0x10, 0x00];
    bytes.extend([0x00, 0x00]); // int, uint empty
    bytes.push(0x00); // double empty
    bytes.extend([0x02, 0x01, 0xff]); // string pool: strings[1] = invalid byte 0xFF
    bytes.extend(std::iter::repeat(0x00).take(3)); // namespace, namespace_set, multiname empty
    bytes.extend(std::iter::repeat(0x00).take(5)); // method_info, metadata, class, script, body counts

    let strict_err = AbcFile::from_bytes(&bytes, ParseOptions::default()).unwrap_err();
    assert!(matches!(strict_err, Error::AbcInvalidUtf8 { .. }));

    let file = AbcFile::from_bytes(&bytes, ParseOptions::LENIENT_UTF8).unwrap();
    assert_eq!(&**file.string(1).unwrap(), "\u{FFFD}");
}

#[test]
fn method_body_scope_depth_ordering_is_enforced() {
    let mut bytes = vec![0x2e, 0x00, 0x10, 0x00];
    bytes.extend(std::iter::repeat(0x00).take(7)); // constant pools empty
    bytes.extend([0x00, 0x00, 0x00, 0x00]); // method_info, metadata, class, script counts
    bytes.push(0x01); // method body count = 1
    bytes.push(0x00); // method_index = 0
    bytes.push(0x00); // max_stack = 0
    bytes.push(0x00); // local_count = 0
    bytes.push(0x02); // init_scope_depth = 2
    bytes.push(0x01); // max_scope_depth = 1 (invalid: init > max)

    let err = AbcFile::from_bytes(&bytes, options()).unwrap_err();
    assert!(matches!(
        err,
        Error::MethodBodyInvalidScopeDepths { init: 2, max: 1 }
    ));
}
