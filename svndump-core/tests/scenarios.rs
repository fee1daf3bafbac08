//! Integration tests for the concrete scenarios and boundary cases in the
//! dump-file engine's testable-properties list.

use std::rc::Rc;

use svndump_core::transforms::{EolFix, EolRule, EolSelector};
use svndump_core::{DumpReader, DumpWriter, Node, NodeAction, NodeKind, PropertySet, Transformation, copy};

fn write_dump_with_rev1_node(path: &std::path::Path, node_path: &str, content: &[u8]) {
    let src = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(src.path(), content).unwrap();
    let mut w = DumpWriter::create_with_rev0(path, None, "2024-01-01T00:00:00.000000Z").unwrap();
    let mut p = PropertySet::new();
    p.set("svn:date", "2024-01-02T00:00:00.000000Z");
    p.set("svn:author", "alice");
    p.set("svn:log", "add a file");
    w.add_rev(p).unwrap();
    let mut node = Node::new(node_path, NodeAction::Add, Some(NodeKind::File)).unwrap();
    let text_path: Rc<std::path::Path> = Rc::from(src.path());
    node.set_text_from_range(text_path, 0, content.len() as u64, svndump_core::md5_hex(content)).unwrap();
    w.add_node(&node).unwrap();
    w.close().unwrap();
}

/// S1: copying a trivial single-revision dump preserves revision count, node
/// identity, and text bytes exactly, with MD5 matching the spec's reference
/// value for `hi\n`.
#[test]
fn s1_copy_trivially_preserves_bytes_and_md5() {
    let a = tempfile::NamedTempFile::new().unwrap();
    write_dump_with_rev1_node(a.path(), "a.txt", b"hi\n");

    let mut reader = DumpReader::open(a.path()).unwrap();
    reader.read_next_rev().unwrap();
    let b = tempfile::NamedTempFile::new().unwrap();
    let mut writer = DumpWriter::create_like(b.path(), &mut reader).unwrap();
    copy(&mut reader, &mut writer).unwrap();
    writer.close().unwrap();

    let mut out = DumpReader::open(b.path()).unwrap();
    out.read_next_rev().unwrap(); // rev0
    assert!(out.read_next_rev().unwrap());
    let rev = out.current().unwrap();
    assert_eq!(rev.number(), 1);
    assert_eq!(rev.node_count(), 1);
    let node = rev.node(0).unwrap();
    assert_eq!(node.path(), "a.txt");
    assert_eq!(node.action(), NodeAction::Add);
    assert_eq!(node.kind(), Some(NodeKind::File));
    let text = node.text().unwrap();
    assert_eq!(text.length, 3);
    assert_eq!(text.md5, "b1946ac92492d2347c6235b4d2611184");
    assert_eq!(text.read_all().unwrap(), b"hi\n");
    assert!(!out.read_next_rev().unwrap());
    assert!(out.is_eof());
}

/// S5: CRLF+CR normalization recomputes length/MD5, preserves other node
/// properties, and can stamp `svn:eol-style`.
#[test]
fn s5_eol_fix_normalizes_and_sets_native_style() {
    let src = tempfile::NamedTempFile::new().unwrap();
    let content = b"A\r\nB\rC\n";
    std::fs::write(src.path(), content).unwrap();

    let a = tempfile::NamedTempFile::new().unwrap();
    let mut w = DumpWriter::create_with_rev0(a.path(), None, "2024-01-01T00:00:00.000000Z").unwrap();
    let mut p = PropertySet::new();
    p.set("svn:date", "2024-01-02T00:00:00.000000Z");
    w.add_rev(p).unwrap();
    let mut node = Node::new("f.txt", NodeAction::Add, Some(NodeKind::File)).unwrap();
    node.set_property("custom:owner", "team").unwrap();
    let text_path: Rc<std::path::Path> = Rc::from(src.path());
    node.set_text_from_range(text_path, 0, content.len() as u64, svndump_core::md5_hex(content)).unwrap();
    w.add_node(&node).unwrap();
    w.close().unwrap();

    let mut reader = DumpReader::open(a.path()).unwrap();
    reader.read_next_rev().unwrap();
    reader.read_next_rev().unwrap();

    let mut fix = EolFix {
        selector: EolSelector::PathMatches(vec![regex::Regex::new(".*").unwrap()]),
        rules: vec![EolRule::CrlfToLf, EolRule::CrToLf],
        tmp_dir: std::env::temp_dir(),
        set_native_style: Some("native".to_string()),
    };
    fix.apply(&mut reader).unwrap();

    let rev = reader.current().unwrap();
    let node = rev.node(0).unwrap();
    let text = node.text().unwrap();
    assert_eq!(text.read_all().unwrap(), b"A\nB\nC\n");
    assert_eq!(text.md5, svndump_core::md5_hex(b"A\nB\nC\n"));
    assert_eq!(node.properties().unwrap().get_str("custom:owner"), Some("team"));
    assert_eq!(node.properties().unwrap().get_str("svn:eol-style"), Some("native"));
}

/// Boundary case 10: revision 0 carrying only `svn:date` reads and writes
/// losslessly (no nodes, no other properties).
#[test]
fn boundary_rev0_only_date_roundtrips() {
    let a = tempfile::NamedTempFile::new().unwrap();
    DumpWriter::create_with_rev0(a.path(), Some("abc-uuid"), "2024-01-01T00:00:00.000000Z")
        .unwrap()
        .close()
        .unwrap();

    let mut reader = DumpReader::open(a.path()).unwrap();
    assert_eq!(reader.uuid(), Some("abc-uuid"));
    assert!(reader.read_next_rev().unwrap());
    let rev = reader.current().unwrap();
    assert_eq!(rev.number(), 0);
    assert_eq!(rev.node_count(), 0);
    assert_eq!(rev.date(), "2024-01-01T00:00:00.000000Z");
    assert!(!reader.read_next_rev().unwrap());
}

/// Boundary case 11: a node with an explicit, zero-length property block is
/// parsed as an empty `PropertySet`, distinct from "no properties at all".
#[test]
fn boundary_empty_property_block_is_empty_set_not_absent() {
    let dump = b"SVN-fs-dump-format-version: 2\n\n\
Revision-number: 0\nProp-content-length: 10\nContent-length: 10\n\nPROPS-END\n\n\
Revision-number: 1\nProp-content-length: 10\nContent-length: 10\n\nPROPS-END\n\n\
Node-path: d\nNode-kind: dir\nNode-action: add\nProp-content-length: 10\nContent-length: 10\n\nPROPS-END\n\n\n";
    let f = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(f.path(), dump).unwrap();

    let mut reader = DumpReader::open(f.path()).unwrap();
    reader.read_next_rev().unwrap();
    reader.read_next_rev().unwrap();
    let rev = reader.current().unwrap();
    let node = rev.node(0).unwrap();
    assert!(node.properties().is_some());
    assert_eq!(node.properties().unwrap().len(), 0);
}

/// Property-order law 6: re-serializing an untouched revision preserves
/// property insertion order.
#[test]
fn property_order_law_survives_copy() {
    let a = tempfile::NamedTempFile::new().unwrap();
    let mut w = DumpWriter::create_with_rev0(a.path(), None, "2024-01-01T00:00:00.000000Z").unwrap();
    let mut p = PropertySet::new();
    p.set("svn:date", "2024-01-02T00:00:00.000000Z");
    p.set("zzz-custom", "1");
    p.set("svn:author", "alice");
    p.set("aaa-custom", "2");
    w.add_rev(p).unwrap();
    w.close().unwrap();

    let mut reader = DumpReader::open(a.path()).unwrap();
    reader.read_next_rev().unwrap();
    let b = tempfile::NamedTempFile::new().unwrap();
    let mut writer = DumpWriter::create_like(b.path(), &mut reader).unwrap();
    copy(&mut reader, &mut writer).unwrap();
    writer.close().unwrap();

    let mut out = DumpReader::open(b.path()).unwrap();
    out.read_next_rev().unwrap();
    let rev = out.current().unwrap();
    let keys: Vec<&str> = rev.properties().iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["svn:date", "zzz-custom", "svn:author", "aaa-custom"]);
}
