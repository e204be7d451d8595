// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fs;
use std::path::PathBuf;

use dtpass::passthrough::XEN_PASSTHROUGH;
use dtpass::{Action, Error, Filters, Output, apply, run};
use dtpass_device_tree::MemoryReservation;
use dtpass_device_tree::model::{DeviceTree, DeviceTreeNode, DeviceTreeProperty};

fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Trace)
        .try_init();
}

/// A scratch directory unique to one test.
fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("dtpass-{}-{test}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn config(tree: DeviceTree, filters: &Filters) -> String {
    match apply(Action::Config, filters, tree) {
        Some(Output::Config(text)) => text,
        other => panic!("unexpected output: {other:?}"),
    }
}

fn board() -> DeviceTree {
    let mut tree = DeviceTree::new(
        DeviceTreeNode::builder("")
            .property(DeviceTreeProperty::strings(
                "compatible",
                ["vendor,board", "vendor,soc"],
            ))
            .property(DeviceTreeProperty::words("#address-cells", [2]))
            .property(DeviceTreeProperty::words("#size-cells", [2]))
            .child(
                DeviceTreeNode::builder("soc")
                    .property(DeviceTreeProperty::empty("ranges"))
                    .child(
                        DeviceTreeNode::builder("gpu@1000")
                            .property(DeviceTreeProperty::strings("compatible", ["vendor,gpu"]))
                            .property(DeviceTreeProperty::words("reg", [0, 0x1000, 0, 0x1800]))
                            .property(DeviceTreeProperty::words("interrupts", [0, 40, 4, 0, 41, 4]))
                            .property(DeviceTreeProperty::words("iommus", [1, 0]))
                            .build(),
                    )
                    .child(
                        DeviceTreeNode::builder("uart0")
                            .property(DeviceTreeProperty::words("reg", [0, 0x9000, 0, 0x1000]))
                            .property(DeviceTreeProperty::words("interrupts", [0, 41, 4, 0, 42, 4]))
                            .build(),
                    )
                    .child(
                        DeviceTreeNode::builder("secure@2000")
                            .property(DeviceTreeProperty::words("reg", [0, 0x2000, 0, 0x1000]))
                            .property(DeviceTreeProperty::words("iommus", [1, 1]))
                            .build(),
                    )
                    .build(),
            )
            .child(
                DeviceTreeNode::builder("chosen")
                    .property(DeviceTreeProperty::strings("bootargs", ["console=hvc0"]))
                    .build(),
            )
            .build(),
    );
    tree.memory_reservations
        .push(MemoryReservation::new(0x4000_0000, 0x10_0000));
    tree
}

#[test]
fn disabled_node_is_excluded_from_config() {
    init_logger();
    let tree = DeviceTree::new(
        DeviceTreeNode::builder("")
            .child(
                DeviceTreeNode::builder("A")
                    .property(DeviceTreeProperty::strings("status", ["disabled"]))
                    .property(DeviceTreeProperty::words("iommus", [1]))
                    .build(),
            )
            .child(
                DeviceTreeNode::builder("B")
                    .property(DeviceTreeProperty::words("interrupts", [0, 40, 0]))
                    .build(),
            )
            .build(),
    );
    let text = config(tree, &Filters::default());
    assert!(text.contains("dtdev = [\n]\n"));
    assert!(text.contains("irqs = [\n# B\n    72,\n]\n"));
}

#[test]
fn uart_reg_becomes_two_pages() {
    init_logger();
    let tree = DeviceTree::new(
        DeviceTreeNode::builder("")
            .child(
                DeviceTreeNode::builder("uart0")
                    .property(DeviceTreeProperty::words("reg", [0, 0x1000, 0, 0x1800]))
                    .build(),
            )
            .build(),
    );
    let text = config(tree, &Filters::default());
    assert!(text.contains("iomem = [\n#uart0\n    \"00001,2\",\n]\n"));
}

#[test]
fn full_config() {
    init_logger();
    let filters = Filters {
        black_list: dtpass::pattern::PatternList::parse(
            "/soc/secure",
            std::path::Path::new("black.list"),
        )
        .unwrap(),
        ..Filters::default()
    };
    let expected = "\
dt_compatible = [ \"vendor,board\", \"vendor,soc\" ]

dt_passthrough_nodes = [
    \"/soc/gpu@1000\",
    \"/soc/uart0\",
]

dtdev = [
    \"/soc/gpu@1000\",
]

irqs = [
# gpu@1000
    72, 73,
# uart0
    74,
]

iomem = [
#gpu@1000
    \"00001,2\",
#uart0
    \"00009,1\",
]

&gpu@1000 { xen,passthrough; };
&uart0 { xen,passthrough; };
";
    assert_eq!(config(board(), &filters), expected);
}

#[test]
fn passthrough_adds_only_markers() {
    init_logger();
    let source = board();
    let Some(Output::Dtb(dtb)) = apply(Action::Passthrough, &Filters::default(), source.clone())
    else {
        panic!("expected a blob");
    };
    let mut annotated = DeviceTree::from_dtb(&dtb).unwrap();
    assert_eq!(annotated.memory_reservations, source.memory_reservations);

    for path in ["/soc/gpu@1000", "/soc/uart0", "/soc/secure@2000"] {
        let node = annotated.find_node_mut(path).unwrap();
        assert_eq!(node.property_index(XEN_PASSTHROUGH), Some(0), "{path}");
        node.remove_property(XEN_PASSTHROUGH);
    }
    assert_eq!(annotated.to_dtb(), source.to_dtb());
}

#[test]
fn passthrough_twice_is_stable() {
    init_logger();
    let Some(Output::Dtb(once)) = apply(Action::Passthrough, &Filters::default(), board()) else {
        panic!("expected a blob");
    };
    let tree = DeviceTree::from_dtb(&once).unwrap();
    let Some(Output::Dtb(twice)) = apply(Action::Passthrough, &Filters::default(), tree) else {
        panic!("expected a blob");
    };
    assert_eq!(once, twice);
}

#[test]
fn partial_with_empty_lists_is_identity() {
    init_logger();
    let source = board();
    let Some(Output::Dtb(dtb)) = apply(Action::PartialDtb, &Filters::default(), source.clone())
    else {
        panic!("expected a blob");
    };
    let partial = DeviceTree::from_dtb(&dtb).unwrap();
    assert_eq!(partial.root(), source.root());
    assert!(partial.memory_reservations.is_empty());
}

#[test]
fn run_reads_pattern_files_and_writes_output() {
    init_logger();
    let dir = scratch_dir("run");
    let src = dir.join("board.dtb");
    let out = dir.join("partial.dtb");
    let disable_list = dir.join("disable.list");
    let dtb_list = dir.join("dtb.list");
    fs::write(&src, board().to_dtb()).unwrap();
    fs::write(&disable_list, "/soc/uart0\n\n").unwrap();
    fs::write(&dtb_list, "/soc$\n/chosen\n").unwrap();

    let filters = Filters::load(None, Some(&disable_list), Some(&dtb_list)).unwrap();
    run(Action::PartialDtb, &filters, &src, &out).unwrap();

    let partial = DeviceTree::from_dtb(&fs::read(&out).unwrap()).unwrap();
    let uart = partial.find_node("/soc/uart0").unwrap();
    assert_eq!(uart.property("status").unwrap().first_string(), Some("disabled"));
    assert!(uart.has_property("reg"));
    assert!(partial.find_node("/soc/gpu@1000").is_none());
    assert!(partial.find_node("/chosen").unwrap().has_property("bootargs"));
    assert!(!partial.root().has_property("compatible"));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn empty_partial_tree_writes_nothing() {
    init_logger();
    let dir = scratch_dir("empty");
    let src = dir.join("board.dtb");
    let out = dir.join("partial.dtb");
    let dtb_list = dir.join("dtb.list");
    fs::write(&src, board().to_dtb()).unwrap();
    fs::write(&dtb_list, "/does-not-exist\n").unwrap();

    let filters = Filters::load(None, None, Some(&dtb_list)).unwrap();
    run(Action::PartialDtb, &filters, &src, &out).unwrap();
    assert!(!out.exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn corrupt_source_fails_before_writing() {
    init_logger();
    let dir = scratch_dir("corrupt");
    let src = dir.join("bad.dtb");
    let out = dir.join("out.cfg");
    fs::write(&src, b"not a device tree blob at all, just text").unwrap();

    let err = run(Action::Config, &Filters::default(), &src, &out).unwrap_err();
    assert!(matches!(err, Error::Decode { .. }), "{err}");
    assert!(!out.exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn invalid_pattern_file_is_reported() {
    init_logger();
    let dir = scratch_dir("pattern");
    let black_list = dir.join("black.list");
    fs::write(&black_list, "/ok\n/broken[\n").unwrap();

    let err = Filters::load(Some(&black_list), None, None).unwrap_err();
    let Error::Pattern { line, pattern, .. } = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(*line, 2);
    assert_eq!(pattern, "/broken[");

    fs::remove_dir_all(&dir).unwrap();
}
