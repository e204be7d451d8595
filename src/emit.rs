// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Rendering of a [`PassthroughConfig`] as a Xen domain configuration
//! fragment.

use std::fmt::{self, Display, Formatter};

use crate::extract::{IomemEntry, IrqGroup, PassthroughConfig};
use crate::passthrough::XEN_PASSTHROUGH;

const INDENT: &str = "    ";

fn write_paths(f: &mut Formatter<'_>, key: &str, paths: &[&str]) -> fmt::Result {
    writeln!(f, "{key} = [")?;
    for path in paths {
        writeln!(f, "{INDENT}\"{path}\",")?;
    }
    writeln!(f, "]")?;
    writeln!(f)
}

fn write_irqs(f: &mut Formatter<'_>, groups: &[IrqGroup]) -> fmt::Result {
    writeln!(f, "irqs = [")?;
    for group in groups {
        writeln!(f, "# {}", group.node)?;
        write!(f, "{INDENT}")?;
        for (i, irq) in group.irqs.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{irq},")?;
        }
        writeln!(f)?;
    }
    writeln!(f, "]")?;
    writeln!(f)
}

fn write_iomem(f: &mut Formatter<'_>, entries: &[IomemEntry]) -> fmt::Result {
    writeln!(f, "iomem = [")?;
    for entry in entries {
        for name in &entry.names {
            writeln!(f, "#{name}")?;
        }
        writeln!(
            f,
            "{INDENT}\"{:05x},{:x}\",",
            entry.base_page, entry.page_count
        )?;
    }
    writeln!(f, "]")?;
    writeln!(f)
}

impl Display for PassthroughConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "dt_compatible = [ ")?;
        for (i, compatible) in self.compatible.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "\"{compatible}\"")?;
        }
        if !self.compatible.is_empty() {
            write!(f, " ")?;
        }
        writeln!(f, "]")?;
        writeln!(f)?;

        let passthrough: Vec<&str> = self
            .passthrough_nodes
            .iter()
            .map(|node| node.path.as_str())
            .collect();
        write_paths(f, "dt_passthrough_nodes", &passthrough)?;
        let dtdev: Vec<&str> = self.dtdev.iter().map(String::as_str).collect();
        write_paths(f, "dtdev", &dtdev)?;
        write_irqs(f, &self.irqs)?;
        write_iomem(f, &self.iomem)?;

        for node in self.passthrough_nodes.iter().filter(|node| node.top_level) {
            writeln!(f, "&{} {{ {XEN_PASSTHROUGH}; }};", node.name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passthrough::PassthroughNode;

    #[test]
    fn empty_config() {
        let expected = "\
dt_compatible = [ ]

dt_passthrough_nodes = [
]

dtdev = [
]

irqs = [
]

iomem = [
]

";
        assert_eq!(PassthroughConfig::default().to_string(), expected);
    }

    #[test]
    fn full_config() {
        let config = PassthroughConfig {
            compatible: vec!["vendor,board".to_owned(), "vendor,soc".to_owned()],
            passthrough_nodes: vec![
                PassthroughNode {
                    path: "/soc/gpu@1000".to_owned(),
                    name: "gpu@1000".to_owned(),
                    top_level: true,
                },
                PassthroughNode {
                    path: "/soc/gpu@1000/mmu".to_owned(),
                    name: "mmu".to_owned(),
                    top_level: false,
                },
            ],
            dtdev: vec!["/soc/gpu@1000".to_owned()],
            irqs: vec![IrqGroup {
                node: "gpu@1000".to_owned(),
                irqs: vec![72, 73],
            }],
            iomem: vec![
                IomemEntry {
                    base_page: 1,
                    page_count: 2,
                    names: vec!["uart0".to_owned()],
                },
                IomemEntry {
                    base_page: 0x1_2345,
                    page_count: 0x1a,
                    names: vec!["a".to_owned(), "b".to_owned()],
                },
            ],
        };
        let expected = "\
dt_compatible = [ \"vendor,board\", \"vendor,soc\" ]

dt_passthrough_nodes = [
    \"/soc/gpu@1000\",
    \"/soc/gpu@1000/mmu\",
]

dtdev = [
    \"/soc/gpu@1000\",
]

irqs = [
# gpu@1000
    72, 73,
]

iomem = [
#uart0
    \"00001,2\",
#a
#b
    \"12345,1a\",
]

&gpu@1000 { xen,passthrough; };
";
        assert_eq!(config.to_string(), expected);
    }
}
