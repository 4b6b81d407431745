//! Presentation shaping shared by the synthesizers

use crate::item::OverviewItem;

const SIZE_UNITS: [(u64, &str); 3] = [(1 << 30, "GB"), (1 << 20, "MB"), (1 << 10, "kB")];

/// Human-readable size using the largest unit that divides it exactly
pub fn size_string(size: u64) -> String {
    for (unit, name) in SIZE_UNITS {
        if size >= unit && size % unit == 0 {
            return format!("{} {}", size / unit, name);
        }
    }
    format!("{} B", size)
}

pub fn hex(value: u64) -> String {
    format!("0x{:x}", value)
}

/// Upper-case the first letter of a cell name
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Collapse a domain with exactly one grouping child.
///
/// The child takes the domain's name and icon and shows its own name as the
/// description. Any other domain is returned unchanged.
pub fn flatten_single(mut domain: OverviewItem) -> OverviewItem {
    if domain.children().len() != 1 {
        return domain;
    }
    let Some(mut child) = domain.take_children().pop() else {
        return domain;
    };
    child.description = Some(std::mem::take(&mut child.name));
    child.name = domain.name;
    child.icon = domain.icon;
    child
}

/// A domain without children is omitted entirely
pub fn non_empty(domain: OverviewItem) -> Option<OverviewItem> {
    domain.has_children().then_some(domain)
}

/// Flatten, then omit when empty
pub fn flattened(domain: OverviewItem) -> Option<OverviewItem> {
    non_empty(domain).map(flatten_single)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_string() {
        assert_eq!(size_string(0x10000), "64 kB");
        assert_eq!(size_string(0xd0000), "832 kB");
        assert_eq!(size_string(0x100000), "1 MB");
        assert_eq!(size_string(0x4000_0000), "1 GB");
        assert_eq!(size_string(0x1234), "4660 B");
        assert_eq!(size_string(0), "0 B");
        assert_eq!(size_string(0x180000), "1536 kB");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("priority"), "Priority");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_flatten_single_child() {
        let mut domain = OverviewItem::new("Interrupts").with_icon("interrupts");
        let mut controller = OverviewItem::new("&nvic");
        controller.add_child(OverviewItem::new("&uart0"));
        domain.add_child(controller);

        let flat = flatten_single(domain);
        assert_eq!(flat.name, "Interrupts");
        assert_eq!(flat.description.as_deref(), Some("&nvic"));
        assert_eq!(flat.icon.as_deref(), Some("interrupts"));
        assert_eq!(flat.children().len(), 1);
    }

    #[test]
    fn test_flatten_keeps_multiple_children() {
        let mut domain = OverviewItem::new("Clocks");
        domain.add_child(OverviewItem::new("&clk0"));
        domain.add_child(OverviewItem::new("&clk1"));

        let shaped = flattened(domain).unwrap();
        assert_eq!(shaped.name, "Clocks");
        assert_eq!(shaped.children().len(), 2);
    }

    #[test]
    fn test_empty_domain_is_omitted() {
        assert!(flattened(OverviewItem::new("ADCs")).is_none());
        assert!(non_empty(OverviewItem::new("GPIO")).is_none());
    }
}
