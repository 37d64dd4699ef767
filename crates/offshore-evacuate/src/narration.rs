//! User-facing lines describing each applied step.

use offshore_core::Node;

/// `"<n> have been moved from the <kind> named '<old>' to the <kind> named '<new>'."`
pub fn workers_moved(count: usize, from: &Node, to: &Node) -> String {
    format!(
        "{count} have been moved from the {} named '{}' to the {} named '{}'.",
        from.label().kind_name(),
        from.name().unwrap_or_default(),
        to.label().kind_name(),
        to.name().unwrap_or_default(),
    )
}

/// `"The ship named '<ship>' has moved from the oil rig '<from>' to the oil rig '<to>'"`
pub fn vessel_moved(vessel: &str, from: &str, to: &str) -> String {
    format!("The ship named '{vessel}' has moved from the oil rig '{from}' to the oil rig '{to}'")
}
