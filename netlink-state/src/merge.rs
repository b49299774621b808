//! Pure merge functions, one per push event kind
//!
//! Each function takes the snapshot that is current at invocation time plus
//! a raw payload, and either produces a complete next snapshot or a
//! [`PayloadError`] explaining why the update was skipped. Nothing here
//! touches the store or the network, which is what keeps the merge rules
//! unit-testable in isolation.

use serde_json::Value;

use crate::model::{Desk, DeviceInfo, Display, DisplaySummary, PayloadError, Snapshot};
use crate::store::StateChange;

/// Overlay a desk-state payload onto the current snapshot.
///
/// The desk record is replaced wholesale; display state is carried over
/// untouched. A payload missing a required field rejects the whole update.
pub fn merge_desk_state(
    current: Option<&Snapshot>,
    payload: &Value,
) -> Result<(Snapshot, StateChange), PayloadError> {
    let desk = Desk::from_payload(payload)?;
    let mut next = current.cloned().unwrap_or_default();
    next.desk = Some(desk);
    Ok((next, StateChange::DeskUpdated))
}

/// Overlay a display-state payload onto the current snapshot.
///
/// Only the bus named in the payload is replaced; every other bus and the
/// desk are carried over untouched.
pub fn merge_display_state(
    current: Option<&Snapshot>,
    payload: &Value,
) -> Result<(Snapshot, StateChange), PayloadError> {
    let display = Display::from_payload(payload)?;
    let bus = display.bus.clone();
    let mut next = current.cloned().unwrap_or_default();
    next.displays.insert(bus.clone(), display);
    Ok((next, StateChange::DisplayUpdated { bus }))
}

/// Parse a device-info event payload.
pub fn parse_device_info(payload: &Value) -> Result<DeviceInfo, PayloadError> {
    DeviceInfo::from_payload(payload)
}

/// Parse a displays-list payload (array of summaries).
///
/// The list replaces the summary index wholesale, so a single bad entry
/// rejects the whole list rather than silently shrinking it.
pub fn parse_display_list(payload: &Value) -> Result<Vec<DisplaySummary>, PayloadError> {
    let items = payload.as_array().ok_or(PayloadError::WrongShape("array"))?;
    items.iter().map(DisplaySummary::from_payload).collect()
}
