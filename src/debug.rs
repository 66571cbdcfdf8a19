use crate::{Coord, VehicleId};
#[cfg(feature = "debug")]
use serde_json::json;
#[cfg(feature = "debug")]
use slotmap::Key;

#[cfg(feature = "debug")]
thread_local!(
    static DEBUG_FRAME: std::cell::RefCell<Vec<serde_json::Value>> = Default::default();
);

/// Records a notable vehicle event in the current debug frame.
#[allow(unused)]
pub fn debug_event(kind: &str, vehicle: VehicleId, coord: Coord) {
    #[cfg(feature = "debug")]
    DEBUG_FRAME.with(|frame| {
        frame.borrow_mut().push(json!({
            "type": kind,
            "vehicle": vehicle.data().as_ffi(),
            "x": coord.x,
            "y": coord.y,
        }))
    })
}

#[cfg(feature = "debug")]
pub fn take_debug_frame() -> serde_json::Value {
    json!(DEBUG_FRAME.with(|frame| frame.take()))
}
