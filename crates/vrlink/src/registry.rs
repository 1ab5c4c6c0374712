//! Tracked-device registry: slot -> role classification and the controller
//! asset loader state machine.
//!
//! Loads poll the runtime's async loaders once per frame with a bounded
//! budget; a slot whose loader never settles goes `Failed` instead of
//! stalling the frame loop. Assets are retained across deactivation so a
//! reconnecting controller is drawable again without a reload.

use crate::runtime::VrRuntime;
use crate::types::{DeviceEvent, DeviceRole, DeviceSlot, LoadPoll, RenderModel, TextureMap};
use crate::AssetLoadError;
use std::collections::HashMap;

/// Polls a pending load survives before it is declared failed.
/// Roughly ten seconds at a 60 Hz frame cadence.
pub const DEFAULT_LOAD_BUDGET: u32 = 600;

/// A fully loaded drawable asset for one controller slot.
#[derive(Debug, Clone)]
pub struct ControllerAsset {
    pub model: RenderModel,
    pub texture: TextureMap,
}

#[derive(Debug)]
enum AssetState {
    /// Mesh fetch in flight.
    PendingModel { name: String, polls_left: u32 },
    /// Mesh arrived; diffuse texture fetch in flight.
    PendingTexture { model: RenderModel, polls_left: u32 },
    Ready(ControllerAsset),
    Failed,
}

pub struct DeviceRegistry {
    headset: Option<DeviceSlot>,
    /// Ordered set of currently active controller slots.
    active: Vec<DeviceSlot>,
    assets: HashMap<DeviceSlot, AssetState>,
    load_budget: u32,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::with_load_budget(DEFAULT_LOAD_BUDGET)
    }

    pub fn with_load_budget(load_budget: u32) -> Self {
        Self {
            headset: None,
            active: Vec::new(),
            assets: HashMap::new(),
            load_budget,
        }
    }

    /// One-shot startup enumeration: classifies every slot and enqueues
    /// asset loads for the controllers found.
    pub fn scan(&mut self, runtime: &mut dyn VrRuntime) {
        for slot in 0..runtime.slot_count() {
            match runtime.device_role(slot) {
                DeviceRole::Headset => {
                    if self.headset.is_none() {
                        self.headset = Some(slot);
                        log::info!("headset at slot {slot}");
                    }
                }
                DeviceRole::Controller => self.activate(slot, runtime),
                DeviceRole::Unknown => {}
            }
        }
    }

    /// The designated headset slot, if one was discovered.
    #[inline]
    pub fn headset(&self) -> Option<DeviceSlot> {
        self.headset
    }

    /// Consumes one connection event from the runtime's queue.
    pub fn apply_event(&mut self, event: DeviceEvent, runtime: &mut dyn VrRuntime) {
        match event {
            DeviceEvent::Activated(slot) => match runtime.device_role(slot) {
                DeviceRole::Controller => self.activate(slot, runtime),
                DeviceRole::Headset => {
                    if self.headset.is_none() {
                        self.headset = Some(slot);
                        log::info!("headset at slot {slot}");
                    }
                }
                DeviceRole::Unknown => {
                    log::debug!("activation for unclassified slot {slot} ignored")
                }
            },
            DeviceEvent::Deactivated(slot) => {
                // No-op when the slot was never active. The asset stays
                // cached for a quick reactivation.
                self.active.retain(|&s| s != slot);
            }
            DeviceEvent::Other(code) => {
                log::debug!("unhandled device event {code}");
            }
        }
    }

    fn activate(&mut self, slot: DeviceSlot, runtime: &mut dyn VrRuntime) {
        if self.active.contains(&slot) {
            // Re-entrant activation while tracked: drop it.
            return;
        }
        self.active.push(slot);

        // Any existing entry blocks a fresh load: in flight, cached, or
        // a failure the runtime already reported.
        if self.assets.contains_key(&slot) {
            return;
        }
        match runtime.render_model_name(slot) {
            Some(name) => {
                log::info!("controller at slot {slot}: loading model '{name}'");
                self.assets.insert(
                    slot,
                    AssetState::PendingModel {
                        name,
                        polls_left: self.load_budget,
                    },
                );
            }
            None => {
                log::warn!("{}", AssetLoadError::MissingModelName(slot));
                self.assets.insert(slot, AssetState::Failed);
            }
        }
    }

    /// Advances every in-flight load by one poll. Returns the slots whose
    /// assets became ready this call, in slot order.
    pub fn poll_assets(&mut self, runtime: &mut dyn VrRuntime) -> Vec<DeviceSlot> {
        let mut newly_ready = Vec::new();
        let mut slots: Vec<DeviceSlot> = self.assets.keys().copied().collect();
        slots.sort_unstable();

        for slot in slots {
            let state = self.assets.get_mut(&slot).expect("slot just enumerated");
            match state {
                AssetState::PendingModel { name, polls_left } => {
                    match runtime.load_model(name) {
                        LoadPoll::Pending => {
                            *polls_left = polls_left.saturating_sub(1);
                            if *polls_left == 0 {
                                log::warn!("{}", AssetLoadError::TimedOut(slot));
                                *state = AssetState::Failed;
                            }
                        }
                        LoadPoll::Ready(model) => {
                            *state = AssetState::PendingTexture {
                                model,
                                polls_left: self.load_budget,
                            };
                        }
                        LoadPoll::Failed => {
                            log::warn!("{}", AssetLoadError::Model(slot));
                            *state = AssetState::Failed;
                        }
                    }
                }
                AssetState::PendingTexture { model, polls_left } => {
                    match runtime.load_texture(model.diffuse_texture_id) {
                        LoadPoll::Pending => {
                            *polls_left = polls_left.saturating_sub(1);
                            if *polls_left == 0 {
                                log::warn!("{}", AssetLoadError::TimedOut(slot));
                                *state = AssetState::Failed;
                            }
                        }
                        LoadPoll::Ready(texture) => {
                            log::info!("controller asset ready for slot {slot}");
                            *state = AssetState::Ready(ControllerAsset {
                                model: model.clone(),
                                texture,
                            });
                            newly_ready.push(slot);
                        }
                        LoadPoll::Failed => {
                            log::warn!("{}", AssetLoadError::Texture(slot));
                            *state = AssetState::Failed;
                        }
                    }
                }
                AssetState::Ready(_) | AssetState::Failed => {}
            }
        }
        newly_ready
    }

    /// Ordered active controller slots whose asset finished loading. These
    /// are the controllers a frame actually draws.
    pub fn active_controllers(&self) -> Vec<DeviceSlot> {
        self.active
            .iter()
            .copied()
            .filter(|slot| matches!(self.assets.get(slot), Some(AssetState::Ready(_))))
            .collect()
    }

    /// All active controller slots, drawable or not; they still track.
    pub fn active_slots(&self) -> &[DeviceSlot] {
        &self.active
    }

    pub fn asset(&self, slot: DeviceSlot) -> Option<&ControllerAsset> {
        match self.assets.get(&slot) {
            Some(AssetState::Ready(asset)) => Some(asset),
            _ => None,
        }
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimRuntime;

    /// Polls until nothing is pending anymore, frame-loop style.
    fn settle(reg: &mut DeviceRegistry, rt: &mut SimRuntime, max_frames: u32) -> Vec<DeviceSlot> {
        let mut ready = Vec::new();
        for _ in 0..max_frames {
            ready.extend(reg.poll_assets(rt));
        }
        ready
    }

    #[test]
    fn scan_classifies_headset_and_controllers() {
        let mut rt = SimRuntime::new();
        let mut reg = DeviceRegistry::new();
        reg.scan(&mut rt);

        assert_eq!(reg.headset(), Some(0));
        assert_eq!(reg.active_slots(), &[1, 2]);
        // Nothing drawable until the async loads settle.
        assert!(reg.active_controllers().is_empty());
    }

    #[test]
    fn assets_become_ready_after_bounded_polling() {
        let mut rt = SimRuntime::new();
        let mut reg = DeviceRegistry::new();
        reg.scan(&mut rt);

        let ready = settle(&mut reg, &mut rt, 16);
        assert_eq!(ready, vec![1, 2]);
        assert_eq!(reg.active_controllers(), vec![1, 2]);
        assert!(reg.asset(1).is_some());
        assert!(!reg.asset(1).unwrap().texture.rgba.is_empty());
    }

    #[test]
    fn two_controllers_drawn_until_one_disconnects() {
        let mut rt = SimRuntime::new();
        let mut reg = DeviceRegistry::new();
        reg.scan(&mut rt);
        settle(&mut reg, &mut rt, 16);
        assert_eq!(reg.active_controllers(), vec![1, 2]);

        reg.apply_event(DeviceEvent::Deactivated(1), &mut rt);
        assert_eq!(reg.active_controllers(), vec![2]);
    }

    #[test]
    fn deactivating_an_inactive_slot_is_a_no_op() {
        let mut rt = SimRuntime::new();
        let mut reg = DeviceRegistry::new();
        reg.scan(&mut rt);

        reg.apply_event(DeviceEvent::Deactivated(7), &mut rt);
        reg.apply_event(DeviceEvent::Deactivated(2), &mut rt);
        reg.apply_event(DeviceEvent::Deactivated(2), &mut rt);
        assert_eq!(reg.active_slots(), &[1]);
    }

    #[test]
    fn reactivation_reuses_the_cached_asset() {
        let mut rt = SimRuntime::new();
        let mut reg = DeviceRegistry::new();
        reg.scan(&mut rt);
        settle(&mut reg, &mut rt, 16);
        let loads_before = rt.model_load_calls();

        reg.apply_event(DeviceEvent::Deactivated(2), &mut rt);
        assert_eq!(reg.active_controllers(), vec![1]);

        reg.apply_event(DeviceEvent::Activated(2), &mut rt);
        // Drawable again immediately, with no fresh loader traffic.
        assert_eq!(reg.active_controllers(), vec![1, 2]);
        settle(&mut reg, &mut rt, 4);
        assert_eq!(rt.model_load_calls(), loads_before);
    }

    #[test]
    fn reentrant_activation_is_dropped() {
        let mut rt = SimRuntime::new();
        let mut reg = DeviceRegistry::new();
        reg.scan(&mut rt);

        reg.apply_event(DeviceEvent::Activated(1), &mut rt);
        reg.apply_event(DeviceEvent::Activated(1), &mut rt);
        assert_eq!(reg.active_slots(), &[1, 2]);
    }

    #[test]
    fn stalled_loader_fails_after_the_budget_runs_out() {
        let mut rt = SimRuntime::new();
        rt.stall_loader(true);
        let mut reg = DeviceRegistry::with_load_budget(5);
        reg.scan(&mut rt);

        settle(&mut reg, &mut rt, 10);
        // The slots stay tracked for poses but draw nothing.
        assert_eq!(reg.active_slots(), &[1, 2]);
        assert!(reg.active_controllers().is_empty());
        assert!(reg.asset(1).is_none());
    }

    #[test]
    fn late_headset_designation_feeds_the_view_origin() {
        use crate::pose::PoseTracker;
        use glam::Mat4;

        // No headset at startup; one activates mid-session.
        let mut rt = SimRuntime::with_roles(vec![DeviceRole::Controller, DeviceRole::Headset]);
        let mut reg = DeviceRegistry::new();
        let mut poses = PoseTracker::new(rt.slot_count());
        poses.set_headset(reg.headset());

        reg.apply_event(DeviceEvent::Activated(1), &mut rt);
        assert_eq!(reg.headset(), Some(1));

        // The designation must be pushed back into the tracker after each
        // event drain, or the view origin stays identity forever.
        poses.set_headset(reg.headset());
        poses.update(&mut rt);
        assert_ne!(poses.head(), Mat4::IDENTITY);
        assert_eq!(poses.head(), poses.transform(1));
    }

    #[test]
    fn unknown_events_are_ignored() {
        let mut rt = SimRuntime::new();
        let mut reg = DeviceRegistry::new();
        reg.scan(&mut rt);

        reg.apply_event(DeviceEvent::Other(1234), &mut rt);
        assert_eq!(reg.active_slots(), &[1, 2]);
    }
}
