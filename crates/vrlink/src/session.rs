//! Runtime connection lifetime. Opened once before any rendering, shut
//! down on drop so every exit path (including panics unwinding out of the
//! render loop) leaves the runtime clean for the next application.

use crate::runtime::VrRuntime;
use crate::InitError;

pub struct Session<R: VrRuntime> {
    runtime: R,
    slot_count: u32,
}

impl<R: VrRuntime> Session<R> {
    /// Establishes the runtime connection and brings the compositor up.
    pub fn open(mut runtime: R) -> Result<Self, InitError> {
        let slot_count = runtime.slot_count();
        if slot_count == 0 {
            return Err(InitError::NoDeviceSlots);
        }
        runtime.begin_session();
        log::info!("VR session open, {slot_count} device slots");
        Ok(Self {
            runtime,
            slot_count,
        })
    }

    #[inline]
    pub fn slot_count(&self) -> u32 {
        self.slot_count
    }

    #[inline]
    pub fn runtime(&mut self) -> &mut R {
        &mut self.runtime
    }
}

impl<R: VrRuntime> Drop for Session<R> {
    fn drop(&mut self) {
        self.runtime.shutdown();
        log::info!("VR session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimRuntime;

    #[test]
    fn open_succeeds_with_devices_present() {
        let session = Session::open(SimRuntime::new()).unwrap();
        assert_eq!(session.slot_count(), 3);
    }

    #[test]
    fn open_fails_without_device_slots() {
        let err = match Session::open(SimRuntime::with_roles(vec![])) {
            Ok(_) => panic!("expected open to fail"),
            Err(err) => err,
        };
        assert!(matches!(err, InitError::NoDeviceSlots));
    }
}
