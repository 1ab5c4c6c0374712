//! Loopback-style audio capture feeding the waveform strips.
//!
//! A cpal input stream pushes stereo frames into a mutex-guarded ring
//! from the audio thread; the render loop pulls the newest window once
//! per frame. A monotone cursor tells the loop whether anything new
//! arrived, so a stalled or absent capture leaves the strips exactly as
//! they were.

use crate::scene::WAVEFORM_SAMPLES;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};

/// Fixed-capacity stereo sample ring. Capacity matches the strip length
/// so `latest` is a straight unrolled copy.
pub struct CaptureRing {
    left: [f32; WAVEFORM_SAMPLES],
    right: [f32; WAVEFORM_SAMPLES],
    head: usize,
    written: u64,
}

impl CaptureRing {
    pub fn new() -> Self {
        Self {
            left: [0.0; WAVEFORM_SAMPLES],
            right: [0.0; WAVEFORM_SAMPLES],
            head: 0,
            written: 0,
        }
    }

    /// Appends one stereo frame, evicting the oldest.
    pub fn push_frame(&mut self, left: f32, right: f32) {
        self.left[self.head] = left;
        self.right[self.head] = right;
        self.head = (self.head + 1) % WAVEFORM_SAMPLES;
        self.written += 1;
    }

    /// Total frames ever pushed. Strictly monotone while capture runs.
    #[inline]
    pub fn cursor(&self) -> u64 {
        self.written
    }

    /// Copies the newest window into `left`/`right`, oldest sample first,
    /// newest last. Slots never written yet read as silence.
    pub fn latest(
        &self,
        left: &mut [f32; WAVEFORM_SAMPLES],
        right: &mut [f32; WAVEFORM_SAMPLES],
    ) {
        for i in 0..WAVEFORM_SAMPLES {
            // Walk backwards from the newest sample, filling from the end.
            let out = WAVEFORM_SAMPLES - 1 - i;
            if (i as u64) < self.written {
                let src = (self.head + WAVEFORM_SAMPLES - 1 - i) % WAVEFORM_SAMPLES;
                left[out] = self.left[src];
                right[out] = self.right[src];
            } else {
                left[out] = 0.0;
                right[out] = 0.0;
            }
        }
    }
}

impl Default for CaptureRing {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the capture stream and tracks how far the render loop has read.
pub struct AudioSampler {
    ring: Arc<Mutex<CaptureRing>>,
    _stream: Option<cpal::Stream>,
    last_cursor: u64,
}

impl AudioSampler {
    /// Opens a capture stream, preferring a loopback-style endpoint (a
    /// device named like "Stereo Mix") over the default microphone.
    /// Capture is optional: on any failure the viewer runs silent.
    pub fn start() -> Self {
        let ring = Arc::new(Mutex::new(CaptureRing::new()));
        let stream = match open_stream(ring.clone()) {
            Ok(stream) => Some(stream),
            Err(err) => {
                log::warn!("audio capture unavailable, waveforms stay flat: {err}");
                None
            }
        };
        Self {
            ring,
            _stream: stream,
            last_cursor: 0,
        }
    }

    /// Ring without a stream, for tests driving `push_frame` by hand.
    #[cfg(test)]
    fn detached() -> Self {
        Self {
            ring: Arc::new(Mutex::new(CaptureRing::new())),
            _stream: None,
            last_cursor: 0,
        }
    }

    /// Pulls the newest capture window. Returns false, leaving the output
    /// buffers untouched, when nothing arrived since the previous call.
    pub fn sync(
        &mut self,
        left: &mut [f32; WAVEFORM_SAMPLES],
        right: &mut [f32; WAVEFORM_SAMPLES],
    ) -> bool {
        let ring = self.ring.lock().expect("audio ring poisoned");
        if ring.cursor() == self.last_cursor {
            return false;
        }
        self.last_cursor = ring.cursor();
        ring.latest(left, right);
        true
    }
}

fn open_stream(ring: Arc<Mutex<CaptureRing>>) -> anyhow::Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = pick_device(&host)
        .ok_or_else(|| anyhow::anyhow!("no audio input device present"))?;
    log::info!(
        "capturing from '{}'",
        device.name().unwrap_or_else(|_| "<unnamed>".into())
    );

    let supported = device.default_input_config()?;
    let sample_format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();
    let channels = config.channels as usize;

    let err_fn = |err| log::warn!("audio stream error: {err}");
    let stream = match sample_format {
        cpal::SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                push_samples(&ring, channels, data.iter().copied());
            },
            err_fn,
            None,
        )?,
        cpal::SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                push_samples(&ring, channels, data.iter().map(|&s| s as f32 / 32768.0));
            },
            err_fn,
            None,
        )?,
        cpal::SampleFormat::U16 => device.build_input_stream(
            &config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| {
                push_samples(
                    &ring,
                    channels,
                    data.iter().map(|&s| (s as f32 - 32768.0) / 32768.0),
                );
            },
            err_fn,
            None,
        )?,
        other => anyhow::bail!("unsupported capture sample format {other:?}"),
    };
    stream.play()?;
    Ok(stream)
}

/// Prefers an endpoint whose name suggests a loopback mix of what the
/// machine is playing; falls back to the default input device.
fn pick_device(host: &cpal::Host) -> Option<cpal::Device> {
    if let Ok(devices) = host.input_devices() {
        for device in devices {
            if let Ok(name) = device.name() {
                if name.contains("Mix") {
                    return Some(device);
                }
            }
        }
    }
    host.default_input_device()
}

fn push_samples(
    ring: &Mutex<CaptureRing>,
    channels: usize,
    samples: impl Iterator<Item = f32>,
) {
    let mut ring = match ring.lock() {
        Ok(ring) => ring,
        Err(_) => return,
    };
    let mut frame = Vec::with_capacity(channels);
    for sample in samples {
        frame.push(sample);
        if frame.len() == channels {
            let left = frame[0];
            // Mono capture feeds both strips.
            let right = if channels > 1 { frame[1] } else { left };
            ring.push_frame(left, right);
            frame.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underfilled_ring_pads_with_silence() {
        let mut ring = CaptureRing::new();
        ring.push_frame(0.5, -0.5);
        ring.push_frame(0.25, -0.25);

        let mut left = [9.0; WAVEFORM_SAMPLES];
        let mut right = [9.0; WAVEFORM_SAMPLES];
        ring.latest(&mut left, &mut right);

        assert_eq!(left[0], 0.0);
        assert_eq!(left[WAVEFORM_SAMPLES - 2], 0.5);
        assert_eq!(left[WAVEFORM_SAMPLES - 1], 0.25);
        assert_eq!(right[WAVEFORM_SAMPLES - 1], -0.25);
    }

    #[test]
    fn full_ring_returns_the_newest_window_in_order() {
        let mut ring = CaptureRing::new();
        for i in 0..(WAVEFORM_SAMPLES + 100) {
            ring.push_frame(i as f32, -(i as f32));
        }

        let mut left = [0.0; WAVEFORM_SAMPLES];
        let mut right = [0.0; WAVEFORM_SAMPLES];
        ring.latest(&mut left, &mut right);

        assert_eq!(left[0], 100.0);
        assert_eq!(left[WAVEFORM_SAMPLES - 1], (WAVEFORM_SAMPLES + 99) as f32);
        assert_eq!(right[0], -100.0);
    }

    #[test]
    fn sync_reports_nothing_new_and_leaves_buffers_alone() {
        let mut sampler = AudioSampler::detached();
        sampler
            .ring
            .lock()
            .unwrap()
            .push_frame(0.7, 0.7);

        let mut left = [0.0; WAVEFORM_SAMPLES];
        let mut right = [0.0; WAVEFORM_SAMPLES];
        assert!(sampler.sync(&mut left, &mut right));
        let before = left;

        // No new frames: the second sync must not disturb the buffers.
        left[0] = 42.0;
        assert!(!sampler.sync(&mut left, &mut right));
        assert_eq!(left[0], 42.0);
        assert_eq!(left[1..], before[1..]);
    }

    #[test]
    fn cursor_is_monotone() {
        let mut ring = CaptureRing::new();
        let mut prev = ring.cursor();
        for i in 0..2000 {
            ring.push_frame(i as f32, i as f32);
            assert!(ring.cursor() > prev);
            prev = ring.cursor();
        }
    }
}
