use wasm_bindgen::JsCast;
use web_sys::{MediaStream, MediaStreamTrack};

pub trait MediaTracks {
    fn release(&self);
}

impl MediaTracks for MediaStream {
    fn release(&self) {
        for track in self.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectTicket {
    generation: u64,
    camera: String,
}

impl SelectTicket {
    pub fn camera(&self) -> &str {
        &self.camera
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Bound {
    Active,
    // A newer selection started meanwhile; the stream was released.
    Superseded,
}

struct Binding<S> {
    camera: String,
    stream: S,
}

/// Selection is split around the asynchronous acquisition: `begin` tears
/// down the current binding, `finish` binds the acquired stream only if no
/// newer selection started in between.
pub struct StreamController<S: MediaTracks> {
    generation: u64,
    pending: Option<String>,
    active: Option<Binding<S>>,
}

impl<S: MediaTracks> Default for StreamController<S> {
    fn default() -> Self {
        Self {
            generation: 0,
            pending: None,
            active: None,
        }
    }
}

impl<S: MediaTracks> StreamController<S> {
    pub fn begin(&mut self, camera: &str) -> SelectTicket {
        self.release_active();
        self.generation += 1;
        self.pending = Some(camera.to_string());
        SelectTicket {
            generation: self.generation,
            camera: camera.to_string(),
        }
    }

    pub fn finish(&mut self, ticket: &SelectTicket, stream: S) -> Bound {
        if ticket.generation != self.generation {
            stream.release();
            return Bound::Superseded;
        }
        self.release_active();
        self.pending = None;
        self.active = Some(Binding {
            camera: ticket.camera.clone(),
            stream,
        });
        Bound::Active
    }

    // Acquisition failed. True when the failure belongs to the current selection.
    pub fn abandon(&mut self, ticket: &SelectTicket) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        self.pending = None;
        true
    }

    pub fn stop(&mut self) {
        self.generation += 1;
        self.pending = None;
        self.release_active();
    }

    pub fn active_camera(&self) -> Option<&str> {
        self.active.as_ref().map(|b| b.camera.as_str())
    }

    pub fn active_stream(&self) -> Option<&S> {
        self.active.as_ref().map(|b| &b.stream)
    }

    pub fn pending_camera(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    fn release_active(&mut self) {
        if let Some(binding) = self.active.take() {
            log::debug!("releasing stream for camera {}", binding.camera);
            binding.stream.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone)]
    struct FakeStream {
        released: Rc<Cell<u32>>,
    }

    impl FakeStream {
        fn new() -> (Self, Rc<Cell<u32>>) {
            let released = Rc::new(Cell::new(0));
            (
                Self {
                    released: Rc::clone(&released),
                },
                released,
            )
        }
    }

    impl MediaTracks for FakeStream {
        fn release(&self) {
            self.released.set(self.released.get() + 1);
        }
    }

    #[test]
    fn select_binds_stream() {
        let mut controller = StreamController::default();
        let ticket = controller.begin("front");
        assert_eq!(controller.pending_camera(), Some("front"));

        let (stream, released) = FakeStream::new();
        assert_eq!(controller.finish(&ticket, stream), Bound::Active);
        assert_eq!(controller.active_camera(), Some("front"));
        assert_eq!(controller.pending_camera(), None);
        assert_eq!(released.get(), 0);
    }

    #[test]
    fn reselect_releases_previous_stream_first() {
        let mut controller = StreamController::default();
        let first = controller.begin("front");
        let (stream, released) = FakeStream::new();
        controller.finish(&first, stream);

        controller.begin("back");
        assert_eq!(released.get(), 1);
        assert_eq!(controller.active_camera(), None);
    }

    #[test]
    fn rapid_switch_keeps_only_second_camera() {
        let mut controller = StreamController::default();
        let first = controller.begin("front");
        let second = controller.begin("back");

        let (late_front, front_released) = FakeStream::new();
        let (back, back_released) = FakeStream::new();

        assert_eq!(controller.finish(&second, back), Bound::Active);
        assert_eq!(controller.finish(&first, late_front), Bound::Superseded);

        assert_eq!(controller.active_camera(), Some("back"));
        assert_eq!(front_released.get(), 1);
        assert_eq!(back_released.get(), 0);
    }

    #[test]
    fn failed_stale_selection_is_not_reported() {
        let mut controller: StreamController<FakeStream> = StreamController::default();
        let first = controller.begin("front");
        let second = controller.begin("back");
        assert!(!controller.abandon(&first));
        assert!(controller.abandon(&second));
        assert_eq!(controller.active_camera(), None);
    }

    #[test]
    fn stop_releases_and_invalidates_pending() {
        let mut controller = StreamController::default();
        let ticket = controller.begin("front");
        let (stream, released) = FakeStream::new();
        controller.finish(&ticket, stream);

        let pending = controller.begin("back");
        controller.stop();
        assert_eq!(released.get(), 1);

        let (late, late_released) = FakeStream::new();
        assert_eq!(controller.finish(&pending, late), Bound::Superseded);
        assert_eq!(late_released.get(), 1);
        assert_eq!(controller.active_stream().map(|_| ()), None);
    }
}
