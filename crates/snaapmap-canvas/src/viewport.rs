//! Zoom controls shared between the canvas and anything else that wants to
//! drive it. The canvas registers its actions while mounted; callers invoke
//! them through the registry and get a no-op when nothing is registered.

use std::sync::{Arc, Mutex};

use snaapmap_core::{Dimensions, Position};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FitViewOptions {
    pub padding: Option<f64>,
}

pub trait ViewportActions: Send + Sync {
    fn zoom_in(&self);
    fn zoom_out(&self);
    fn fit_view(&self, options: FitViewOptions);
}

#[derive(Clone, Default)]
pub struct ViewportRegistry {
    actions: Arc<Mutex<Option<Arc<dyn ViewportActions>>>>,
}

impl ViewportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (`Some`) or unregister (`None`) the active canvas actions.
    pub fn register(&self, actions: Option<Arc<dyn ViewportActions>>) {
        let mut slot = self.actions.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        tracing::debug!(available = actions.is_some(), "viewport actions registered");
        *slot = actions;
    }

    /// Register `actions` until the returned guard is dropped.
    pub fn register_scoped(&self, actions: Arc<dyn ViewportActions>) -> ViewportRegistration {
        self.register(Some(actions.clone()));
        ViewportRegistration {
            registry: self.clone(),
            actions,
        }
    }

    pub fn is_available(&self) -> bool {
        self.current().is_some()
    }

    pub fn zoom_in(&self) {
        if let Some(actions) = self.current() {
            actions.zoom_in();
        }
    }

    pub fn zoom_out(&self) {
        if let Some(actions) = self.current() {
            actions.zoom_out();
        }
    }

    pub fn fit_view(&self, options: FitViewOptions) {
        if let Some(actions) = self.current() {
            actions.fit_view(options);
        }
    }

    // Cloned out so the lock is not held while the canvas runs the action.
    fn current(&self) -> Option<Arc<dyn ViewportActions>> {
        self.actions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl std::fmt::Debug for ViewportRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportRegistry")
            .field("available", &self.is_available())
            .finish()
    }
}

/// Unregisters its actions on drop, unless something else registered since.
pub struct ViewportRegistration {
    registry: ViewportRegistry,
    actions: Arc<dyn ViewportActions>,
}

impl Drop for ViewportRegistration {
    fn drop(&mut self) {
        let mut slot = self
            .registry
            .actions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, &self.actions)) {
            *slot = None;
        }
    }
}

/// Pan/zoom transform of the canvas: flow = (screen - offset) / zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn screen_to_flow(&self, point: Position) -> Position {
        let zoom = if self.zoom.is_finite() && self.zoom > 0.0 {
            self.zoom
        } else {
            1.0
        };
        Position::new((point.x - self.x) / zoom, (point.y - self.y) / zoom)
    }

    /// Flow-space point under the middle of a screen of the given size.
    pub fn center(&self, screen: Dimensions) -> Position {
        self.screen_to_flow(Position::new(screen.width / 2.0, screen.height / 2.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        zoom_in: AtomicUsize,
        zoom_out: AtomicUsize,
        fit: Mutex<Vec<FitViewOptions>>,
    }

    impl ViewportActions for Counting {
        fn zoom_in(&self) {
            self.zoom_in.fetch_add(1, Ordering::SeqCst);
        }
        fn zoom_out(&self) {
            self.zoom_out.fetch_add(1, Ordering::SeqCst);
        }
        fn fit_view(&self, options: FitViewOptions) {
            self.fit.lock().unwrap().push(options);
        }
    }

    #[test]
    fn calls_are_noops_until_registered() {
        let registry = ViewportRegistry::new();
        assert!(!registry.is_available());
        registry.zoom_in();
        registry.fit_view(FitViewOptions::default());

        let actions = Arc::new(Counting::default());
        registry.register(Some(actions.clone()));
        let sidebar = registry.clone();
        assert!(sidebar.is_available());

        sidebar.zoom_in();
        sidebar.zoom_out();
        sidebar.zoom_out();
        sidebar.fit_view(FitViewOptions { padding: Some(0.2) });

        assert_eq!(actions.zoom_in.load(Ordering::SeqCst), 1);
        assert_eq!(actions.zoom_out.load(Ordering::SeqCst), 2);
        assert_eq!(*actions.fit.lock().unwrap(), vec![FitViewOptions { padding: Some(0.2) }]);

        registry.register(None);
        sidebar.zoom_in();
        assert!(!sidebar.is_available());
        assert_eq!(actions.zoom_in.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn scoped_registration_only_clears_its_own_actions() {
        let registry = ViewportRegistry::new();
        let first = registry.register_scoped(Arc::new(Counting::default()));
        drop(first);
        assert!(!registry.is_available());

        let stale = registry.register_scoped(Arc::new(Counting::default()));
        let remounted = Arc::new(Counting::default());
        registry.register(Some(remounted.clone()));
        drop(stale);
        assert!(registry.is_available());
        registry.zoom_in();
        assert_eq!(remounted.zoom_in.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn screen_center_maps_through_pan_and_zoom() {
        let viewport = Viewport {
            x: 100.0,
            y: -50.0,
            zoom: 2.0,
        };
        let center = viewport.center(Dimensions {
            width: 800.0,
            height: 600.0,
        });
        assert_eq!(center, Position::new(150.0, 175.0));

        let broken = Viewport { zoom: 0.0, ..Viewport::default() };
        assert_eq!(broken.screen_to_flow(Position::new(4.0, 2.0)), Position::new(4.0, 2.0));
    }
}
