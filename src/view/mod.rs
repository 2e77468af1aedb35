//! View Module
//!
//! Decides what the host shows: the loading fallback, the live scene, or
//! the error fallback. Rendering failures only ever move the view to
//! `Error`; leaving `Error` takes a full reload through `PageHost`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Rendering-context failure flag.
///
/// Cloned into GPU error callbacks, which may run outside the render call,
/// and checked by the host once per frame.
#[derive(Debug, Clone, Default)]
pub struct ErrorFlag(Arc<AtomicBool>);

impl ErrorFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        if !self.0.swap(true, Ordering::SeqCst) {
            log::error!("[ErrorFlag] Rendering context failure raised");
        }
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Static views shown instead of the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackView {
    Loading,
    Error,
}

impl FallbackView {
    pub fn heading(&self) -> &'static str {
        match self {
            FallbackView::Loading => "Loading 3D Scene...",
            FallbackView::Error => "WebGL Context Error",
        }
    }

    pub fn detail(&self) -> Option<&'static str> {
        match self {
            FallbackView::Loading => None,
            FallbackView::Error => Some("The 3D scene encountered an error"),
        }
    }

    /// Label of the single user action, if the view has one
    pub fn action_label(&self) -> Option<&'static str> {
        match self {
            FallbackView::Loading => None,
            FallbackView::Error => Some("Reload Page"),
        }
    }

    /// All visible lines, top to bottom
    pub fn lines(&self) -> Vec<&'static str> {
        let mut lines = vec![self.heading()];
        lines.extend(self.detail());
        lines.extend(self.action_label().map(|_| "[R] Reload Page"));
        lines
    }
}

/// The environment able to perform a full reload
pub trait PageHost {
    fn reload(&mut self);
}

/// Trigger the fallback's reload action.
///
/// Issues exactly one `reload` for the error view and nothing for views
/// without an action. Returns whether a reload was issued.
pub fn activate_reload<H: PageHost + ?Sized>(view: FallbackView, host: &mut H) -> bool {
    if view.action_label().is_none() {
        return false;
    }
    log::info!("[view] Reload requested from {:?} view", view);
    host.reload();
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Scene,
    Error,
}

/// What is on screen for a given state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visible {
    Scene,
    Fallback(FallbackView),
}

/// Host-side view state machine
#[derive(Debug, Clone)]
pub struct ViewController {
    state: ViewState,
    flag: ErrorFlag,
}

impl ViewController {
    pub fn new(flag: ErrorFlag) -> Self {
        Self {
            state: ViewState::Loading,
            flag,
        }
    }

    /// Current state; a raised flag always reads as `Error`
    pub fn state(&self) -> ViewState {
        if self.flag.is_raised() {
            ViewState::Error
        } else {
            self.state
        }
    }

    pub fn error_flag(&self) -> &ErrorFlag {
        &self.flag
    }

    /// Scene initialised; ignored once the error view is up
    pub fn scene_ready(&mut self) {
        if self.state() == ViewState::Loading {
            log::info!("[ViewController] Loading -> Scene");
            self.state = ViewState::Scene;
        }
    }

    /// Raise the error flag and switch to the error fallback
    pub fn fail(&mut self, reason: &str) {
        log::error!("[ViewController] Scene failed: {}", reason);
        self.flag.raise();
        self.state = ViewState::Error;
    }

    pub fn visible(&self) -> Visible {
        match self.state() {
            ViewState::Loading => Visible::Fallback(FallbackView::Loading),
            ViewState::Scene => Visible::Scene,
            ViewState::Error => Visible::Fallback(FallbackView::Error),
        }
    }

    /// Reset to `Loading` with a fresh flag, as after a page reload
    pub fn reset(&mut self) -> ErrorFlag {
        self.flag = ErrorFlag::new();
        self.state = ViewState::Loading;
        self.flag.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingHost {
        reloads: u32,
    }

    impl PageHost for CountingHost {
        fn reload(&mut self) {
            self.reloads += 1;
        }
    }

    #[test]
    fn test_loading_then_scene() {
        let mut view = ViewController::new(ErrorFlag::new());
        assert_eq!(view.visible(), Visible::Fallback(FallbackView::Loading));
        view.scene_ready();
        assert_eq!(view.visible(), Visible::Scene);
    }

    #[test]
    fn test_error_flag_always_shows_error_fallback() {
        for ready_first in [false, true] {
            let flag = ErrorFlag::new();
            let mut view = ViewController::new(flag.clone());
            if ready_first {
                view.scene_ready();
            }

            // Raised from outside, e.g. by a GPU error callback
            flag.raise();
            assert_eq!(view.state(), ViewState::Error);
            assert_eq!(view.visible(), Visible::Fallback(FallbackView::Error));

            view.scene_ready();
            assert_eq!(view.visible(), Visible::Fallback(FallbackView::Error));
        }
    }

    #[test]
    fn test_fail_raises_flag() {
        let flag = ErrorFlag::new();
        let mut view = ViewController::new(flag.clone());
        view.fail("adapter missing");
        assert!(flag.is_raised());
        assert_eq!(view.state(), ViewState::Error);
    }

    #[test]
    fn test_reload_action_issues_exactly_one_reload() {
        let mut host = CountingHost::default();
        assert!(activate_reload(FallbackView::Error, &mut host));
        assert_eq!(host.reloads, 1);

        assert!(!activate_reload(FallbackView::Loading, &mut host));
        assert_eq!(host.reloads, 1);
    }

    #[test]
    fn test_reset_clears_error() {
        let mut view = ViewController::new(ErrorFlag::new());
        view.fail("lost");
        let fresh = view.reset();
        assert!(!fresh.is_raised());
        assert_eq!(view.state(), ViewState::Loading);
    }

    #[test]
    fn test_error_view_text() {
        let lines = FallbackView::Error.lines();
        assert_eq!(
            lines,
            vec!["WebGL Context Error", "The 3D scene encountered an error", "[R] Reload Page"]
        );
        assert_eq!(FallbackView::Loading.lines(), vec!["Loading 3D Scene..."]);
    }
}
