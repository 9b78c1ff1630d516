//! The surface registry: at most one inspector surface open at a time.
//!
//! Callers hold a [`SurfaceHandle`] rather than a reference to the surface.
//! "Is one already open?" is a lookup here; a handle that outlived its
//! surface simply stops resolving.

use uuid::Uuid;

use crate::navigator::{NavigationError, Navigator};

/// Opaque reference to an open surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(Uuid);

impl std::fmt::Display for SurfaceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One open surface and the navigation state behind it.
#[derive(Debug)]
pub struct Surface {
    handle: SurfaceHandle,
    pub navigator: Navigator,
}

/// How a surface came to be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opened {
    Created,
    Revealed,
}

#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    open: Option<Surface>,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the surface, or reveal the one already open as is.
    pub fn open_or_reveal(&mut self) -> (SurfaceHandle, Opened) {
        if let Some(surface) = &self.open {
            return (surface.handle, Opened::Revealed);
        }

        let surface = Surface {
            handle: SurfaceHandle(Uuid::new_v4()),
            navigator: Navigator::new(),
        };
        let handle = surface.handle;
        tracing::debug!(%handle, "opened surface");
        self.open = Some(surface);
        (handle, Opened::Created)
    }

    /// Open a surface for the record `id` as a new subject.
    ///
    /// An already open surface is revealed with its history cleared, so
    /// back-navigation never crosses into the previous subject. If it is
    /// already displaying `id`, nothing changes.
    pub fn open_for_subject(&mut self, id: &str) -> Result<SurfaceHandle, NavigationError> {
        if let Some(surface) = &self.open
            && surface.navigator.is_showing(id)
        {
            return Err(NavigationError::AlreadyShowing(id.to_string()));
        }

        let (handle, opened) = self.open_or_reveal();
        if opened == Opened::Revealed
            && let Some(surface) = self.open.as_mut()
        {
            surface.navigator.start_fresh();
        }
        Ok(handle)
    }

    /// The open surface, if any.
    pub fn active(&self) -> Option<SurfaceHandle> {
        self.open.as_ref().map(|s| s.handle)
    }

    pub fn get(&self, handle: SurfaceHandle) -> Option<&Surface> {
        self.open.as_ref().filter(|s| s.handle == handle)
    }

    pub fn get_mut(&mut self, handle: SurfaceHandle) -> Option<&mut Surface> {
        self.open.as_mut().filter(|s| s.handle == handle)
    }

    /// Dispose of a surface. Returns `false` if the handle was stale.
    pub fn close(&mut self, handle: SurfaceHandle) -> bool {
        if self.active() != Some(handle) {
            return false;
        }
        self.open = None;
        tracing::debug!(%handle, "closed surface");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::{Fields, View};
    use crate::navigator::LoadedRecord;

    const ID: &str = "001Dn00000AbCdEIAZ";
    const LOG: &str = "09:15:00.2 (3)|VARIABLE_ASSIGNMENT|[12]|acc|{\"Name\":\"A\"}|0x1";

    #[test]
    fn second_open_reveals_the_same_surface() {
        let mut registry = SurfaceRegistry::new();

        let (first, opened) = registry.open_or_reveal();
        assert_eq!(opened, Opened::Created);

        let (second, opened) = registry.open_or_reveal();
        assert_eq!(opened, Opened::Revealed);
        assert_eq!(first, second);
    }

    #[test]
    fn reveal_keeps_navigation_state() {
        let mut registry = SurfaceRegistry::new();
        let (handle, _) = registry.open_or_reveal();
        let surface = registry.get_mut(handle).unwrap();
        surface.navigator.open_log("acc", LOG).unwrap();

        registry.open_or_reveal();

        let surface = registry.get(handle).unwrap();
        assert_eq!(surface.navigator.current().object_name(), "acc");
    }

    #[test]
    fn new_subject_clears_history() {
        let mut registry = SurfaceRegistry::new();
        let (handle, _) = registry.open_or_reveal();
        let navigator = &mut registry.get_mut(handle).unwrap().navigator;
        navigator.open_log("acc", LOG).unwrap();
        navigator.go_home();
        assert!(navigator.can_go_back());

        let same = registry.open_for_subject("001Dn00000AbCdEIAZ").unwrap();

        assert_eq!(same, handle);
        let navigator = &registry.get(handle).unwrap().navigator;
        assert!(!navigator.can_go_back());
        assert_eq!(navigator.current(), &View::Home);
    }

    #[test]
    fn subject_already_displayed_keeps_history() {
        let mut registry = SurfaceRegistry::new();
        let (handle, _) = registry.open_or_reveal();
        let navigator = &mut registry.get_mut(handle).unwrap().navigator;
        navigator.open_log("acc", LOG).unwrap();
        let ticket = navigator.begin_inspect(ID).unwrap();
        navigator.finish_inspect(
            &ticket,
            Ok(LoadedRecord {
                object_name: "Account".into(),
                data: Fields::new(),
                schema: None,
            }),
        );

        let err = registry.open_for_subject(ID).unwrap_err();

        assert_eq!(err, NavigationError::AlreadyShowing(ID.into()));
        let navigator = &registry.get(handle).unwrap().navigator;
        assert!(navigator.is_showing(ID));
        assert_eq!(navigator.history_len(), 1);
    }

    #[test]
    fn closed_handles_stop_resolving() {
        let mut registry = SurfaceRegistry::new();
        let (old, _) = registry.open_or_reveal();

        assert!(registry.close(old));
        assert!(registry.get(old).is_none());
        assert!(!registry.close(old));
        assert!(registry.active().is_none());

        let (new, opened) = registry.open_or_reveal();
        assert_eq!(opened, Opened::Created);
        assert_ne!(old, new);
        assert!(registry.get_mut(old).is_none());
    }
}
