//! Single-flight save coalescing.

use fl_program::ProgramSpec;

/// Durable storage for programs.
///
/// `begin_save` starts a save and returns immediately. The outcome is fed
/// back to the editor as `EditorEvent::SaveCompleted`.
pub trait Persistence {
    fn begin_save(&mut self, spec: ProgramSpec);
}

/// What the caller should do after a save request or completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveAction {
    /// Start a save of the current state now.
    Begin,
    /// A save is in flight; one repeat will follow it.
    Deferred,
    /// Nothing to do.
    Idle,
}

/// User-visible save status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    NotSaved,
}

impl SaveStatus {
    pub fn label(self) -> &'static str {
        match self {
            SaveStatus::Idle => "",
            SaveStatus::Saving => "Saving...",
            SaveStatus::Saved => "All changes saved",
            SaveStatus::NotSaved => "Not saved",
        }
    }
}

/// At most one save in flight; requests made meanwhile collapse into a single
/// repeat that starts when the in-flight save completes.
#[derive(Debug, Clone, Default)]
pub struct SaveCoordinator {
    in_flight: bool,
    repeat: bool,
    status: SaveStatus,
}

impl SaveCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_save(&mut self) -> SaveAction {
        self.status = SaveStatus::Saving;
        if self.in_flight {
            self.repeat = true;
            SaveAction::Deferred
        } else {
            self.in_flight = true;
            SaveAction::Begin
        }
    }

    /// Record the outcome of the in-flight save. Returns `Begin` if a
    /// coalesced repeat is due.
    pub fn complete(&mut self, success: bool) -> SaveAction {
        if !self.in_flight {
            tracing::warn!("Save completion with no save in flight");
            return SaveAction::Idle;
        }
        self.in_flight = false;
        self.status = if success {
            SaveStatus::Saved
        } else {
            SaveStatus::NotSaved
        };
        if self.repeat {
            self.repeat = false;
            self.in_flight = true;
            self.status = SaveStatus::Saving;
            SaveAction::Begin
        } else {
            SaveAction::Idle
        }
    }

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_requests_two_saves() {
        let mut s = SaveCoordinator::new();
        let mut begun = 0;
        for _ in 0..3 {
            if s.request_save() == SaveAction::Begin {
                begun += 1;
            }
        }
        if s.complete(true) == SaveAction::Begin {
            begun += 1;
        }
        assert_eq!(s.complete(true), SaveAction::Idle);
        assert_eq!(begun, 2);
        assert_eq!(s.status(), SaveStatus::Saved);
        assert!(!s.is_in_flight());
    }

    #[test]
    fn failure_reports_not_saved() {
        let mut s = SaveCoordinator::new();
        assert_eq!(s.request_save(), SaveAction::Begin);
        assert_eq!(s.status(), SaveStatus::Saving);
        assert_eq!(s.complete(false), SaveAction::Idle);
        assert_eq!(s.status(), SaveStatus::NotSaved);
        assert_eq!(s.status().label(), "Not saved");
    }

    #[test]
    fn stray_completion_is_ignored() {
        let mut s = SaveCoordinator::new();
        assert_eq!(s.complete(true), SaveAction::Idle);
        assert_eq!(s.status(), SaveStatus::Idle);
    }
}
