//! Confirmation dialog state machine for destructive effects
//!
//! `Closed -> Open -> Confirming -> Closed`, plus `Open -> Closed` on cancel.
//! The payload is handed out exactly once, so a double confirm can never run
//! an effect twice.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfirmVariant {
    #[default]
    Danger,
    Warning,
}

/// What the dialog shows
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    pub title: String,
    pub description: String,
    pub variant: ConfirmVariant,
    pub show_force_option: bool,
}

impl Prompt {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: ConfirmVariant::Danger,
            show_force_option: false,
        }
    }

    pub fn variant(mut self, variant: ConfirmVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn force_option(mut self, show: bool) -> Self {
        self.show_force_option = show;
        self
    }
}

/// Identity of one opened request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConfirmTicket(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmPhase {
    Closed,
    Open,
    Confirming,
}

/// Payload released by a successful [`Confirmation::confirm`]
#[derive(Debug)]
pub struct Confirmed<P> {
    pub ticket: ConfirmTicket,
    pub payload: P,
    pub force: bool,
}

#[derive(Debug)]
enum State<P> {
    Closed,
    Open {
        ticket: ConfirmTicket,
        prompt: Prompt,
        payload: P,
    },
    Confirming {
        ticket: ConfirmTicket,
        prompt: Prompt,
    },
}

#[derive(Debug)]
pub struct Confirmation<P> {
    state: State<P>,
    force: bool,
    next_ticket: u64,
}

impl<P> Default for Confirmation<P> {
    fn default() -> Self {
        Self {
            state: State::Closed,
            force: false,
            next_ticket: 0,
        }
    }
}

impl<P> Confirmation<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a request, replacing any live one. The force flag is reset.
    pub fn open(&mut self, prompt: Prompt, payload: P) -> ConfirmTicket {
        self.next_ticket += 1;
        let ticket = ConfirmTicket(self.next_ticket);
        self.state = State::Open {
            ticket,
            prompt,
            payload,
        };
        self.force = false;
        ticket
    }

    /// Take the payload and move to `Confirming`. Returns `None` unless `Open`.
    pub fn confirm(&mut self) -> Option<Confirmed<P>> {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Open {
                ticket,
                prompt,
                payload,
            } => {
                self.state = State::Confirming { ticket, prompt };
                Some(Confirmed {
                    ticket,
                    payload,
                    force: self.force,
                })
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Close without running anything. Ignored while the effect is running.
    pub fn cancel(&mut self) -> bool {
        if matches!(self.state, State::Open { .. }) {
            self.state = State::Closed;
            self.force = false;
            true
        } else {
            false
        }
    }

    /// The effect started by `ticket` settled. Stale tickets are ignored.
    pub fn finish(&mut self, ticket: ConfirmTicket) -> bool {
        match &self.state {
            State::Confirming { ticket: current, .. } if *current == ticket => {
                self.state = State::Closed;
                self.force = false;
                true
            }
            _ => false,
        }
    }

    pub fn toggle_force(&mut self) -> bool {
        match &self.state {
            State::Open { prompt, .. } if prompt.show_force_option => {
                self.force = !self.force;
                true
            }
            _ => false,
        }
    }

    pub fn phase(&self) -> ConfirmPhase {
        match self.state {
            State::Closed => ConfirmPhase::Closed,
            State::Open { .. } => ConfirmPhase::Open,
            State::Confirming { .. } => ConfirmPhase::Confirming,
        }
    }

    pub fn prompt(&self) -> Option<&Prompt> {
        match &self.state {
            State::Closed => None,
            State::Open { prompt, .. } | State::Confirming { prompt, .. } => Some(prompt),
        }
    }

    pub fn force(&self) -> bool {
        self.force
    }

    pub fn is_busy(&self) -> bool {
        self.phase() == ConfirmPhase::Confirming
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(force: bool) -> Prompt {
        Prompt::new("Delete pod?", "Delete web-0 in default").force_option(force)
    }

    #[test]
    fn test_double_confirm_releases_payload_once() {
        let mut confirmation = Confirmation::new();
        confirmation.open(prompt(false), "effect");

        let first = confirmation.confirm();
        let second = confirmation.confirm();
        assert_eq!(first.map(|c| c.payload), Some("effect"));
        assert!(second.is_none());
        assert_eq!(confirmation.phase(), ConfirmPhase::Confirming);
    }

    #[test]
    fn test_finish_closes_only_for_matching_ticket() {
        let mut confirmation = Confirmation::new();
        let old = confirmation.open(prompt(false), 1);
        confirmation.confirm();

        // Replaced while the first effect is still running
        let new = confirmation.open(prompt(false), 2);
        assert!(!confirmation.finish(old));
        assert_eq!(confirmation.phase(), ConfirmPhase::Open);

        let confirmed = confirmation.confirm().expect("open request");
        assert_eq!(confirmed.ticket, new);
        assert!(confirmation.finish(new));
        assert_eq!(confirmation.phase(), ConfirmPhase::Closed);
    }

    #[test]
    fn test_cancel_only_while_open() {
        let mut confirmation = Confirmation::new();
        assert!(!confirmation.cancel());

        confirmation.open(prompt(false), ());
        confirmation.confirm();
        assert!(!confirmation.cancel());
        assert!(confirmation.is_busy());

        confirmation.open(prompt(false), ());
        assert!(confirmation.cancel());
        assert!(confirmation.confirm().is_none());
    }

    #[test]
    fn test_force_flag() {
        let mut confirmation = Confirmation::new();
        confirmation.open(prompt(false), ());
        assert!(!confirmation.toggle_force());

        confirmation.open(prompt(true), ());
        assert!(confirmation.toggle_force());
        assert!(confirmation.force());

        // Reopening resets it
        confirmation.open(prompt(true), ());
        assert!(!confirmation.force());
        confirmation.toggle_force();
        let confirmed = confirmation.confirm().expect("open request");
        assert!(confirmed.force);
    }
}
