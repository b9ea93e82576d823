//! Session state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐
//! │  Initializing   │ (initial)
//! └────────┬────────┘
//!          │ NoStoredToken / StoredTokenExpired ──────────────┐
//!          │ StoredTokenFresh                                 │
//!          ▼                                                  │
//! ┌─────────────────┐  ProfileRejected / SessionLost          │
//! │   Validating    │ ─────────────────────────┐              │
//! └────────┬────────┘                          ▼              ▼
//!          │ ProfileLoaded              ┌─────────────────────────┐
//!          ▼                            │     Unauthenticated     │
//! ┌─────────────────┐  LoggedOut /      └────────────┬────────────┘
//! │  Authenticated  │  SessionLost                   │
//! │                 │ ─────────────────────►         │ LoginSucceeded
//! └─────────────────┘ ◄──────────────────────────────┘
//! ```
//!
//! `LoggedOut` and `SessionLost` are accepted everywhere so teardown never
//! fails.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Initializing)

    Initializing => {
        NoStoredToken => Unauthenticated,
        StoredTokenExpired => Unauthenticated,
        StoredTokenFresh => Validating,
        LoginSucceeded => Authenticated,
        LoggedOut => Unauthenticated,
        SessionLost => Unauthenticated
    },
    Validating => {
        ProfileLoaded => Authenticated,
        ProfileRejected => Unauthenticated,
        LoggedOut => Unauthenticated,
        SessionLost => Unauthenticated
    },
    Unauthenticated => {
        LoginSucceeded => Authenticated,
        LoggedOut => Unauthenticated,
        SessionLost => Unauthenticated
    },
    Authenticated => {
        LoginSucceeded => Authenticated,
        LoggedOut => Unauthenticated,
        SessionLost => Unauthenticated
    }
}

pub use session_machine::Input as SessionInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Public view of the session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    /// Startup has not finished deciding yet.
    Initializing,
    Unauthenticated,
    Authenticated,
}

impl AuthStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthStatus::Authenticated)
    }
}

impl From<&SessionMachineState> for AuthStatus {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Initializing | SessionMachineState::Validating => {
                AuthStatus::Initializing
            }
            SessionMachineState::Unauthenticated => AuthStatus::Unauthenticated,
            SessionMachineState::Authenticated => AuthStatus::Authenticated,
        }
    }
}

impl std::fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AuthStatus::Initializing => "initializing",
            AuthStatus::Unauthenticated => "unauthenticated",
            AuthStatus::Authenticated => "authenticated",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine_in(inputs: &[SessionInput]) -> SessionMachine {
        let mut machine = SessionMachine::new();
        for input in inputs {
            machine.consume(input).unwrap();
        }
        machine
    }

    #[test]
    fn test_initial_state_is_initializing() {
        let machine = SessionMachine::new();
        assert_eq!(*machine.state(), SessionMachineState::Initializing);
        assert_eq!(AuthStatus::from(machine.state()), AuthStatus::Initializing);
    }

    #[test]
    fn test_startup_without_token() {
        let machine = machine_in(&[SessionInput::NoStoredToken]);
        assert_eq!(*machine.state(), SessionMachineState::Unauthenticated);
    }

    #[test]
    fn test_startup_with_expired_token() {
        let machine = machine_in(&[SessionInput::StoredTokenExpired]);
        assert_eq!(*machine.state(), SessionMachineState::Unauthenticated);
    }

    #[test]
    fn test_startup_with_fresh_token_validates_first() {
        let mut machine = machine_in(&[SessionInput::StoredTokenFresh]);
        assert_eq!(*machine.state(), SessionMachineState::Validating);
        assert_eq!(AuthStatus::from(machine.state()), AuthStatus::Initializing);

        machine.consume(&SessionInput::ProfileLoaded).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_rejected_profile_ends_unauthenticated() {
        let machine = machine_in(&[SessionInput::StoredTokenFresh, SessionInput::ProfileRejected]);
        assert_eq!(*machine.state(), SessionMachineState::Unauthenticated);
    }

    #[test]
    fn test_cannot_skip_validation() {
        let mut machine = SessionMachine::new();
        assert!(machine.consume(&SessionInput::ProfileLoaded).is_err());
        assert_eq!(*machine.state(), SessionMachineState::Initializing);
    }

    #[test]
    fn test_profile_loaded_only_while_validating() {
        let mut machine = machine_in(&[SessionInput::NoStoredToken]);
        assert!(machine.consume(&SessionInput::ProfileLoaded).is_err());
        assert!(machine.consume(&SessionInput::StoredTokenFresh).is_err());
    }

    #[test]
    fn test_login_logout_cycle() {
        let mut machine = machine_in(&[SessionInput::NoStoredToken, SessionInput::LoginSucceeded]);
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);

        machine.consume(&SessionInput::LoggedOut).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Unauthenticated);
    }

    #[test]
    fn test_teardown_accepted_from_every_state() {
        for prefix in [
            vec![],
            vec![SessionInput::StoredTokenFresh],
            vec![SessionInput::NoStoredToken],
            vec![SessionInput::NoStoredToken, SessionInput::LoginSucceeded],
        ] {
            for teardown in [SessionInput::LoggedOut, SessionInput::SessionLost] {
                let mut machine = machine_in(&prefix);
                machine.consume(&teardown).unwrap();
                assert_eq!(*machine.state(), SessionMachineState::Unauthenticated);
            }
        }
    }

    #[test]
    fn test_auth_status_conversion() {
        assert_eq!(
            AuthStatus::from(&SessionMachineState::Initializing),
            AuthStatus::Initializing
        );
        assert_eq!(
            AuthStatus::from(&SessionMachineState::Validating),
            AuthStatus::Initializing
        );
        assert_eq!(
            AuthStatus::from(&SessionMachineState::Unauthenticated),
            AuthStatus::Unauthenticated
        );
        assert_eq!(
            AuthStatus::from(&SessionMachineState::Authenticated),
            AuthStatus::Authenticated
        );
        assert!(AuthStatus::Authenticated.is_authenticated());
        assert!(!AuthStatus::Initializing.is_authenticated());
    }
}
