//! # meetup-session
//!
//! Authenticated-user session for the movie meetup client.
//!
//! [`SessionController`] decides at startup whether stored tokens still
//! describe a live session, and owns login, registration and logout. Session
//! status moves through a small state machine:
//!
//! - `Initializing`: startup has not finished (includes profile validation)
//! - `Unauthenticated`: no usable session
//! - `Authenticated`: tokens stored and the current user is known
//!
//! A rejected token refresh anywhere in the API client ends the session.

mod controller;
mod error;
mod session_fsm;
mod token;

pub use controller::{SessionController, SessionSnapshot};
pub use error::{SessionError, SessionResult};
pub use session_fsm::{AuthStatus, SessionInput, SessionMachine, SessionMachineState};
pub use token::{access_token_expiry, is_expired};
