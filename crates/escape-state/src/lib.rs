//! `escape-state` — per-species state-machine dispatch and the
//! stress-interpolated transition matrix.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                |
//! |---------------|----------------------------------------------------------|
//! | [`kind`]      | `StateKind` (`Transient`/`Persistent`/`MultiState`)       |
//! | [`transitions`] | `TransitionMatrix`, `TransitionModel`                   |
//! | [`prey`]      | `PreyStateDef`, `PreyStatePackage`, `step_prey`           |
//! | [`predator`]  | `PredatorStateDef`, `PredatorStatePackage`, `step_predator` |
//! | [`error`]     | `StateError`, `StateResult<T>`                            |
//! | [`config`]    | Action/state-package builders driven by `Prey.states[]`/`Pred.states[]` (§6) |
//!
//! # Design notes
//!
//! `step_prey`/`step_predator` are the only entry points the scheduler
//! calls; each owns the whole entry/resume/exit cycle for one agent's one
//! reaction step, including any chain of transient states and multi-state
//! sub-selection that "immediately" follows an exit per `spec.md` §4.4.

pub mod config;
pub mod error;
pub mod kind;
pub mod predator;
pub mod prey;
pub mod transitions;

pub use config::{predator_action_from_json, predator_package_from_json, prey_action_from_json, prey_package_from_json};
pub use error::{StateError, StateResult};
pub use kind::StateKind;
pub use predator::{step_predator, PredatorStateDef, PredatorStatePackage};
pub use prey::{step_prey, PreyStateDef, PreyStatePackage};
pub use transitions::{TransitionMatrix, TransitionModel};
