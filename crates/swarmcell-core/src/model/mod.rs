mod agent;
mod cell;
mod decision;
mod dependency;
mod event;

pub use agent::{Agent, Importance, Message, Recipient, Reservation, ReservationConflict};
pub use cell::{Cell, CellStatus, CellType};
pub use decision::{DecisionTrace, EntityKind, EntityLink};
pub use dependency::{Comment, Dependency, DependencyKind, Label};
pub use event::{Event, EventType};
