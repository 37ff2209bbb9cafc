//! Multi-step forms, encoded as type-state wizards.
//!
//! A form value carries its current step in its type, so an operation that only makes sense on
//! one step (submitting, going back) cannot be called on another. Transitions consume the form
//! and return it in the next state; a failed submission hands the form back untouched.

pub mod admission;
pub mod diagnosis;

mod sealed {
    pub trait Editable {}
}
