pub mod event;
pub mod registration;
pub mod visitor;

pub use event::Event;
pub use registration::Registration;
pub use visitor::Visitor;
