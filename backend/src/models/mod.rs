pub mod assignment;
pub mod view;

pub use assignment::{
    Assignment, AssignmentChanges, AssignmentRow, NewAssignment, Priority, PriorityOutOfRange,
};
pub use view::AssignmentView;
