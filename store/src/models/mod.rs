pub mod attendance;
pub mod course;
pub mod location;
pub mod student;

pub use attendance::AttendanceRecord;
pub use course::Course;
pub use location::SessionLocation;
pub use student::Student;
