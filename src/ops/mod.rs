pub mod count_grades;
pub mod filter;
pub mod latest;
