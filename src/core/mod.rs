// core logic - data access, pagination, and the question/category services

pub mod categories;
mod db;
mod paginate;
pub mod questions;

pub use db::{Category, Db, NewQuestion, Question, integer_value};
pub use paginate::{QUESTIONS_PER_PAGE, page_number, paginate};
