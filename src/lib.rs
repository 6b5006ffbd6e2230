// trivia library - question bank over http

pub mod cli;
mod core;
mod error;
mod server;

pub use crate::core::{
    Category, Db, NewQuestion, QUESTIONS_PER_PAGE, Question, categories, page_number, paginate,
    questions,
};
pub use error::{ApiError, Error};
pub use server::{Server, router};
