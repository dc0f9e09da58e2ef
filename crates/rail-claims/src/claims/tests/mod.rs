mod common;

mod forms;
mod profile;
