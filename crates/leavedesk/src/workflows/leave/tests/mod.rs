mod account;
mod common;
mod person;
