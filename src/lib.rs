pub mod core {
    pub mod clock;
    pub mod command;
    pub mod controller;
    pub mod domain;
    pub mod library;
    pub mod repository;
}

pub mod utils {
    pub mod date;
    pub mod ddb;
    pub mod isbn;
    pub mod memory;
}

pub mod books;
pub mod catalog;
pub mod ledger;
pub mod members;
