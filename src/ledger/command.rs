pub mod book_status_cmd;
pub mod checkout_books_cmd;
pub mod list_books_cmd;
pub mod reserve_book_cmd;
pub mod return_book_cmd;
pub mod summary_cmd;
