pub mod common_scraper;
pub mod fetch;
pub mod huizemark_scraper;
pub mod jsonld;
pub mod models;
pub mod output;
pub mod ownership;
pub mod page;
pub mod parser;
pub mod tui;
pub mod utils;
pub mod validator;
