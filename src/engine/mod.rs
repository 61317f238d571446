pub mod dispatcher;

pub use dispatcher::{read_html_file, validate_url, ScrapeDispatcher};
