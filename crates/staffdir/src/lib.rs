pub mod analysis;
pub mod csv;
pub mod parser;
pub mod scraper;
pub mod types;

pub use parser::{ExtractError, ParseError, parse_staff_directory};
pub use scraper::{ScraperError, StaffScraper};

/// Staff page of the Katz School of Science and Health.
pub const DEFAULT_DIRECTORY_URL: &str = "https://www.yu.edu/katz/staff";
