pub mod crawl;
pub mod persist;
pub mod report;

use colored::Colorize;

pub fn print_banner() {
    println!(
        "{} {}",
        "quarry".bright_cyan().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
    println!("{}\n", "same-site crawler and capture tool".bright_black());
}
