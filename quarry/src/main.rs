use quarry::commands::command_argument_builder;
use quarry::handlers::handle_crawl;
use quarry_core::print_banner;

#[tokio::main]
async fn main() {
    let mut cmd = command_argument_builder();
    let matches = cmd.get_matches_mut();

    if !matches.get_flag("quiet") {
        print_banner();
    }

    if matches.get_one::<String>("url").is_none() && matches.get_one::<String>("TARGET").is_none()
    {
        let _ = cmd.print_help();
        std::process::exit(1);
    }

    if let Err(e) = handle_crawl(&matches).await {
        eprintln!("✗ {}", e);
        std::process::exit(1);
    }
}
