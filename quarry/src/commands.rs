use clap::{ArgAction, arg};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("quarry")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("quarry")
        .about("Crawl a site breadth-first and capture every same-site page and resource")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-u --"url" <URL>)
                .required(false)
                .help("The URL to start crawling from"),
        )
        .arg(
            arg!([TARGET])
                .required(false)
                .help("The URL to crawl, or the output directory when --url is given"),
        )
        .arg(
            arg!([OUTPUT_DIR])
                .required(false)
                .help("Directory to write captured content to (default: ./responses)"),
        )
        .arg(
            arg!(-H --"header" <HEADER>)
                .required(false)
                .help("Custom header sent with every request, as 'Name: Value' (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            arg!(--"depth" <DEPTH>)
                .required(false)
                .help("Maximum crawl depth")
                .value_parser(clap::value_parser!(usize))
                .default_value("5"),
        )
        .arg(
            arg!(--"retries" <RETRIES>)
                .required(false)
                .help("Attempts per page before it is skipped")
                .value_parser(clap::value_parser!(usize))
                .default_value("3"),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .help("Overall crawl deadline in seconds")
                .value_parser(clap::value_parser!(u64))
                .default_value("300"),
        )
        .arg(
            arg!(--"subdomains")
                .required(false)
                .help("Also follow links to subdomains of the target host")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"refetch-resources")
                .required(false)
                .help("Fetch a resource again every time a page references it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"no-manifest")
                .required(false)
                .help("Do not write manifest.json to the output directory")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"browser")
                .required(false)
                .help("Render pages in headless Chrome (requires the js-rendering feature)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"headful")
                .required(false)
                .help("Show the browser window while crawling")
                .action(ArgAction::SetTrue)
                .requires("browser"),
        )
}
