use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("atelier")
        .about("Design collaboration studio server")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("ATELIER_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("platform-url")
                .long("platform-url")
                .help("Base URL of the identity/data platform, example: https://xyz.platform.dev")
                .env("ATELIER_PLATFORM_URL")
                .required(true),
        )
        .arg(
            Arg::new("anon-key")
                .long("anon-key")
                .help("Public (anon) API key for the platform")
                .env("ATELIER_ANON_KEY")
                .required(true),
        )
        .arg(
            Arg::new("service-role-key")
                .long("service-role-key")
                .help("Server-only service-role key for the platform")
                .env("ATELIER_SERVICE_ROLE_KEY")
                .required(true),
        )
        .arg(
            Arg::new("site-url")
                .long("site-url")
                .help("Public site URL used in email redirect links")
                .default_value("http://localhost:8080")
                .env("ATELIER_SITE_URL"),
        )
        .arg(
            Arg::new("platform-deadline")
                .long("platform-deadline")
                .help("Deadline in seconds for each platform call")
                .default_value("10")
                .env("ATELIER_PLATFORM_DEADLINE")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("resend-cooldown")
                .long("resend-cooldown")
                .help("Cooldown in seconds between resend emails per address")
                .default_value("60")
                .env("ATELIER_RESEND_COOLDOWN")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("ATELIER_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}
