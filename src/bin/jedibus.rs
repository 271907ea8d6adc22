use clap::{App, Arg, ArgMatches, SubCommand};
use colored::*;
use serde_json;
use std::process::Command;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "9103";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = App::new("jedibus")
        .version("0.1.0")
        .author("Imaging Systems Engineering Team")
        .about("⚡ JEDI Generator Bus Simulator - status frame encoding over a simulated CAN link")
        .arg(
            Arg::with_name("host")
                .short("h")
                .long("host")
                .value_name("HOST")
                .help("Simulator host address")
                .takes_value(true)
                .default_value(DEFAULT_HOST)
                .global(true),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("Simulator port")
                .takes_value(true)
                .default_value(DEFAULT_PORT)
                .global(true),
        )
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .takes_value(true)
                .possible_values(&["json", "table", "compact"])
                .default_value("table")
                .global(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enable verbose output")
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("report")
                .about("📤 Encode an error code and send its status frame")
                .long_about("Looks the error code up in the database, encodes the NOTIFY_JEDI_STATUS frame, and sends it on the simulated generator bus")
                .arg(
                    Arg::with_name("code")
                        .help("Generator error code to report")
                        .required(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("validate")
                .about("🔍 Check whether an error code exists in the database")
                .arg(
                    Arg::with_name("code")
                        .help("Generator error code to check")
                        .required(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("add")
                .about("➕ Add an error code record to the database")
                .long_about("Stores a new error code record so later reports can encode it. Field values outside their frame slots are rejected by the server.")
                .arg(
                    Arg::with_name("code")
                        .help("Generator error code (key of the record)")
                        .required(true)
                        .validator(|v| {
                            match v.parse::<u16>() {
                                Ok(_) => Ok(()),
                                Err(_) => Err("Code must be an unsigned 16-bit number".into()),
                            }
                        }),
                )
                .arg(
                    Arg::with_name("description")
                        .long("description")
                        .value_name("TEXT")
                        .help("Human readable description of the error")
                        .takes_value(true)
                        .required(true),
                )
                .arg(
                    Arg::with_name("generator-status")
                        .long("generator-status")
                        .value_name("N")
                        .help("Generator status byte")
                        .takes_value(true)
                        .default_value("6"),
                )
                .arg(
                    Arg::with_name("simplified-code")
                        .long("simplified-code")
                        .value_name("N")
                        .help("Simplified error code byte")
                        .takes_value(true)
                        .default_value("90"),
                )
                .arg(
                    Arg::with_name("display-bitmap")
                        .long("display-bitmap")
                        .value_name("N")
                        .help("Display bitmap byte")
                        .takes_value(true)
                        .default_value("0"),
                )
                .arg(
                    Arg::with_name("phase")
                        .long("phase")
                        .value_name("N")
                        .help("Phase of error nibble (0-15)")
                        .takes_value(true)
                        .default_value("2")
                        .validator(|v| {
                            match v.parse::<u8>() {
                                Ok(n) if n <= 15 => Ok(()),
                                _ => Err("Phase must be between 0 and 15".into()),
                            }
                        }),
                )
                .arg(
                    Arg::with_name("class")
                        .long("class")
                        .value_name("N")
                        .help("Error class nibble (0-15)")
                        .takes_value(true)
                        .default_value("2")
                        .validator(|v| {
                            match v.parse::<u8>() {
                                Ok(n) if n <= 15 => Ok(()),
                                _ => Err("Class must be between 0 and 15".into()),
                            }
                        }),
                )
                .arg(
                    Arg::with_name("aux")
                        .long("aux")
                        .value_name("N")
                        .help("Auxiliary data word")
                        .takes_value(true)
                        .default_value("5")
                        .validator(|v| {
                            match v.parse::<u16>() {
                                Ok(_) => Ok(()),
                                Err(_) => Err("Aux data must be an unsigned 16-bit number".into()),
                            }
                        }),
                ),
        )
        .subcommand(
            SubCommand::with_name("list")
                .about("📋 List all error codes in the database"),
        )
        .subcommand(
            SubCommand::with_name("server")
                .about("🚀 Start the generator bus simulator server")
                .long_about("Launches the JEDI generator bus simulator server for testing and development")
                .arg(
                    Arg::with_name("background")
                        .short("b")
                        .long("background")
                        .help("Run server in background"),
                ),
        )
        .get_matches();

    let host = matches.value_of("host").unwrap();
    let port = matches.value_of("port").unwrap().parse::<u16>()?;
    let format = matches.value_of("format").unwrap();
    let verbose = matches.is_present("verbose");

    if verbose {
        println!("{}", "⚡ JediBus - Generator Bus Simulator".bright_blue().bold());
        println!("{} {}:{}", "Connecting to".dimmed(), host, port);
    }

    match matches.subcommand() {
        ("report", Some(sub_matches)) => {
            handle_report(sub_matches, host, port, format, verbose).await?;
        }
        ("validate", Some(sub_matches)) => {
            handle_validate(sub_matches, host, port, format).await?;
        }
        ("add", Some(sub_matches)) => {
            handle_add(sub_matches, host, port, format).await?;
        }
        ("list", _) => {
            handle_list(host, port, format).await?;
        }
        ("server", Some(sub_matches)) => {
            handle_server(sub_matches, port).await?;
        }
        _ => {
            println!("{}", "No command specified. Use --help for usage information.".yellow());
            println!("{}", "Quick start:".bright_green());
            println!("  {} Start the simulator server", "jedibus server".bright_cyan());
            println!("  {} Send a status frame", "jedibus report 804".bright_cyan());
            println!("  {} Inspect the database", "jedibus list".bright_cyan());
        }
    }

    Ok(())
}

async fn handle_report(
    matches: &ArgMatches<'_>,
    host: &str,
    port: u16,
    format: &str,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let code = matches.value_of("code").unwrap();

    if verbose {
        println!("{} {}", "Reporting error code".dimmed(), code);
    }

    let request = serde_json::json!({ "op": "report", "errorcode": code }).to_string();
    let response = send_request(host, port, request).await?;

    match format {
        "json" => println!("{}", response),
        "compact" => {
            if reply_succeeded(&response) {
                println!("{}", "SENT".bright_green());
            } else {
                println!("{}", "FAILED".bright_red());
            }
        }
        _ => {
            if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&response) {
                if parsed["status"].as_bool().unwrap_or(false) {
                    println!(
                        "{} {} {}",
                        "✅".green(),
                        "Status frame sent for code".bright_white(),
                        code.bright_cyan()
                    );
                    if let Some(bytes) = parsed["canMsg"].as_array() {
                        let rendered: Vec<String> = bytes
                            .iter()
                            .map(|b| format!("{:02X}", b.as_u64().unwrap_or(0)))
                            .collect();
                        println!(
                            "{} {}",
                            "Frame bytes:".bright_white(),
                            rendered.join(" ").bright_cyan()
                        );
                    }
                } else {
                    print_failure("Report", &parsed);
                }
            }
        }
    }

    Ok(())
}

async fn handle_validate(
    matches: &ArgMatches<'_>,
    host: &str,
    port: u16,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let code = matches.value_of("code").unwrap();

    let request = serde_json::json!({ "op": "validate", "errorcode": code }).to_string();
    let response = send_request(host, port, request).await?;

    match format {
        "json" => println!("{}", response),
        "compact" => {
            if reply_succeeded(&response) {
                println!("{}", "VALID".bright_green());
            } else {
                println!("{}", "INVALID".bright_red());
            }
        }
        _ => {
            if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&response) {
                if parsed["status"].as_bool().unwrap_or(false) {
                    let message = parsed["message"].as_str().unwrap_or("Error code is valid");
                    println!("{} {}", "✅".green(), message.bright_green());
                } else {
                    print_failure("Validation", &parsed);
                }
            }
        }
    }

    Ok(())
}

async fn handle_add(
    matches: &ArgMatches<'_>,
    host: &str,
    port: u16,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let code: u16 = matches.value_of("code").unwrap().parse()?;
    let description = matches.value_of("description").unwrap();
    let generator_status: u8 = matches.value_of("generator-status").unwrap().parse()?;
    let simplified_code: u8 = matches.value_of("simplified-code").unwrap().parse()?;
    let display_bitmap: u8 = matches.value_of("display-bitmap").unwrap().parse()?;
    let phase: u8 = matches.value_of("phase").unwrap().parse()?;
    let class: u8 = matches.value_of("class").unwrap().parse()?;
    let aux: u16 = matches.value_of("aux").unwrap().parse()?;

    let request = serde_json::json!({
        "op": "add_error_code",
        "record": {
            "generatorStatus": generator_status,
            "simplifiedCode": simplified_code,
            "displayBitmap": display_bitmap,
            "phaseNibble": phase,
            "classNibble": class,
            "generatorErrorCode": code,
            "auxData": aux,
            "description": description,
        }
    })
    .to_string();
    let response = send_request(host, port, request).await?;

    print_done_result("Add", &format!("code {}", code), &response, format);

    Ok(())
}

async fn handle_list(
    host: &str,
    port: u16,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = serde_json::json!({ "op": "list_error_codes" }).to_string();
    let response = send_request(host, port, request).await?;

    match format {
        "json" => println!("{}", response),
        _ => {
            if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&response) {
                if let Some(codes) = parsed["codes"].as_array() {
                    println!("\n{}", "📋 Error Code Database".bright_blue().bold());
                    println!("{}", "══════════════════════".bright_blue());
                    for record in codes {
                        let code = record["generatorErrorCode"].as_u64().unwrap_or(0);
                        let simplified = record["simplifiedCode"].as_u64().unwrap_or(0);
                        let phase = record["phaseNibble"].as_u64().unwrap_or(0);
                        let class = record["classNibble"].as_u64().unwrap_or(0);
                        let description = record["description"].as_str().unwrap_or("");
                        println!(
                            "{}  simplified {:>3}  phase {:X}  class {:X}  {}",
                            format!("{:>6}", code).bright_cyan(),
                            simplified,
                            phase,
                            class,
                            description.dimmed()
                        );
                    }
                    println!(
                        "\n{} {}",
                        "Total:".bright_white(),
                        codes.len().to_string().bright_cyan()
                    );
                } else {
                    print_failure("List", &parsed);
                }
            }
        }
    }

    Ok(())
}

async fn handle_server(
    matches: &ArgMatches<'_>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let background = matches.is_present("background");

    println!("{}", "🚀 Starting JEDI generator bus simulator server...".bright_green().bold());

    let mut cmd = Command::new("cargo");
    cmd.args(&["run", "--bin", "jedibus-simulator"]);

    if background {
        cmd.spawn()?;
        println!("{} Server started in background on port {}", "✅".green(), port);
    } else {
        println!("{} Server starting on port {} (Press Ctrl+C to stop)", "🌐".bright_blue(), port);
        cmd.status()?;
    }

    Ok(())
}

// Helper functions

fn reply_succeeded(response: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(response)
        .map(|parsed| parsed["status"].as_bool().unwrap_or(false))
        .unwrap_or(false)
}

fn print_failure(action: &str, parsed: &serde_json::Value) {
    let message = parsed["message"].as_str().unwrap_or("Unknown error");
    println!("{} {} failed: {}", "❌".red(), action.bright_white(), message.bright_red());
}

fn print_done_result(action: &str, value: &str, response: &str, format: &str) {
    match format {
        "json" => println!("{}", response),
        "compact" => {
            if reply_succeeded(response) {
                println!("{}", "OK".bright_green());
            } else {
                println!("{}", "FAILED".bright_red());
            }
        }
        _ => {
            if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(response) {
                if parsed["status"].as_bool().unwrap_or(false) {
                    println!("{} {} {}", "✅".green(), action.bright_white(), value.bright_cyan());
                } else {
                    let message = parsed["message"].as_str().unwrap_or("Unknown error");
                    println!("{} {} failed: {}", "❌".red(), action.bright_white(), message.bright_red());

                    if message.contains("already exists") {
                        println!("{} Inspect existing records with: {}", "💡".yellow(), "jedibus list".bright_cyan());
                    }
                }
            } else {
                println!("{} {}", "✅".green(), "Command completed".bright_green());
            }
        }
    }
}

async fn send_request(host: &str, port: u16, request: String) -> Result<String, Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", host, port);
    let mut stream = match TcpStream::connect(&addr).await {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("{} Failed to connect to bus simulator at {}", "❌".red(), addr.bright_white());

            if e.kind() == std::io::ErrorKind::ConnectionRefused {
                eprintln!("{} Server is not running. Start it with:", "💡".yellow());
                eprintln!("   {}", "jedibus server".bright_cyan());
                eprintln!("   or");
                eprintln!("   {}", "cargo run --bin jedibus-simulator".bright_cyan());
            } else {
                eprintln!("{} Network error: {}", "🔌".yellow(), e.to_string().bright_red());
                eprintln!("{} Check network connectivity and firewall settings", "💡".yellow());
            }

            return Err(e.into());
        }
    };

    match tokio::time::timeout(std::time::Duration::from_secs(5), async {
        stream.write_all(request.as_bytes()).await?;
        stream.write_all(b"\n").await?;

        let mut buffer = vec![0; 4096];
        let n = stream.read(&mut buffer).await?;

        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "Server closed connection",
            ));
        }

        let response = String::from_utf8_lossy(&buffer[..n]);
        Ok(response.trim_end().to_string())
    })
    .await
    {
        Ok(result) => Ok(result?),
        Err(_) => {
            eprintln!("{} Request timed out after 5 seconds", "⏰".yellow());
            eprintln!("{} Server may be overloaded or unresponsive", "💡".yellow());
            Err("Request timeout".into())
        }
    }
}
