use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 24] = [
        "RUST_LOG",
        "OGW_HOST",
        "OGW_PORT",
        "OGW_DATABASE_URL",
        "OGW_PUBLIC_URL",
        "OGW_STORE_URL",
        "OGW_PAYMENT_WINDOW_MINUTES",
        "OGW_GATEWAY_API_URL",
        "OGW_CARRIER_API_URL",
        "OGW_CARRIER_USER_AGENT",
        "OGW_SENDER_NAME",
        "OGW_SENDER_POSTAL_CODE",
        "OGW_ITEM_WEIGHT_KG",
        "OGW_MIN_PACKAGE_WEIGHT_KG",
        "OGW_PACKAGE_HEIGHT_CM",
        "OGW_PACKAGE_WIDTH_CM",
        "OGW_PACKAGE_LENGTH_CM",
        "OGW_MAIL_API_URL",
        "OGW_MAIL_FROM",
        "OGW_MAIL_FALLBACK_FROM",
        "OGW_POSTAL_PRIMARY_URL",
        "OGW_POSTAL_FALLBACK_URL",
        "OGW_HTTP_TIMEOUT_SECS",
        "OGW_SWEEP_INTERVAL_SECS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
