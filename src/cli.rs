use clap::{Command, arg, crate_version};

pub fn cli() -> Command {
    Command::new("wifimon")
        .about("TUI showing WiFi status and nearby networks using NetworkManager")
        .version(crate_version!())
        .arg(arg!(--demo "Use a simulated WiFi device instead of NetworkManager"))
        .arg(
            arg!(--log <path>)
                .short('l')
                .required(false)
                .help("Write logs to this file (filter with RUST_LOG)"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let matches = cli().try_get_matches_from(["wifimon"]).unwrap();
        assert!(!matches.get_flag("demo"));
        assert!(matches.get_one::<String>("log").is_none());
    }

    #[test]
    fn demo_and_log() {
        let matches = cli()
            .try_get_matches_from(["wifimon", "--demo", "-l", "/tmp/wifimon.log"])
            .unwrap();
        assert!(matches.get_flag("demo"));
        assert_eq!(
            matches.get_one::<String>("log").map(String::as_str),
            Some("/tmp/wifimon.log")
        );
    }
}
