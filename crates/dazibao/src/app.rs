use clap::{Arg, ArgAction, Command, value_parser};

pub fn build_cli() -> Command {
    Command::new("dazibao")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Serve a self-refreshing status page built from shell commands")
        .long_about("Dazibao runs the commands listed in ~/.dazibao/config.json on per-block intervals and serves the latest results as a web page (/) and as JSON (/data). Without flags it starts the server; -d and -t generate static pages instead.")
        .arg(
            Arg::new("dry-run")
                .short('d')
                .long("dry-run")
                .help("Run every block once, print (or write with -o) the page, and exit")
                .action(ArgAction::SetTrue)
                .conflicts_with("interval"),
        )
        .arg(
            Arg::new("interval")
                .short('t')
                .long("interval")
                .value_name("SECONDS")
                .help("Regenerate a static page every SECONDS until interrupted")
                .value_parser(value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("PATH")
                .help("Where to write the generated page (default: stdout for -d, ~/.dazibao/index.html for -t)")
                .value_parser(value_parser!(std::path::PathBuf)),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only log errors")
                .action(ArgAction::SetTrue),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_no_flags_means_serve() {
        let matches = build_cli().try_get_matches_from(["dazibao"]).unwrap();
        assert!(!matches.get_flag("dry-run"));
        assert!(matches.get_one::<u64>("interval").is_none());
        assert!(!matches.get_flag("quiet"));
    }

    #[test]
    fn test_dry_run_with_output() {
        let matches = build_cli()
            .try_get_matches_from(["dazibao", "-d", "-o", "/tmp/page.html"])
            .unwrap();
        assert!(matches.get_flag("dry-run"));
        assert_eq!(
            matches.get_one::<PathBuf>("output"),
            Some(&PathBuf::from("/tmp/page.html"))
        );
    }

    #[test]
    fn test_interval_must_be_positive() {
        assert!(build_cli().try_get_matches_from(["dazibao", "-t", "0"]).is_err());
        let matches = build_cli()
            .try_get_matches_from(["dazibao", "-t", "30"])
            .unwrap();
        assert_eq!(matches.get_one::<u64>("interval"), Some(&30));
    }

    #[test]
    fn test_dry_run_conflicts_with_interval() {
        assert!(
            build_cli()
                .try_get_matches_from(["dazibao", "-d", "-t", "5"])
                .is_err()
        );
    }
}
