use tank_harness::config::{self, Config};
use tank_harness::logger;
use tank_harness::tournament::Tournament;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let prog = args.first().map(String::as_str).unwrap_or("tank-harness");

    let config = match Config::parse(&args[1..]) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err}\n");
            eprint!("{}", config::usage(prog));
            std::process::exit(1);
        }
    };

    logger::init(config.debug);

    let mut tournament = Tournament::new(config);
    std::process::exit(tournament.run());
}
