mod client;
mod colors;
mod compile;
mod config;
mod error;
mod http;
mod instrument;
mod log;
mod process;
mod report;
mod runner;
mod scenarios;
mod validate;


use scenarios::Scenario;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--list") {
        for s in Scenario::ALL {
            println!("{:<18} {}", s.key(), s.name());
        }
        return;
    }

    let cfg = match config::load_config() {
        Some(c) => c,
        None => std::process::exit(2),
    };
    log::init(cfg.harness.logging);
    log::set_level(&cfg.harness.log_level);

    let selected = match runner::select(&args) {
        Ok(s) => s,
        Err(k) => {
            log::error(&format!("unknown scenario '{k}', see --list"));
            std::process::exit(2);
        }
    };

    // One control thread; concurrency comes only from open sockets and the target.
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            log::error(&format!("runtime: {e}"));
            std::process::exit(2);
        }
    };

    let code = rt.block_on(async {
        match runner::run(&cfg, &selected).await {
            Ok(results) => {
                log::separator();
                print!("{}", report::render(&results, cfg.harness.logging));
                if report::all_passed(&results) { 0 } else { 1 }
            }
            Err(f) => {
                log::error(&f.to_string());
                2
            }
        }
    });
    std::process::exit(code);
}
