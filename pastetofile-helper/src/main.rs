use clap::Parser;
use pastetofile_core::{Acquisition, PngEncoder};
use pastetofile_helper::{
    cli::{EXIT_FAILURE, EXIT_USAGE, HelperArgs, exit_code, render_json, render_text},
    clipboard::SystemClipboard,
    history::SystemHistory,
    logging::init_logging,
};
use tracing::{error, info};

fn main() {
    init_logging();

    let args = HelperArgs::parse();
    std::process::exit(run(&args));
}

fn run(args: &HelperArgs) -> i32 {
    let target = match args.resolve_target() {
        Ok(target) => target,
        Err(msg) => {
            error!("{msg}");
            eprintln!("error: {msg}");
            return EXIT_USAGE;
        }
    };

    let clipboard = SystemClipboard::new();
    let history = SystemHistory::new();
    let acquisition = Acquisition::new(&clipboard, &history, &PngEncoder, target);
    info!(base = acquisition.base_name(), "helper started");

    let report = acquisition.run(args.action);

    if args.json {
        match render_json(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                error!("failed to serialize report: {err}");
                return EXIT_FAILURE;
            }
        }
    } else {
        let (out, err) = render_text(&report);
        print!("{out}");
        eprint!("{err}");
    }

    exit_code(&report)
}
