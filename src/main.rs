use leadboard::cli::run;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // No-op outside Windows
    let _ = enable_ansi_support::enable_ansi_support();

    if let Err(e) = run() {
        // Database failures are internal errors; everything else is the user's input
        let internal = e
            .chain()
            .any(|cause| cause.downcast_ref::<rusqlite::Error>().is_some() || cause.downcast_ref::<std::io::Error>().is_some());
        if internal {
            eprintln!("Internal error: {}", e);
            // Show error chain if available
            let mut causes = e.chain().skip(1).peekable();
            if causes.peek().is_some() {
                eprintln!("\nCaused by:");
                for (indent, err) in causes.enumerate() {
                    eprintln!("{:indent$}  {}", "", err, indent = indent + 1);
                }
            }
            std::process::exit(2);
        } else {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
