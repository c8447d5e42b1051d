fn main() {
    if let Err(err) = offertools::cli::diagnose::run(std::env::args_os()) {
        eprintln!("offer_diagnose: {err:#}");
        std::process::exit(1);
    }
}
