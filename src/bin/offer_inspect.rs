fn main() {
    if let Err(err) = offertools::cli::inspect::run(std::env::args_os()) {
        eprintln!("offer_inspect: {err:#}");
        std::process::exit(1);
    }
}
