fn main() {
    if let Err(err) = offertools::cli::fixpct::run(std::env::args_os()) {
        eprintln!("offer_fixpct: {err:#}");
        std::process::exit(1);
    }
}
