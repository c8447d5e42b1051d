fn main() {
    if let Err(err) = offertools::cli::extract::run(std::env::args_os()) {
        eprintln!("offer_extract: {err:#}");
        std::process::exit(1);
    }
}
