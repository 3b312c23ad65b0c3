//! Airline delay benchmark: prepare the dataset and compare boosting engines.

mod cli;

fn main() {
    if let Err(err) = cli::run(std::env::args().skip(1).collect()) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
