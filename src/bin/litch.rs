use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    litch::app::run_cli(std::env::args().skip(1))
}
