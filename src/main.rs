use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    rpchat::cli::main()
}
