fn main() {
    if let Err(err) = levelgraph_layout::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
