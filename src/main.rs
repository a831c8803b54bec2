fn main() {
    if let Err(err) = lineage_layout::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
