fn main() {
    if let Err(err) = vitasignal_demo_lib::run() {
        eprintln!("vitasignal-demo: {err:#}");
        std::process::exit(1);
    }
}
