fn main() {
    texpand_cli::run_main();
}
