fn main() {
    textscope_cli::run();
}
