fn main() {
    wpp::cli::run();
}
