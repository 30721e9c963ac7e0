fn main() {
    vswitch_cli::main();
}
