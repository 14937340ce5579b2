fn main() -> anyhow::Result<()> {
    telon::cli::run_cli()
}
