fn main() -> anyhow::Result<()> {
    tag_searcher::run()
}
